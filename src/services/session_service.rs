//! The session engine: a state machine over WAITING -> ACTIVE -> FINISHED.
//!
//! Every mutation of an existing session runs under the store's row lock:
//! load, validate, mutate, detect terminal conditions, commit. Two racing
//! requests on the same session serialize at lock acquisition; the loser
//! revalidates against the winner's committed state.

use sea_orm::ActiveValue::Set;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::dto::SessionResponse;
use crate::entities::{session, SessionStatus};
use crate::error::AppError;
use crate::rules::{Board, GameType, MoveRejection};
use crate::store::{self, NewSession, SessionLock};

/// Inputs for session creation.
pub struct CreateSessionParams {
    pub host_id: Uuid,
    /// Overrides the host's stored profile name for this session
    pub host_name: Option<String>,
    /// Overrides the host's stored profile icon for this session
    pub host_icon: Option<String>,
    pub game_icon: Option<String>,
    pub game_type: GameType,
}

pub struct SessionService;

impl SessionService {
    /// Create a session in WAITING state with the given user as host.
    pub async fn create_session(
        db: &DatabaseConnection,
        params: CreateSessionParams,
    ) -> Result<SessionResponse, AppError> {
        let host = store::find_user(db, params.host_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", params.host_id)))?;

        let board = serialize_board(&params.game_type.rules().initial_board())?;

        let host_name = params.host_name.unwrap_or(host.name);
        let host_icon = params.host_icon.or(host.icon);

        let sess = store::create_session(
            db,
            NewSession {
                host_id: host.id,
                host_name,
                host_icon,
                game_type: params.game_type,
                game_icon: params.game_icon,
                board,
            },
        )
        .await?;

        tracing::info!(
            session_id = %sess.id,
            host_id = %sess.host_id,
            game_type = %params.game_type,
            "session created"
        );

        SessionResponse::from_models(&sess, &[])
    }

    /// Seat `player_id` as guest and activate the session.
    ///
    /// Re-joining a session the player already belongs to is an idempotent
    /// success, tolerating client retries and double-submits.
    pub async fn join_session(
        db: &DatabaseConnection,
        session_id: Uuid,
        player_id: Uuid,
    ) -> Result<SessionResponse, AppError> {
        let Some(mut lock) = SessionLock::acquire(db, session_id).await? else {
            return Err(AppError::NotFound(format!("Session {session_id} not found")));
        };

        let sess = lock.session().clone();
        let status = parse_status(&sess)?;

        if !status.can_join() {
            if sess.is_member(player_id) {
                let moves = lock.moves().await?;
                let sess = lock.commit().await?;
                return SessionResponse::from_models(&sess, &moves);
            }
            return Err(if status.is_terminal() {
                AppError::AlreadyFinished
            } else {
                AppError::AlreadyFull
            });
        }

        if player_id == sess.host_id {
            return Err(AppError::CannotJoinOwnSession);
        }

        let guest = lock
            .find_user(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {player_id} not found")))?;

        let mut active: session::ActiveModel = sess.clone().into();
        active.guest_id = Set(Some(guest.id));
        active.guest_name = Set(Some(guest.name));
        active.guest_icon = Set(guest.icon);
        active.status = Set(SessionStatus::Active.as_str().to_string());
        // Host moves first
        active.current_turn = Set(Some(sess.host_id));
        lock.update(active).await?;

        let moves = lock.moves().await?;
        let sess = lock.commit().await?;

        tracing::info!(
            session_id = %sess.id,
            guest_id = %player_id,
            "guest joined, session active"
        );

        SessionResponse::from_models(&sess, &moves)
    }

    /// Validate and apply one move, detecting win/draw on the placed cell.
    pub async fn submit_move(
        db: &DatabaseConnection,
        session_id: Uuid,
        player_id: Uuid,
        row: i32,
        col: i32,
    ) -> Result<SessionResponse, AppError> {
        let Some(mut lock) = SessionLock::acquire(db, session_id).await? else {
            return Err(AppError::NotFound(format!("Session {session_id} not found")));
        };

        let sess = lock.session().clone();
        match parse_status(&sess)? {
            SessionStatus::Waiting => return Err(AppError::NotActive),
            SessionStatus::Finished => return Err(AppError::AlreadyFinished),
            SessionStatus::Active => {}
        }

        // An active session always has both seats filled
        if sess.guest_id.is_none() {
            return Err(AppError::Internal(format!(
                "active session {} has no guest",
                sess.id
            )));
        }

        if !sess.is_member(player_id) {
            return Err(AppError::NotInSession { player_id });
        }
        if sess.current_turn != Some(player_id) {
            return Err(AppError::NotYourTurn { player_id });
        }

        let game_type = GameType::from_str(&sess.game_type).ok_or_else(|| {
            AppError::Internal(format!(
                "session {} has unknown game type '{}'",
                sess.id, sess.game_type
            ))
        })?;
        let rules = game_type.rules();

        let mut board = parse_board(&sess)?;
        rules
            .validate_move(&board, row, col)
            .map_err(|rejection| match rejection {
                MoveRejection::OutOfBounds => AppError::InvalidCoordinates { row, col },
                MoveRejection::CellOccupied | MoveRejection::IllegalGeometry => {
                    AppError::CellOccupied { row, col }
                }
            })?;

        board[row as usize][col as usize] = Some(player_id);
        let appended = lock.append_move(player_id, row, col).await?;

        let mut active: session::ActiveModel = sess.clone().into();
        active.board = Set(serialize_board(&board)?);

        if rules.check_winner(&board, row, col, player_id) {
            active.status = Set(SessionStatus::Finished.as_str().to_string());
            active.winner = Set(Some(player_id));
            active.current_turn = Set(None);
            tracing::info!(
                session_id = %sess.id,
                winner = %player_id,
                move_no = appended.move_no,
                "session finished with a winner"
            );
        } else if rules.check_draw(&board, appended.move_no as usize) {
            active.status = Set(SessionStatus::Finished.as_str().to_string());
            active.draw = Set(true);
            active.current_turn = Set(None);
            tracing::info!(
                session_id = %sess.id,
                move_no = appended.move_no,
                "session finished in a draw"
            );
        } else {
            let next = sess.opponent_of(player_id).ok_or_else(|| {
                AppError::Internal(format!("active session {} has no opponent", sess.id))
            })?;
            active.current_turn = Set(Some(next));
        }

        lock.update(active).await?;
        let moves = lock.moves().await?;
        let sess = lock.commit().await?;

        SessionResponse::from_models(&sess, &moves)
    }
}

fn parse_status(sess: &session::Model) -> Result<SessionStatus, AppError> {
    SessionStatus::from_str(&sess.status).ok_or_else(|| {
        AppError::Internal(format!(
            "session {} has unknown status '{}'",
            sess.id, sess.status
        ))
    })
}

fn parse_board(sess: &session::Model) -> Result<Board, AppError> {
    serde_json::from_value(sess.board.clone()).map_err(|e| {
        AppError::Internal(format!(
            "stored board for session {} is invalid: {e}",
            sess.id
        ))
    })
}

fn serialize_board(board: &Board) -> Result<sea_orm::JsonValue, AppError> {
    serde_json::to_value(board)
        .map_err(|e| AppError::Internal(format!("failed to serialize board: {e}")))
}
