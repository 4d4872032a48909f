use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::{SessionListResponse, SessionResponse};
use crate::entities::SessionStatus;
use crate::error::AppError;
use crate::rules::GameType;
use crate::services::{CreateSessionParams, QueryService, SessionService};
use crate::state::AppState;
use crate::store::{self, PageCursor, SessionFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the session route group: `/sessions/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/join", post(join_session))
        .route("/{session_id}/move", post(submit_move))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    host_id: Uuid,
    host_name: Option<String>,
    host_icon: Option<String>,
    game_icon: Option<String>,
    game_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinSessionRequest {
    player_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    player_id: Uuid,
    row: i32,
    col: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSessionsQuery {
    status: Option<String>,
    host_id: Option<Uuid>,
    limit: Option<u64>,
    cursor: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /sessions` — Create a session with the given host, in WAITING state.
async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let game_type = match body.game_type.as_deref() {
        None => GameType::default(),
        Some(s) => GameType::from_str(s).ok_or_else(|| AppError::UnknownGameType(s.to_string()))?,
    };

    let host_name = body
        .host_name
        .map(|name| {
            let name = name.trim().to_string();
            if name.is_empty() || name.len() > 100 {
                return Err(AppError::Validation(
                    "Host name must be between 1 and 100 characters.".to_string(),
                ));
            }
            Ok(name)
        })
        .transpose()?;

    let response = SessionService::create_session(
        &state.db,
        CreateSessionParams {
            host_id: body.host_id,
            host_name,
            host_icon: body.host_icon,
            game_icon: body.game_icon,
            game_type,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /sessions/{sessionId}` — Full session projection.
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(QueryService::get_session(&state.db, session_id).await?))
}

/// `GET /sessions?status=&hostId=&limit=&cursor=` — Paginated listing.
async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let status = query
        .status
        .map(|s| {
            SessionStatus::from_str(&s)
                .ok_or_else(|| AppError::Validation(format!("Unknown status filter: '{s}'")))
        })
        .transpose()?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}."
        )));
    }

    let cursor = query
        .cursor
        .map(|token| {
            PageCursor::decode(&token)
                .ok_or_else(|| AppError::Validation("Invalid pagination cursor.".to_string()))
        })
        .transpose()?;

    let filter = SessionFilter {
        status,
        host_id: query.host_id,
        limit,
        cursor,
    };

    Ok(Json(QueryService::list_sessions(&state.db, filter).await?))
}

/// `POST /sessions/{sessionId}/join` — Seat the second player.
async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<JoinSessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(
        SessionService::join_session(&state.db, session_id, body.player_id).await?,
    ))
}

/// `POST /sessions/{sessionId}/move` — Submit one move for the player on turn.
async fn submit_move(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    // Range-check the coordinates against this game's board before the
    // engine takes the session row lock; garbage input never enters the
    // serialized critical section. The engine revalidates under the lock.
    let sess = store::find_session(&state.db, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    if let Some(game_type) = GameType::from_str(&sess.game_type) {
        let (rows, cols) = game_type.rules().dimensions();
        if body.row < 0
            || body.col < 0
            || body.row as usize >= rows
            || body.col as usize >= cols
        {
            return Err(AppError::InvalidCoordinates {
                row: body.row,
                col: body.col,
            });
        }
    }

    Ok(Json(
        SessionService::submit_move(&state.db, session_id, body.player_id, body.row, body.col)
            .await?,
    ))
}
