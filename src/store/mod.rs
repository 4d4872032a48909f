//! Transactional store for sessions and their append-only move log.
//!
//! All mutation of an existing session happens through [`SessionLock`]: a
//! transaction holding an exclusive lock on the session row from load until
//! commit. Reads outside a lock observe committed snapshots only.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{game_move, session, user, SessionStatus};
use crate::error::AppError;
use crate::rules::GameType;

/// Maximum page size for session listings
pub const MAX_PAGE_SIZE: u64 = 100;
/// Page size used when the caller does not supply one
pub const DEFAULT_PAGE_SIZE: u64 = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Session lock
// ─────────────────────────────────────────────────────────────────────────────

/// An open transaction holding an exclusive lock on one session row.
///
/// Acquired with `SELECT ... FOR UPDATE`; concurrent writers to the same
/// session block here until the holder commits or rolls back. Dropping the
/// guard without committing rolls the transaction back, so an aborted
/// request persists nothing.
pub struct SessionLock {
    txn: DatabaseTransaction,
    session: session::Model,
}

impl SessionLock {
    /// Begin a transaction and load the session under an exclusive row lock.
    ///
    /// Returns `Ok(None)` (transaction closed) when the session does not
    /// exist. Lock acquisition is a blocking wait; callers impose timeouts
    /// upstream if they need them.
    pub async fn acquire(
        db: &DatabaseConnection,
        session_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let txn = db.begin().await?;

        let mut query = session::Entity::find_by_id(session_id);
        // SQLite has no row locks; its single-writer transaction already
        // serializes the critical section.
        if txn.get_database_backend() != DbBackend::Sqlite {
            query = query.lock_exclusive();
        }

        match query.one(&txn).await? {
            Some(model) => Ok(Some(Self {
                txn,
                session: model,
            })),
            None => {
                txn.rollback().await?;
                Ok(None)
            }
        }
    }

    /// The session as of lock acquisition, or after the latest [`update`].
    ///
    /// [`update`]: SessionLock::update
    pub fn session(&self) -> &session::Model {
        &self.session
    }

    /// Apply an update to the locked session row.
    pub async fn update(&mut self, mut active: session::ActiveModel) -> Result<(), AppError> {
        active.updated_at = Set(Utc::now().fixed_offset());
        self.session = active.update(&self.txn).await?;
        Ok(())
    }

    /// Append a move, assigning the next `move_no` for this session.
    pub async fn append_move(
        &self,
        player_id: Uuid,
        row: i32,
        col: i32,
    ) -> Result<game_move::Model, AppError> {
        let last = game_move::Entity::find()
            .filter(game_move::Column::SessionId.eq(self.session.id))
            .order_by_desc(game_move::Column::MoveNo)
            .one(&self.txn)
            .await?;
        let move_no = last.map_or(1, |m| m.move_no + 1);

        let inserted = game_move::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(self.session.id),
            player_id: Set(player_id),
            row: Set(row),
            col: Set(col),
            move_no: Set(move_no),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.txn)
        .await?;

        Ok(inserted)
    }

    /// All moves of the locked session, ordered by `move_no`.
    pub async fn moves(&self) -> Result<Vec<game_move::Model>, AppError> {
        list_moves(&self.txn, self.session.id).await
    }

    /// Load a user inside the open transaction.
    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<user::Model>, AppError> {
        Ok(user::Entity::find_by_id(user_id).one(&self.txn).await?)
    }

    /// Commit, releasing the row lock; returns the committed session state.
    pub async fn commit(self) -> Result<session::Model, AppError> {
        self.txn.commit().await?;
        Ok(self.session)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Creation
// ─────────────────────────────────────────────────────────────────────────────

/// Fields for a new session row; the store assigns id and timestamps.
pub struct NewSession {
    pub host_id: Uuid,
    pub host_name: String,
    pub host_icon: Option<String>,
    pub game_type: GameType,
    pub game_icon: Option<String>,
    pub board: sea_orm::JsonValue,
}

/// Insert a user, assigning id and timestamps.
pub async fn create_user(
    db: &DatabaseConnection,
    name: String,
    icon: Option<String>,
) -> Result<user::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let inserted = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        icon: Set(icon),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(inserted)
}

/// Insert a session in WAITING state with an empty guest seat.
pub async fn create_session(
    db: &DatabaseConnection,
    new: NewSession,
) -> Result<session::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let inserted = session::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now),
        updated_at: Set(now),
        host_id: Set(new.host_id),
        host_name: Set(new.host_name),
        host_icon: Set(new.host_icon),
        guest_id: Set(None),
        guest_name: Set(None),
        guest_icon: Set(None),
        game_type: Set(new.game_type.as_str().to_string()),
        game_icon: Set(new.game_icon),
        status: Set(SessionStatus::Waiting.as_str().to_string()),
        current_turn: Set(None),
        board: Set(new.board),
        winner: Set(None),
        draw: Set(false),
    }
    .insert(db)
    .await?;

    Ok(inserted)
}

// ─────────────────────────────────────────────────────────────────────────────
// Unlocked reads
// ─────────────────────────────────────────────────────────────────────────────

/// Load a user by id.
pub async fn find_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find_by_id(user_id).one(db).await?)
}

/// Load a session at its latest committed state.
pub async fn find_session(
    db: &DatabaseConnection,
    session_id: Uuid,
) -> Result<Option<session::Model>, AppError> {
    Ok(session::Entity::find_by_id(session_id).one(db).await?)
}

/// Moves of a session ordered by `move_no`, through any connection or
/// open transaction.
pub async fn list_moves<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
) -> Result<Vec<game_move::Model>, AppError> {
    Ok(game_move::Entity::find()
        .filter(game_move::Column::SessionId.eq(session_id))
        .order_by_asc(game_move::Column::MoveNo)
        .all(conn)
        .await?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing with keyset pagination
// ─────────────────────────────────────────────────────────────────────────────

/// Filters for the session listing.
#[derive(Debug, Default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    pub host_id: Option<Uuid>,
    pub limit: u64,
    pub cursor: Option<PageCursor>,
}

/// Keyset cursor over `(created_at DESC, id DESC)`.
///
/// The token format is opaque to clients; id as tiebreak keeps pagination
/// deterministic when timestamps collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub id: Uuid,
}

impl PageCursor {
    pub fn encode(&self) -> String {
        format!("{}.{}", self.created_at.timestamp_micros(), self.id.simple())
    }

    pub fn decode(token: &str) -> Option<Self> {
        let (micros, id) = token.split_once('.')?;
        let micros: i64 = micros.parse().ok()?;
        let created_at = chrono::DateTime::from_timestamp_micros(micros)?.fixed_offset();
        let id = Uuid::parse_str(id).ok()?;
        Some(Self { created_at, id })
    }
}

/// One page of a listing plus the token for the next one.
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// List sessions newest-first, filtered and keyset-paginated.
pub async fn list_sessions(
    db: &DatabaseConnection,
    filter: &SessionFilter,
) -> Result<Page<session::Model>, AppError> {
    let limit = filter.limit.clamp(1, MAX_PAGE_SIZE);

    let mut query = session::Entity::find()
        .order_by_desc(session::Column::CreatedAt)
        .order_by_desc(session::Column::Id)
        .limit(limit + 1);

    if let Some(status) = filter.status {
        query = query.filter(session::Column::Status.eq(status.as_str()));
    }
    if let Some(host_id) = filter.host_id {
        query = query.filter(session::Column::HostId.eq(host_id));
    }
    if let Some(cursor) = &filter.cursor {
        query = query.filter(
            Condition::any()
                .add(session::Column::CreatedAt.lt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(session::Column::CreatedAt.eq(cursor.created_at))
                        .add(session::Column::Id.lt(cursor.id)),
                ),
        );
    }

    // Fetch one extra row to detect whether a next page exists
    let mut items = query.all(db).await?;
    let next_cursor = if items.len() as u64 > limit {
        items.truncate(limit as usize);
        items.last().map(|s| {
            PageCursor {
                created_at: s.created_at,
                id: s.id,
            }
            .encode()
        })
    } else {
        None
    };

    Ok(Page { items, next_cursor })
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregation inputs
// ─────────────────────────────────────────────────────────────────────────────

/// All FINISHED sessions, for leaderboard aggregation.
pub async fn finished_sessions(db: &DatabaseConnection) -> Result<Vec<session::Model>, AppError> {
    Ok(session::Entity::find()
        .filter(session::Column::Status.eq(SessionStatus::Finished.as_str()))
        .all(db)
        .await?)
}

/// Number of moves per session, in one grouped query.
pub async fn move_counts(db: &DatabaseConnection) -> Result<Vec<(Uuid, i64)>, AppError> {
    Ok(game_move::Entity::find()
        .select_only()
        .column(game_move::Column::SessionId)
        .column_as(game_move::Column::Id.count(), "move_count")
        .group_by(game_move::Column::SessionId)
        .into_tuple::<(Uuid, i64)>()
        .all(db)
        .await?)
}

/// Users by id, for resolving leaderboard display names.
pub async fn users_by_ids(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
) -> Result<Vec<user::Model>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?)
}
