use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// API error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error types
#[derive(Debug)]
pub enum AppError {
    // === General errors ===
    /// Database operation failed
    Database(String),
    /// Configuration error
    Config(String),
    /// Malformed or out-of-range input
    Validation(String),
    /// Resource not found
    NotFound(String),
    /// Unexpected failure, including invariant violations detected post-load
    Internal(String),

    // === Game-specific errors ===
    /// Unknown game type requested at session creation
    UnknownGameType(String),
    /// Coordinates outside the board for this game type
    InvalidCoordinates { row: i32, col: i32 },
    /// The acting player is not part of the session roster
    NotInSession { player_id: Uuid },
    /// The acting player is not the player on turn
    NotYourTurn { player_id: Uuid },
    /// Target cell already holds a piece (or the column is full / the drop
    /// row does not match, for gravity games)
    CellOccupied { row: i32, col: i32 },
    /// Move submitted while the session is still waiting for a second player
    NotActive,
    /// Session already reached its terminal state
    AlreadyFinished,
    /// Session already has two players
    AlreadyFull,
    /// The host cannot join their own session as guest
    CannotJoinOwnSession,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // General errors
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),

            // Game-specific errors
            Self::UnknownGameType(game_type) => {
                write!(f, "Unknown game type: {game_type}")
            }
            Self::InvalidCoordinates { row, col } => {
                write!(f, "Invalid coordinates: row={row}, col={col}")
            }
            Self::NotInSession { player_id } => {
                write!(f, "Player {player_id} is not part of this session")
            }
            Self::NotYourTurn { player_id } => {
                write!(f, "Player {player_id} is not on turn")
            }
            Self::CellOccupied { row, col } => {
                write!(f, "Cell at ({row}, {col}) is not playable")
            }
            Self::NotActive => write!(f, "Session is not active"),
            Self::AlreadyFinished => write!(f, "Session is already finished"),
            Self::AlreadyFull => write!(f, "Session already has two players"),
            Self::CannotJoinOwnSession => {
                write!(f, "Host cannot join their own session")
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status, stable error code and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                msg.clone(),
            ),
            Self::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
            Self::UnknownGameType(game_type) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_GAME_TYPE",
                format!("Unknown game type: '{game_type}'"),
            ),
            Self::InvalidCoordinates { row, col } => (
                StatusCode::BAD_REQUEST,
                "INVALID_COORDINATES",
                format!("Coordinates ({row}, {col}) are outside the board"),
            ),
            Self::NotInSession { player_id } => (
                StatusCode::BAD_REQUEST,
                "NOT_IN_SESSION",
                format!("Player {player_id} is not part of this session"),
            ),
            Self::NotYourTurn { player_id } => (
                StatusCode::CONFLICT,
                "NOT_YOUR_TURN",
                format!("It is not player {player_id}'s turn"),
            ),
            Self::CellOccupied { row, col } => (
                StatusCode::CONFLICT,
                "CELL_OCCUPIED",
                format!("Cell at ({row}, {col}) is not playable"),
            ),
            Self::NotActive => (
                StatusCode::CONFLICT,
                "NOT_ACTIVE",
                "Session is still waiting for a second player".to_string(),
            ),
            Self::AlreadyFinished => (
                StatusCode::CONFLICT,
                "ALREADY_FINISHED",
                "Session is already finished".to_string(),
            ),
            Self::AlreadyFull => (
                StatusCode::CONFLICT,
                "ALREADY_FULL",
                "Session already has two players".to_string(),
            ),
            Self::CannotJoinOwnSession => (
                StatusCode::CONFLICT,
                "CANNOT_JOIN_OWN_SESSION",
                "Host cannot join their own session".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        // Server-side failures carry detail we must not leak to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("API error: {self}");
            "An internal error occurred".to_string()
        } else {
            tracing::debug!("API error: {self}");
            message
        };

        let error_response = ErrorResponse {
            code: code.to_string(),
            message,
            details: None,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert `SeaORM` database errors to `AppError`
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Convert anyhow errors to `AppError`
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
