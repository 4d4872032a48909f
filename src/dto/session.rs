use serde::Serialize;
use uuid::Uuid;

use crate::entities::{game_move, session};
use crate::error::AppError;
use crate::rules::Board;

/// A roster member as exposed on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
}

/// One entry of the append-only move log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub player_id: Uuid,
    pub row: i32,
    pub col: i32,
    pub move_no: i32,
}

/// Canonical full session projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub players: Vec<PlayerResponse>,
    pub status: String,
    pub current_turn: Option<Uuid>,
    pub board: Board,
    pub moves: Vec<MoveResponse>,
    pub winner: Option<Uuid>,
    pub draw: bool,
    pub game_type: String,
    pub game_icon: Option<String>,
    pub created_at: String,
}

/// Compact projection used by the session listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub host: PlayerResponse,
    pub game_type: String,
    pub game_icon: Option<String>,
    pub status: String,
    pub players: Vec<PlayerResponse>,
    pub created_at: String,
}

/// One page of session summaries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub items: Vec<SessionSummary>,
    pub next_cursor: Option<String>,
}

/// Roster list in seating order: `[host, guest?]`.
fn roster(sess: &session::Model) -> Vec<PlayerResponse> {
    let mut players = vec![PlayerResponse {
        id: sess.host_id,
        name: sess.host_name.clone(),
        icon: sess.host_icon.clone(),
    }];
    if let Some(guest_id) = sess.guest_id {
        players.push(PlayerResponse {
            id: guest_id,
            name: sess.guest_name.clone().unwrap_or_default(),
            icon: sess.guest_icon.clone(),
        });
    }
    players
}

impl SessionResponse {
    /// Build the full projection from a session row and its ordered moves.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the stored board JSON does not parse;
    /// that state indicates a bug, never bad input.
    pub fn from_models(
        sess: &session::Model,
        moves: &[game_move::Model],
    ) -> Result<Self, AppError> {
        let board: Board = serde_json::from_value(sess.board.clone()).map_err(|e| {
            AppError::Internal(format!("stored board for session {} is invalid: {e}", sess.id))
        })?;

        Ok(Self {
            id: sess.id,
            players: roster(sess),
            status: sess.status.clone(),
            current_turn: sess.current_turn,
            board,
            moves: moves
                .iter()
                .map(|m| MoveResponse {
                    player_id: m.player_id,
                    row: m.row,
                    col: m.col,
                    move_no: m.move_no,
                })
                .collect(),
            winner: sess.winner,
            draw: sess.draw,
            game_type: sess.game_type.clone(),
            game_icon: sess.game_icon.clone(),
            created_at: sess.created_at.to_rfc3339(),
        })
    }
}

impl SessionSummary {
    pub fn from_model(sess: &session::Model) -> Self {
        Self {
            id: sess.id,
            host: PlayerResponse {
                id: sess.host_id,
                name: sess.host_name.clone(),
                icon: sess.host_icon.clone(),
            },
            game_type: sess.game_type.clone(),
            game_icon: sess.game_icon.clone(),
            status: sess.status.clone(),
            players: roster(sess),
            created_at: sess.created_at.to_rfc3339(),
        }
    }
}
