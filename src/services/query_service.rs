//! Read-only projections over committed state.
//!
//! Queries bypass the session engine and never take the row lock; they may
//! observe a session at any committed state.

use std::cmp::Ordering;
use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::dto::{LeaderboardEntry, SessionListResponse, SessionResponse, SessionSummary};
use crate::error::AppError;
use crate::store::{self, SessionFilter};

/// Leaderboard ranking metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardMetric {
    /// Most wins first; fewer losses, then name break ties
    #[default]
    WinCount,
    /// Lowest average moves-per-won-session first; players without a win
    /// sort last
    Efficiency,
}

impl LeaderboardMetric {
    /// Convert from the wire string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "win_count" => Some(Self::WinCount),
            "efficiency" => Some(Self::Efficiency),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Tally {
    wins: u64,
    losses: u64,
    draws: u64,
    /// Sum of `moves_in_session / 2` over won sessions
    won_move_halves: f64,
}

pub struct QueryService;

impl QueryService {
    /// Full session projection at its latest committed state.
    pub async fn get_session(
        db: &DatabaseConnection,
        session_id: Uuid,
    ) -> Result<SessionResponse, AppError> {
        let sess = store::find_session(db, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        let moves = store::list_moves(db, session_id).await?;
        SessionResponse::from_models(&sess, &moves)
    }

    /// Paginated compact listing, newest first.
    pub async fn list_sessions(
        db: &DatabaseConnection,
        filter: SessionFilter,
    ) -> Result<SessionListResponse, AppError> {
        let page = store::list_sessions(db, &filter).await?;
        Ok(SessionListResponse {
            items: page.items.iter().map(SessionSummary::from_model).collect(),
            next_cursor: page.next_cursor,
        })
    }

    /// Top players derived from FINISHED sessions.
    pub async fn leaderboard(
        db: &DatabaseConnection,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let sessions = store::finished_sessions(db).await?;
        let counts: HashMap<Uuid, i64> = store::move_counts(db).await?.into_iter().collect();

        let mut tallies: HashMap<Uuid, Tally> = HashMap::new();
        for sess in &sessions {
            let Some(guest_id) = sess.guest_id else {
                tracing::warn!(session_id = %sess.id, "finished session without guest, skipping");
                continue;
            };
            let roster = [sess.host_id, guest_id];

            if let Some(winner) = sess.winner {
                let moves_in_session = counts.get(&sess.id).copied().unwrap_or(0) as f64;
                for user_id in roster {
                    let tally = tallies.entry(user_id).or_default();
                    if user_id == winner {
                        tally.wins += 1;
                        tally.won_move_halves += moves_in_session / 2.0;
                    } else {
                        tally.losses += 1;
                    }
                }
            } else if sess.draw {
                for user_id in roster {
                    tallies.entry(user_id).or_default().draws += 1;
                }
            }
        }

        let users = store::users_by_ids(db, tallies.keys().copied().collect()).await?;
        let mut entries: Vec<LeaderboardEntry> = users
            .into_iter()
            .filter_map(|user| {
                tallies.get(&user.id).map(|tally| LeaderboardEntry {
                    user_id: user.id,
                    name: user.name,
                    icon: user.icon,
                    wins: tally.wins,
                    losses: tally.losses,
                    draws: tally.draws,
                    efficiency: (tally.wins > 0)
                        .then(|| tally.won_move_halves / tally.wins as f64),
                })
            })
            .collect();

        match metric {
            LeaderboardMetric::WinCount => entries.sort_by(|a, b| {
                b.wins
                    .cmp(&a.wins)
                    .then(a.losses.cmp(&b.losses))
                    .then_with(|| a.name.cmp(&b.name))
            }),
            LeaderboardMetric::Efficiency => entries.sort_by(|a, b| {
                match (a.efficiency, b.efficiency) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
                .then_with(|| a.name.cmp(&b.name))
            }),
        }

        entries.truncate(limit);
        Ok(entries)
    }
}
