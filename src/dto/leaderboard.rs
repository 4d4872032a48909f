use serde::Serialize;
use uuid::Uuid;

/// One ranked player.
///
/// `efficiency` is the average of `moves_in_session / 2` over the player's
/// won sessions (lower is better); `null` until they have won at least once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub efficiency: Option<f64>,
}
