use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::dto::LeaderboardEntry;
use crate::error::AppError;
use crate::services::{LeaderboardMetric, QueryService};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// Build the leaderboard route group.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_leaderboard))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    metric: Option<String>,
    limit: Option<usize>,
}

/// `GET /leaderboard?metric=&limit=` — Top players over finished sessions.
async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let metric = match query.metric.as_deref() {
        None => LeaderboardMetric::default(),
        Some(s) => LeaderboardMetric::from_str(s)
            .ok_or_else(|| AppError::Validation(format!("Unknown leaderboard metric: '{s}'")))?,
    };

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}."
        )));
    }

    Ok(Json(
        QueryService::leaderboard(&state.db, metric, limit).await?,
    ))
}
