mod health;
mod leaderboard;
mod sessions;
mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Canonical paths; any external prefix is applied by the deployment's
/// framing layer:
/// - `GET /health`, `GET /health/db` — liveness and database checks
/// - `POST /users` — identity creation
/// - `/sessions/...` — session lifecycle, moves and listings
/// - `GET /leaderboard` — aggregated standings
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/users", users::router())
        .nest("/sessions", sessions::router())
        .nest("/leaderboard", leaderboard::router())
}
