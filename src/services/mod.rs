pub mod query_service;
pub mod session_service;

pub use query_service::{LeaderboardMetric, QueryService};
pub use session_service::{CreateSessionParams, SessionService};
