use sea_orm::DatabaseConnection;

use crate::config::Config;

/// State shared by every request handler.
///
/// Cloning is cheap: `db` is a pool handle and the config is read-only
/// after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self { db, config }
    }
}
