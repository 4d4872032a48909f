use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Open the connection pool.
///
/// A move transaction holds its session row lock for a handful of queries,
/// so connections turn over quickly; a modest pool with a short acquire
/// timeout keeps writers blocked on the same session from piling up behind
/// a slow one.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Ok(Database::connect(opts).await?)
}
