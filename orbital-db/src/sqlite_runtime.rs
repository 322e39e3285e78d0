//! SQLite runtime bootstrap helpers for note pools.

use std::path::Path;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

/// Pragmas go on the connect options so every pooled connection gets them,
/// not just the first one.
pub(crate) async fn create_file_pool(db_path: &Path, max_connections: u32) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("cache_size", "-64000");

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// In-memory databases live and die with their connection, so the pool is
/// pinned to a single connection that never idles out.
#[cfg(any(test, feature = "test-helpers"))]
pub(crate) async fn create_in_memory_pool() -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    sqlx::migrate!("./migrations/notes")
        .run(pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))?;

    info!("Notes database migrations completed");
    Ok(())
}

/// Run `PRAGMA integrity_check` and log anything other than `ok`.
pub(crate) async fn check_integrity(pool: &SqlitePool) -> DbResult<bool> {
    let rows: Vec<(String,)> = sqlx::query_as("PRAGMA integrity_check")
        .fetch_all(pool)
        .await?;

    let healthy = matches!(rows.as_slice(), [(status,)] if status == "ok");
    if healthy {
        info!("Notes database integrity check passed");
    } else {
        for (problem,) in &rows {
            warn!("Notes database integrity problem: {}", problem);
        }
    }

    Ok(healthy)
}
