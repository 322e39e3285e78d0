//! Notes database pool and initialization.

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::sqlite_runtime::{check_integrity, create_file_pool, run_migrations};

/// File name of the notes database inside the data directory.
pub const DB_FILE_NAME: &str = "orbitalnotes.db";

/// Owned handle to the notes database.
///
/// Cloning is cheap and shares the underlying pool, so every component that
/// needs storage receives its own handle instead of reaching for a global.
#[derive(Debug, Clone)]
pub struct NoteStore {
    pool: SqlitePool,
}

impl NoteStore {
    /// Open (or create) the notes database at `db_path` and run migrations.
    pub async fn open(db_path: &Path) -> DbResult<Self> {
        info!("Initializing notes database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = create_file_pool(db_path, 4).await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations and an integrity check.
    pub async fn from_pool(pool: SqlitePool) -> DbResult<Self> {
        run_migrations(&pool).await?;
        check_integrity(&pool).await?;

        info!("Notes database initialized successfully");
        Ok(Self { pool })
    }

    /// Get the inner SQLx pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Default database path: `$ORBITAL_DATA_DIR/orbitalnotes.db`, falling
    /// back to the platform data directory.
    pub fn default_db_path() -> DbResult<PathBuf> {
        Ok(Self::data_dir()?.join(DB_FILE_NAME))
    }

    /// Resolve the orbital data directory.
    pub fn data_dir() -> DbResult<PathBuf> {
        if let Ok(dir) = std::env::var("ORBITAL_DATA_DIR") {
            return Ok(PathBuf::from(dir));
        }
        let data_dir = dirs::data_dir().ok_or(DbError::NoDataDir)?;
        Ok(data_dir.join("orbital"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENV_MUTEX;

    #[test]
    fn test_data_dir_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let temp = tempfile::TempDir::new().unwrap();

        unsafe { std::env::set_var("ORBITAL_DATA_DIR", temp.path()) };
        let path = NoteStore::default_db_path().unwrap();
        unsafe { std::env::remove_var("ORBITAL_DATA_DIR") };

        assert_eq!(path, temp.path().join(DB_FILE_NAME));
    }

    #[tokio::test]
    async fn test_open_creates_file_and_parent() {
        let temp = tempfile::TempDir::new().unwrap();
        let db_path = temp.path().join("nested").join("notes.db");

        let store = NoteStore::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
