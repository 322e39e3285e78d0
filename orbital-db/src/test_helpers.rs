//! Test helpers for the notes database.

use crate::{error::DbResult, sqlite_runtime::create_in_memory_pool, store::NoteStore};

/// Create an in-memory, fully migrated notes store for testing
pub async fn create_test_store() -> DbResult<NoteStore> {
    let pool = create_in_memory_pool().await?;
    NoteStore::from_pool(pool).await
}
