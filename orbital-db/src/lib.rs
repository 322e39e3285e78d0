//! orbital-db: SQLite storage for notes and their derived index.
//!
//! This crate provides database operations for:
//! - Notes and their summaries
//! - Chunks with chunk-level and summary-level embedding vectors
//! - Tags and note-to-note links
//! - Three FTS5 lexical indexes kept in sync with note content by triggers

pub mod chunks;
pub mod error;
pub mod fts;
pub mod links;
pub mod notes;
mod sqlite_runtime;
pub mod store;
pub mod tags;

// Re-export commonly used types
pub use chunks::{ChunkRecord, ChunkRepository, StoredVector};
pub use error::{DbError, DbResult};
pub use fts::{FtsTokenizer, fts_query, lexical_search};
pub use links::LinkRepository;
pub use notes::{Note, NoteRepository};
pub use store::{DB_FILE_NAME, NoteStore};
pub use tags::TagRepository;

// Re-export test helpers when running tests or when test-helpers feature is enabled
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
