//! Database error types.

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// SQL error from sqlx
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data directory not found
    #[error("Data directory not found")]
    NoDataDir,

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    /// Stored embedding payload that does not decode to a vector
    #[error("Malformed embedding: {0}")]
    MalformedEmbedding(String),
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;
