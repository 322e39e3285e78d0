#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("database error: {0}")]
    Db(#[from] orbital_db::DbError),
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("settings error: {0}")]
    Settings(#[from] orbital_core::SettingsError),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("chat error: {0}")]
    Chat(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimMismatch { expected: usize, actual: usize },
    #[error("unknown note: {0}")]
    UnknownNote(i64),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
