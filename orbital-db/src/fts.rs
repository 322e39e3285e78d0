//! Lexical search over the three FTS5 indexes of note content.

use std::fmt;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Tokenizer behind one of the lexical indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FtsTokenizer {
    /// `unicode61`: case-folded words
    Unicode,
    /// `porter unicode61`: stemmed words
    Porter,
    /// `trigram`: substrings of three or more characters
    Trigram,
}

impl FtsTokenizer {
    /// Strategy order used when results are concatenated.
    pub const ALL: [FtsTokenizer; 3] = [Self::Unicode, Self::Porter, Self::Trigram];

    pub fn table(self) -> &'static str {
        match self {
            Self::Unicode => "notes_fts_unicode",
            Self::Porter => "notes_fts_porter",
            Self::Trigram => "notes_fts_trigram",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unicode => "unicode",
            Self::Porter => "porter",
            Self::Trigram => "trigram",
        }
    }
}

impl fmt::Display for FtsTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn free text into an FTS5 MATCH expression.
///
/// Each whitespace-separated term becomes a quoted string (embedded quotes
/// doubled), so operators and punctuation in user input are matched
/// literally. Terms are implicitly ANDed. Returns `None` for blank input.
pub fn fts_query(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Note ids matching `query` under `tokenizer`, best bm25 score first.
///
/// The returned score is SQLite's bm25 value, where lower is better.
pub async fn lexical_search(
    pool: &SqlitePool,
    tokenizer: FtsTokenizer,
    query: &str,
    limit: Option<usize>,
) -> DbResult<Vec<(i64, f64)>> {
    let Some(expr) = fts_query(query) else {
        return Ok(Vec::new());
    };

    let table = tokenizer.table();
    let sql = format!(
        "SELECT rowid, bm25({table}) AS score \
         FROM {table} \
         WHERE {table} MATCH ? \
         ORDER BY score ASC, rowid ASC \
         LIMIT ?"
    );
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let hits: Vec<(i64, f64)> = sqlx::query_as(&sql)
        .bind(&expr)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    debug!("{} strategy matched {} notes", tokenizer, hits.len());
    Ok(hits)
}
