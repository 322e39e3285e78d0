use serde::{Deserialize, Serialize};

use orbital_db::FtsTokenizer;

/// Outcome of resolving one `[[Title]]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LinkTarget {
    Resolved { title: String, note_id: i64 },
    Unresolved { title: String },
}

impl LinkTarget {
    pub fn title(&self) -> &str {
        match self {
            Self::Resolved { title, .. } | Self::Unresolved { title } => title,
        }
    }

    pub fn note_id(&self) -> Option<i64> {
        match self {
            Self::Resolved { note_id, .. } => Some(*note_id),
            Self::Unresolved { .. } => None,
        }
    }
}

/// What a reindex wrote for a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub note_id: i64,
    pub chunk_count: usize,
    pub summary: String,
    pub tags: Vec<String>,
    /// Every distinct link title in the content. Only resolved ones are stored.
    pub links: Vec<LinkTarget>,
}

impl ReindexReport {
    pub fn unresolved_links(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .filter(|link| link.note_id().is_none())
            .map(LinkTarget::title)
    }
}

/// Retrieval strategy, in the order results are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Unicode,
    Porter,
    Trigram,
    Semantic,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Self::Unicode, Self::Porter, Self::Trigram, Self::Semantic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unicode => "unicode",
            Self::Porter => "porter",
            Self::Trigram => "trigram",
            Self::Semantic => "semantic",
        }
    }

    /// Lexical index behind this strategy, if any.
    pub fn tokenizer(&self) -> Option<FtsTokenizer> {
        match self {
            Self::Unicode => Some(FtsTokenizer::Unicode),
            Self::Porter => Some(FtsTokenizer::Porter),
            Self::Trigram => Some(FtsTokenizer::Trigram),
            Self::Semantic => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fused search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub note_id: i64,
    pub score: f32,
    /// Strategies that returned this note, in strategy order.
    pub strategies: Vec<Strategy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: i64,
    pub title: String,
}

/// Tags and links around one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteGraph {
    pub note_id: i64,
    pub tags: Vec<String>,
    pub links_out: Vec<NoteRef>,
    pub backlinks: Vec<NoteRef>,
}
