//! Note indexing and hybrid retrieval for orbital.

pub mod chat;
pub mod chunker;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod index;
pub mod models;
pub mod parser;
pub mod paths;
pub mod search;
pub mod similarity;

pub use chat::{ChatCompleter, OllamaChatClient, SUMMARY_SYSTEM_PROMPT};
pub use chunker::chunk_text;
pub use embeddings::{Embedder, OllamaEmbeddingClient};
pub use engine::NoteEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use index::IndexWriter;
pub use models::{LinkTarget, NoteGraph, NoteRef, ReindexReport, SearchHit, Strategy};
pub use orbital_core::{ChunkingDefaults, KnowledgeSettings, SearchDefaults};
pub use parser::{extract_links, extract_tags};
pub use similarity::cosine_similarity;
