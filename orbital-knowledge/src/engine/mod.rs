use std::sync::Arc;

use orbital_db::{ChunkRecord, Note, NoteStore};
use sqlx::SqlitePool;

use crate::KnowledgeSettings;
use crate::chat::{ChatCompleter, OllamaChatClient};
use crate::embeddings::{Embedder, OllamaEmbeddingClient};
use crate::errors::KnowledgeResult;
use crate::index::IndexWriter;
use crate::models::{NoteGraph, ReindexReport, SearchHit};
use crate::paths::notes_db_path;

pub(crate) mod notes;
pub(crate) mod search;

/// Entry point for note storage, indexing and retrieval.
///
/// Owns the store handle and the inference collaborators; nothing is global.
pub struct NoteEngine {
    settings: KnowledgeSettings,
    store: NoteStore,
    embedder: Arc<dyn Embedder>,
    writer: IndexWriter,
}

impl NoteEngine {
    /// Open the notes database and connect the Ollama clients.
    pub async fn open(settings: KnowledgeSettings) -> KnowledgeResult<Self> {
        settings.validate()?;
        let path = notes_db_path(&settings)?;
        let store = NoteStore::open(&path).await?;
        let embedder = Arc::new(OllamaEmbeddingClient::new(&settings)?);
        let chat = Arc::new(OllamaChatClient::new(&settings)?);
        Self::from_parts(store, embedder, chat, settings)
    }

    /// Assemble an engine from an existing store and collaborators.
    pub fn from_parts(
        store: NoteStore,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatCompleter>,
        settings: KnowledgeSettings,
    ) -> KnowledgeResult<Self> {
        settings.validate()?;
        let writer = IndexWriter::new(embedder.clone(), chat, &settings);
        Ok(Self {
            settings,
            store,
            embedder,
            writer,
        })
    }

    /// Access the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        self.store.pool()
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Access the knowledge settings.
    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    pub(crate) fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub(crate) fn writer(&self) -> &IndexWriter {
        &self.writer
    }

    /// Create an empty note and return its id.
    pub async fn create_note(&self) -> KnowledgeResult<i64> {
        notes::create_note(self).await
    }

    pub async fn get_note(&self, note_id: i64) -> KnowledgeResult<Option<Note>> {
        notes::get_note(self, note_id).await
    }

    pub async fn list_note_ids(&self) -> KnowledgeResult<Vec<i64>> {
        notes::list_note_ids(self).await
    }

    pub async fn list_notes(&self) -> KnowledgeResult<Vec<Note>> {
        notes::list_notes(self).await
    }

    /// Update title and content and rebuild the note's index atomically.
    ///
    /// Inference runs before anything is written; if it fails the note and
    /// its index are left exactly as they were, and the save can be retried.
    pub async fn save_note(
        &self,
        note_id: i64,
        title: &str,
        content: &str,
    ) -> KnowledgeResult<ReindexReport> {
        self.writer.save_note(&self.store, note_id, title, content).await
    }

    /// Rebuild a note's index from its stored content.
    pub async fn reindex_note(&self, note_id: i64) -> KnowledgeResult<ReindexReport> {
        self.writer.reindex_stored(&self.store, note_id).await
    }

    /// Delete a note with everything derived from it. Returns `false` if the
    /// note did not exist.
    pub async fn delete_note(&self, note_id: i64) -> KnowledgeResult<bool> {
        notes::delete_note(self, note_id).await
    }

    /// Stored chunks of a note, in order.
    pub async fn chunks(&self, note_id: i64) -> KnowledgeResult<Vec<ChunkRecord>> {
        notes::chunks(self, note_id).await
    }

    pub async fn note_graph(&self, note_id: i64) -> KnowledgeResult<NoteGraph> {
        notes::note_graph(self, note_id).await
    }

    /// Every tag with its note count.
    pub async fn all_tags(&self) -> KnowledgeResult<Vec<(String, i64)>> {
        notes::all_tags(self).await
    }

    /// Union of the lexical and semantic strategies, deduplicated, in
    /// strategy order. Unscored.
    pub async fn search(&self, query: &str) -> KnowledgeResult<Vec<i64>> {
        search::search(self, query).await
    }

    /// The same four strategies fused with weighted reciprocal rank fusion.
    pub async fn search_ranked(&self, query: &str) -> KnowledgeResult<Vec<SearchHit>> {
        search::search_ranked(self, query).await
    }

    /// Semantic strategy alone: note ids, best match first.
    pub async fn similarity_search(&self, query: &str) -> KnowledgeResult<Vec<i64>> {
        Ok(self
            .similarity_scores(query)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Semantic strategy with each note's best cosine score.
    pub async fn similarity_scores(&self, query: &str) -> KnowledgeResult<Vec<(i64, f32)>> {
        search::similarity_scores(self, query).await
    }
}
