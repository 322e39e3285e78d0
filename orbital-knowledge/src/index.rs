//! Index writer: keeps a note's chunks, vectors, summary, tags and links in
//! step with its content.
//!
//! A save runs in two phases. `prepare` does every inference call (summary,
//! chunk embeddings, summary embedding) without touching the database.
//! `apply` then replaces all derived rows inside one SQLite transaction, so
//! readers see either the previous index or the new one, and an inference
//! failure leaves the previous index untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::{StreamExt, TryStreamExt, stream};
use orbital_core::ChunkingDefaults;
use orbital_db::{ChunkRepository, LinkRepository, NoteRepository, NoteStore, TagRepository};
use sqlx::SqliteConnection;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::KnowledgeSettings;
use crate::chat::{ChatCompleter, SUMMARY_SYSTEM_PROMPT};
use crate::chunker::chunk_text;
use crate::embeddings::Embedder;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{LinkTarget, ReindexReport};
use crate::parser::{extract_links, extract_tags};

/// Per-note async locks. Saves of one note queue up; different notes do not
/// contend.
#[derive(Debug, Default)]
pub(crate) struct NoteLocks {
    inner: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl NoteLocks {
    pub(crate) async fn acquire(&self, note_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(note_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub(crate) fn forget(&self, note_id: i64) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&note_id);
    }
}

/// Everything derived from a note's content before any row is written.
#[derive(Debug, Default)]
struct PreparedIndex {
    summary: String,
    summary_vector: Option<Vec<f32>>,
    chunks: Vec<(String, Vec<f32>)>,
    tags: Vec<String>,
    link_titles: Vec<String>,
}

pub struct IndexWriter {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatCompleter>,
    chunking: ChunkingDefaults,
    embedding_dim: Option<usize>,
    embedding_concurrency: usize,
    locks: NoteLocks,
}

impl IndexWriter {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatCompleter>,
        settings: &KnowledgeSettings,
    ) -> Self {
        Self {
            embedder,
            chat,
            chunking: settings.chunking,
            embedding_dim: settings.embedding_dim,
            embedding_concurrency: settings.embedding_concurrency.max(1),
            locks: NoteLocks::default(),
        }
    }

    /// Persist a note's title and content and rebuild its index, all in one
    /// transaction.
    pub async fn save_note(
        &self,
        store: &NoteStore,
        note_id: i64,
        title: &str,
        content: &str,
    ) -> KnowledgeResult<ReindexReport> {
        let _guard = self.locks.acquire(note_id).await;
        self.run_locked(store, note_id, content, Some(title)).await
    }

    /// Rebuild the index from the note's stored content, read under the
    /// note's lock so a concurrent save cannot be overwritten with stale text.
    pub async fn reindex_stored(
        &self,
        store: &NoteStore,
        note_id: i64,
    ) -> KnowledgeResult<ReindexReport> {
        let _guard = self.locks.acquire(note_id).await;
        let note = NoteRepository::get(store.pool(), note_id)
            .await?
            .ok_or(KnowledgeError::UnknownNote(note_id))?;
        self.run_locked(store, note_id, &note.content, None).await
    }

    /// Drop the lock entry of a deleted note.
    pub(crate) fn forget(&self, note_id: i64) {
        self.locks.forget(note_id);
    }

    pub(crate) async fn lock(&self, note_id: i64) -> OwnedMutexGuard<()> {
        self.locks.acquire(note_id).await
    }

    async fn run_locked(
        &self,
        store: &NoteStore,
        note_id: i64,
        content: &str,
        title: Option<&str>,
    ) -> KnowledgeResult<ReindexReport> {
        if !NoteRepository::exists(store.pool(), note_id).await? {
            return Err(KnowledgeError::UnknownNote(note_id));
        }

        let prepared = self.prepare(content).await?;

        let mut tx = store.pool().begin().await?;
        if let Some(title) = title {
            NoteRepository::update_fields(&mut *tx, note_id, title, content).await?;
        }
        let report = self.apply(&mut *tx, note_id, prepared).await?;
        tx.commit().await?;

        info!(
            "Indexed note {}: {} chunks, {} tags, {} links",
            note_id,
            report.chunk_count,
            report.tags.len(),
            report.links.len()
        );
        Ok(report)
    }

    async fn prepare(&self, content: &str) -> KnowledgeResult<PreparedIndex> {
        let mut link_titles: Vec<String> = Vec::new();
        for title in extract_links(content) {
            if !link_titles.contains(&title) {
                link_titles.push(title);
            }
        }
        let mut prepared = PreparedIndex {
            tags: extract_tags(content),
            link_titles,
            ..Default::default()
        };

        if content.trim().is_empty() {
            return Ok(prepared);
        }

        prepared.summary = self.chat.complete(SUMMARY_SYSTEM_PROMPT, content).await?;

        let chunks: Vec<String> =
            chunk_text(content, self.chunking.max_size, self.chunking.overlap)
                .into_iter()
                .filter(|chunk| !chunk.is_empty())
                .collect();

        let embedder = self.embedder.as_ref();
        let embeds: Vec<_> = chunks.iter().map(|chunk| embedder.embed(chunk)).collect();
        let vectors: Vec<Vec<f32>> = stream::iter(embeds)
            .buffered(self.embedding_concurrency)
            .try_collect()
            .await?;

        let mut expected = self.embedding_dim;
        for vector in &vectors {
            check_dim(&mut expected, vector)?;
        }

        if !prepared.summary.trim().is_empty() {
            let vector = embedder.embed(&prepared.summary).await?;
            check_dim(&mut expected, &vector)?;
            prepared.summary_vector = Some(vector);
        }

        prepared.chunks = chunks.into_iter().zip(vectors).collect();
        Ok(prepared)
    }

    async fn apply(
        &self,
        conn: &mut SqliteConnection,
        note_id: i64,
        prepared: PreparedIndex,
    ) -> KnowledgeResult<ReindexReport> {
        let model = self.embedder.model();

        NoteRepository::set_summary(conn, note_id, &prepared.summary).await?;

        ChunkRepository::delete_for_note(conn, note_id).await?;
        for (index, (chunk, vector)) in prepared.chunks.iter().enumerate() {
            let chunk_id =
                ChunkRepository::insert_chunk(conn, note_id, index as i64, chunk).await?;
            ChunkRepository::insert_embedding(conn, chunk_id, note_id, vector, model).await?;
        }

        ChunkRepository::replace_summary_embedding(
            conn,
            note_id,
            prepared.summary_vector.as_deref(),
            model,
        )
        .await?;

        TagRepository::replace_for_note(conn, note_id, &prepared.tags).await?;
        TagRepository::delete_orphans(conn).await?;

        let mut links = Vec::with_capacity(prepared.link_titles.len());
        let mut target_ids = Vec::new();
        for title in prepared.link_titles {
            match NoteRepository::find_id_by_title(conn, &title).await? {
                Some(target) => {
                    target_ids.push(target);
                    links.push(LinkTarget::Resolved {
                        title,
                        note_id: target,
                    });
                }
                None => {
                    debug!("Note {} links to unknown title {:?}", note_id, title);
                    links.push(LinkTarget::Unresolved { title });
                }
            }
        }
        LinkRepository::replace_for_note(conn, note_id, &target_ids).await?;

        Ok(ReindexReport {
            note_id,
            chunk_count: prepared.chunks.len(),
            summary: prepared.summary,
            tags: prepared.tags,
            links,
        })
    }
}

/// Enforce one dimension across a save. The first vector fixes it unless a
/// dimension is configured.
fn check_dim(expected: &mut Option<usize>, vector: &[f32]) -> KnowledgeResult<()> {
    match *expected {
        Some(dim) if dim != vector.len() => Err(KnowledgeError::EmbeddingDimMismatch {
            expected: dim,
            actual: vector.len(),
        }),
        Some(_) => Ok(()),
        None => {
            *expected = Some(vector.len());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_dim_locks_to_first_vector() {
        let mut expected = None;
        check_dim(&mut expected, &[1.0, 2.0]).unwrap();
        assert_eq!(expected, Some(2));
        assert!(matches!(
            check_dim(&mut expected, &[1.0]),
            Err(KnowledgeError::EmbeddingDimMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn note_locks_serialise_same_note() {
        let locks = NoteLocks::default();
        let guard = locks.acquire(1).await;

        let other = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(2)).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(1)).await;
        assert!(same.is_err());

        drop(guard);
        let same = tokio::time::timeout(std::time::Duration::from_millis(50), locks.acquire(1)).await;
        assert!(same.is_ok());
    }
}
