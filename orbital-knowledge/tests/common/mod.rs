#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use orbital_knowledge::{
    ChatCompleter, Embedder, KnowledgeError, KnowledgeResult, KnowledgeSettings, NoteEngine,
};

/// One vector axis per keyword; a text scores 1.0 on every keyword it
/// contains (case-insensitive). Text without keywords embeds to zeros.
pub const KEYWORDS: [&str; 8] = [
    "roadmap", "budget", "alice", "meeting", "rust", "garden", "music", "travel",
];

#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    /// When set, earlier calls sleep longer so responses arrive out of
    /// request order.
    pub stagger: AtomicBool,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        KEYWORDS
            .iter()
            .map(|kw| if lower.contains(kw) { 1.0 } else { 0.0 })
            .collect()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_staggered(&self, stagger: bool) {
        self.stagger.store(stagger, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(KnowledgeError::Embedding(
                "embedding request failed: 503 Service Unavailable".to_string(),
            ));
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if self.stagger.load(Ordering::SeqCst) {
            let delay = 60u64.saturating_sub(call as u64 * 15);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(Self::vector_for(text))
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

/// Deterministic summarizer: echoes the first sentence of the note.
#[derive(Debug, Default)]
pub struct EchoChat {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl EchoChat {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatCompleter for EchoChat {
    async fn complete(&self, _system: &str, user: &str) -> KnowledgeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(KnowledgeError::Chat(
                "chat request failed: 500 Internal Server Error model not loaded".to_string(),
            ));
        }
        let first = user.split(['.', '\n']).next().unwrap_or_default().trim();
        Ok(format!("Summary: {first}"))
    }
}

pub struct TestEngine {
    pub engine: NoteEngine,
    pub embedder: Arc<KeywordEmbedder>,
    pub chat: Arc<EchoChat>,
}

pub async fn test_engine() -> TestEngine {
    test_engine_with(KnowledgeSettings::default()).await
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("orbital_knowledge=debug,orbital_db=debug,warn")
        .with_test_writer()
        .try_init();
}

pub async fn test_engine_with(settings: KnowledgeSettings) -> TestEngine {
    init_tracing();
    let store = orbital_db::test_helpers::create_test_store()
        .await
        .expect("test store");
    let embedder = Arc::new(KeywordEmbedder::default());
    let chat = Arc::new(EchoChat::default());
    let engine = NoteEngine::from_parts(store, embedder.clone(), chat.clone(), settings)
        .expect("engine");
    TestEngine {
        engine,
        embedder,
        chat,
    }
}

/// Create a note and save `title` / `content` into it.
pub async fn seed_note(engine: &NoteEngine, title: &str, content: &str) -> i64 {
    let id = engine.create_note().await.expect("create note");
    engine
        .save_note(id, title, content)
        .await
        .expect("save note");
    id
}

pub async fn count_rows(engine: &NoteEngine, sql: &str, note_id: i64) -> i64 {
    let (count,): (i64,) = sqlx::query_as(sql)
        .bind(note_id)
        .fetch_one(engine.pool())
        .await
        .expect("count query");
    count
}
