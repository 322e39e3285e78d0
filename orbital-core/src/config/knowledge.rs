//! Knowledge system configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `orbital-knowledge`. They are created from the user-facing TOML structs
//! via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::{KnowledgeSearchSettings, Settings, SettingsError};

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_chat_model")]
    pub completion_model: String,
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_concurrency")]
    pub embedding_concurrency: usize,
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub db_path_override: Option<PathBuf>,
    /// Override the root data directory. When set, the default database path
    /// derives from this root instead of `ORBITAL_DATA_DIR` / XDG.
    #[serde(default)]
    pub data_root_override: Option<PathBuf>,
    #[serde(default)]
    pub chunking: ChunkingDefaults,
    #[serde(default)]
    pub search: SearchDefaults,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            inference_url: default_inference_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            completion_model: default_chat_model(),
            embedding_dim: None,
            embedding_concurrency: default_embedding_concurrency(),
            request_timeout_seconds: None,
            db_path_override: None,
            data_root_override: None,
            chunking: ChunkingDefaults::default(),
            search: SearchDefaults::default(),
        }
    }
}

impl KnowledgeSettings {
    /// Reject combinations the chunker and index writer cannot honour.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.chunking.max_size == 0 {
            return Err(SettingsError::Invalid(
                "chunking max_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.max_size {
            return Err(SettingsError::Invalid(format!(
                "chunking overlap ({}) must be smaller than max_size ({})",
                self.chunking.overlap, self.chunking.max_size
            )));
        }
        if self.embedding_concurrency == 0 {
            return Err(SettingsError::Invalid(
                "embedding_concurrency must be at least 1".to_string(),
            ));
        }
        if self.embedding_dim == Some(0) {
            return Err(SettingsError::Invalid(
                "embedding_dim must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolved chunking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingDefaults {
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingDefaults {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            overlap: default_overlap(),
        }
    }
}

/// Resolved search tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
    /// Cap on hits per lexical strategy; `None` returns every match.
    #[serde(default)]
    pub lexical_limit: Option<usize>,
    #[serde(default = "default_weight")]
    pub unicode_weight: f32,
    #[serde(default = "default_weight")]
    pub porter_weight: f32,
    #[serde(default = "default_weight")]
    pub trigram_weight: f32,
    #[serde(default = "default_weight")]
    pub semantic_weight: f32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            rrf_k: default_rrf_k(),
            lexical_limit: None,
            unicode_weight: default_weight(),
            porter_weight: default_weight(),
            trigram_weight: default_weight(),
            semantic_weight: default_weight(),
        }
    }
}

fn default_inference_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_embedding_concurrency() -> usize {
    1
}

fn default_max_size() -> usize {
    1024
}

fn default_overlap() -> usize {
    100
}

fn default_similarity_threshold() -> f32 {
    0.5
}

fn default_rrf_k() -> usize {
    60
}

fn default_weight() -> f32 {
    1.0
}

impl From<&Settings> for KnowledgeSettings {
    fn from(value: &Settings) -> Self {
        let mut settings = KnowledgeSettings {
            embedding_model: value.models.embedding_model.clone(),
            chat_model: value.models.chat_model.clone(),
            completion_model: value.models.completion_model.clone(),
            ..Default::default()
        };

        let inference = &value.inference;
        if let Some(url) = &inference.base_url {
            settings.inference_url = url.clone();
        }
        if let Some(concurrency) = inference.embedding_concurrency {
            settings.embedding_concurrency = concurrency;
        }
        settings.embedding_dim = inference.embedding_dim;
        settings.request_timeout_seconds = inference.timeout_seconds;

        let knowledge = &value.knowledge;
        settings.db_path_override = knowledge.db_path.as_ref().map(PathBuf::from);
        if let Some(max_size) = knowledge.chunking.max_size {
            settings.chunking.max_size = max_size;
        }
        if let Some(overlap) = knowledge.chunking.overlap {
            settings.chunking.overlap = overlap;
        }
        apply_search_overrides(&mut settings.search, &knowledge.search);

        settings
    }
}

fn apply_search_overrides(search: &mut SearchDefaults, value: &KnowledgeSearchSettings) {
    if let Some(threshold) = value.similarity_threshold {
        search.similarity_threshold = threshold;
    }
    if let Some(k) = value.rrf_k {
        search.rrf_k = k;
    }
    if value.lexical_limit.is_some() {
        search.lexical_limit = value.lexical_limit;
    }
    if let Some(weight) = value.unicode_weight {
        search.unicode_weight = weight;
    }
    if let Some(weight) = value.porter_weight {
        search.porter_weight = weight;
    }
    if let Some(weight) = value.trigram_weight {
        search.trigram_weight = weight;
    }
    if let Some(weight) = value.semantic_weight {
        search.semantic_weight = weight;
    }
}
