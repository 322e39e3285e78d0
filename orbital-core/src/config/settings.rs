//! Settings configuration loaded from TOML files.
//!
//! This module handles configuration stored in TOML format in the XDG config
//! directory (~/.config/orbital/config.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# orbital configuration file
# Located at: ~/.config/orbital/config.toml

# Model identifiers passed to the inference server.
[models]
embedding_model = "nomic-embed-text"
chat_model = "llama3.2"
completion_model = "llama3.2"

[inference]
base_url = "http://127.0.0.1:11434"
# timeout_seconds = 120
# Number of chunk embedding requests kept in flight per save (1 = sequential)
embedding_concurrency = 1
# embedding_dim = 768

[knowledge]
# db_path = "/path/to/orbitalnotes.db"

[knowledge.chunking]
max_size = 1024
overlap = 100

[knowledge.search]
similarity_threshold = 0.5
rrf_k = 60
# lexical_limit = 50
unicode_weight = 1.0
porter_weight = 1.0
trigram_weight = 1.0
semantic_weight = 1.0

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Model identifiers used for inference calls
    #[serde(default)]
    pub models: ModelSettings,

    /// Inference server configuration
    #[serde(default)]
    pub inference: InferenceSettings,

    /// Chunking, storage and search configuration
    #[serde(default)]
    pub knowledge: KnowledgeToolsSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Model identifiers, addressable by their settings key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSettings {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_chat_model")]
    pub completion_model: String,
}

impl ModelSettings {
    pub const EMBEDDING_MODEL: &'static str = "embedding_model";
    pub const CHAT_MODEL: &'static str = "chat_model";
    pub const COMPLETION_MODEL: &'static str = "completion_model";

    /// Look up a model identifier by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            Self::EMBEDDING_MODEL => Some(&self.embedding_model),
            Self::CHAT_MODEL => Some(&self.chat_model),
            Self::COMPLETION_MODEL => Some(&self.completion_model),
            _ => None,
        }
    }

    /// Set a model identifier by key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        let slot = match key {
            Self::EMBEDDING_MODEL => &mut self.embedding_model,
            Self::CHAT_MODEL => &mut self.chat_model,
            Self::COMPLETION_MODEL => &mut self.completion_model,
            other => {
                return Err(SettingsError::Invalid(format!(
                    "unknown model setting '{other}'"
                )));
            }
        };
        *slot = value.into();
        Ok(())
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            completion_model: default_chat_model(),
        }
    }
}

/// Inference server settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InferenceSettings {
    /// Base URL of the Ollama-compatible server
    pub base_url: Option<String>,

    /// Per-request timeout; unset means requests wait indefinitely
    pub timeout_seconds: Option<u64>,

    /// Chunk embedding requests kept in flight per save
    pub embedding_concurrency: Option<usize>,

    /// Expected embedding dimension (if known)
    pub embedding_dim: Option<usize>,
}

/// Knowledge configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeToolsSettings {
    /// Optional override for the notes database path
    pub db_path: Option<String>,

    /// Chunking parameters
    #[serde(default)]
    pub chunking: ChunkingSettings,

    /// Search defaults
    #[serde(default)]
    pub search: KnowledgeSearchSettings,
}

/// Chunking parameters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChunkingSettings {
    pub max_size: Option<usize>,
    pub overlap: Option<usize>,
}

/// Knowledge search defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeSearchSettings {
    pub similarity_threshold: Option<f32>,
    pub rrf_k: Option<usize>,
    pub lexical_limit: Option<usize>,
    pub unicode_weight: Option<f32>,
    pub porter_weight: Option<f32>,
    pub trigram_weight: Option<f32>,
    pub semantic_weight: Option<f32>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load settings from a specific file path, creating it when missing.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!("Creating default configuration at {:?}", path);
            Self::create_default_config(path)?;
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/orbital/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("ORBITAL_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("orbital");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;

        Ok(())
    }

    /// Save settings to the default configuration file path.
    pub fn save(&self) -> Result<(), SettingsError> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.models.embedding_model, "nomic-embed-text");
        assert_eq!(settings.models.chat_model, "llama3.2");
        assert!(settings.inference.base_url.is_none());
        assert!(settings.knowledge.chunking.max_size.is_none());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_default_config_toml_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();

        assert_eq!(
            settings.inference.base_url.as_deref(),
            Some("http://127.0.0.1:11434")
        );
        assert_eq!(settings.inference.embedding_concurrency, Some(1));
        assert_eq!(settings.knowledge.chunking.max_size, Some(1024));
        assert_eq!(settings.knowledge.chunking.overlap, Some(100));
        assert_eq!(settings.knowledge.search.similarity_threshold, Some(0.5));
        assert_eq!(settings.knowledge.search.rrf_k, Some(60));
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[models]
embedding_model = "mxbai-embed-large"

[knowledge.chunking]
max_size = 512
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.models.embedding_model, "mxbai-embed-large");
        assert_eq!(settings.models.chat_model, "llama3.2");
        assert_eq!(settings.knowledge.chunking.max_size, Some(512));
        assert!(settings.knowledge.chunking.overlap.is_none());
    }

    #[test]
    fn test_model_settings_by_key() {
        let mut models = ModelSettings::default();
        assert_eq!(models.get("embedding_model"), Some("nomic-embed-text"));
        assert_eq!(models.get("nope"), None);

        models.set("completion_model", "qwen2.5-coder").unwrap();
        assert_eq!(models.get("completion_model"), Some("qwen2.5-coder"));
        assert!(models.set("nope", "x").is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let settings = Settings::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.knowledge.chunking.max_size, Some(1024));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut settings = Settings::default();
        settings.models.chat_model = "mistral".to_string();
        settings.knowledge.search.rrf_k = Some(20);
        settings.save_to_path(&path).unwrap();

        let reloaded = Settings::load_from_path(&path).unwrap();
        assert_eq!(reloaded.models.chat_model, "mistral");
        assert_eq!(reloaded.knowledge.search.rrf_k, Some(20));
    }
}
