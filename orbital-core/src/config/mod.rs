//! Configuration management for orbital.
//!
//! Settings live in a TOML file at `~/.config/orbital/config.toml`
//! (or `$ORBITAL_CONFIG_DIR/config.toml`):
//!
//! ```toml
//! [models]
//! embedding_model = "nomic-embed-text"
//! chat_model = "llama3.2"
//! completion_model = "llama3.2"
//!
//! [inference]
//! base_url = "http://127.0.0.1:11434"
//!
//! [knowledge.chunking]
//! max_size = 1024
//! overlap = 100
//!
//! [logging]
//! level = "info"
//! ```
//!
//! The knowledge engine consumes the resolved [`KnowledgeSettings`], which
//! fills every optional TOML value with its default.

pub mod knowledge;
mod settings;

pub use knowledge::{ChunkingDefaults, KnowledgeSettings, SearchDefaults};
pub use settings::{
    ChunkingSettings, InferenceSettings, KnowledgeSearchSettings, KnowledgeToolsSettings,
    LoggingSettings, ModelSettings, Settings, SettingsError,
};

/// Loaded configuration: the raw TOML settings plus the resolved knowledge
/// settings derived from them.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub knowledge: KnowledgeSettings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from `.env` and the TOML settings file.
    ///
    /// The settings file is created with defaults when missing. The resolved
    /// knowledge settings are validated before being returned.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let settings = Settings::load()?;
        Self::from_settings(settings)
    }

    /// Build a configuration from already-parsed settings.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let knowledge = KnowledgeSettings::from(&settings);
        knowledge.validate()?;
        Ok(Self {
            settings,
            knowledge,
        })
    }

    /// Log level filter string for the tracing subscriber.
    pub fn log_level(&self) -> &str {
        &self.settings.logging.level
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_resolves_defaults() {
        let config = Config::from_settings(Settings::default()).unwrap();
        assert_eq!(config.knowledge.chunking.max_size, 1024);
        assert_eq!(config.knowledge.chunking.overlap, 100);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn from_settings_rejects_overlap_not_below_max_size() {
        let mut settings = Settings::default();
        settings.knowledge.chunking.max_size = Some(100);
        settings.knowledge.chunking.overlap = Some(100);

        let err = Config::from_settings(settings).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }
}
