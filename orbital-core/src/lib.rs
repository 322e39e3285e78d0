pub mod config;

pub use config::{
    ChunkingDefaults, Config, ConfigError, KnowledgeSettings, ModelSettings, SearchDefaults,
    Settings, SettingsError, load_dotenv,
};
