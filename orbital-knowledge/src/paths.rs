use std::path::PathBuf;

use orbital_db::{DB_FILE_NAME, NoteStore};

use crate::KnowledgeSettings;
use crate::errors::KnowledgeResult;

/// Location of the notes database: explicit override, then the data root
/// override, then `$ORBITAL_DATA_DIR` / the platform data directory.
pub fn notes_db_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.db_path_override {
        return Ok(path.clone());
    }
    if let Some(root) = &settings.data_root_override {
        return Ok(root.join(DB_FILE_NAME));
    }
    Ok(NoteStore::default_db_path()?)
}
