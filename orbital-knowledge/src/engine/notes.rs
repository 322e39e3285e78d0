use orbital_db::{ChunkRecord, ChunkRepository, Note, NoteRepository, TagRepository};

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::graph::load_note_graph;
use crate::models::NoteGraph;

use super::NoteEngine;

pub(crate) async fn create_note(engine: &NoteEngine) -> KnowledgeResult<i64> {
    let mut conn = engine.pool().acquire().await?;
    Ok(NoteRepository::create(&mut conn, "", "").await?)
}

pub(crate) async fn get_note(engine: &NoteEngine, note_id: i64) -> KnowledgeResult<Option<Note>> {
    Ok(NoteRepository::get(engine.pool(), note_id).await?)
}

pub(crate) async fn list_note_ids(engine: &NoteEngine) -> KnowledgeResult<Vec<i64>> {
    Ok(NoteRepository::list_ids(engine.pool()).await?)
}

pub(crate) async fn list_notes(engine: &NoteEngine) -> KnowledgeResult<Vec<Note>> {
    Ok(NoteRepository::list(engine.pool()).await?)
}

pub(crate) async fn delete_note(engine: &NoteEngine, note_id: i64) -> KnowledgeResult<bool> {
    let guard = engine.writer().lock(note_id).await;

    let mut tx = engine.pool().begin().await?;
    let deleted = NoteRepository::delete(&mut tx, note_id).await?;
    tx.commit().await?;

    drop(guard);
    engine.writer().forget(note_id);
    Ok(deleted)
}

pub(crate) async fn chunks(engine: &NoteEngine, note_id: i64) -> KnowledgeResult<Vec<ChunkRecord>> {
    Ok(ChunkRepository::list_for_note(engine.pool(), note_id).await?)
}

pub(crate) async fn note_graph(engine: &NoteEngine, note_id: i64) -> KnowledgeResult<NoteGraph> {
    if !NoteRepository::exists(engine.pool(), note_id).await? {
        return Err(KnowledgeError::UnknownNote(note_id));
    }
    load_note_graph(engine.pool(), note_id).await
}

pub(crate) async fn all_tags(engine: &NoteEngine) -> KnowledgeResult<Vec<(String, i64)>> {
    Ok(TagRepository::list_all_with_counts(engine.pool()).await?)
}
