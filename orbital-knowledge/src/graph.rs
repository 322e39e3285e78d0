use orbital_db::{LinkRepository, TagRepository};
use sqlx::SqlitePool;

use crate::errors::KnowledgeResult;
use crate::models::{NoteGraph, NoteRef};

pub async fn load_note_graph(pool: &SqlitePool, note_id: i64) -> KnowledgeResult<NoteGraph> {
    let tags = TagRepository::list_for_note(pool, note_id).await?;
    let links_out = to_refs(LinkRepository::list_out(pool, note_id).await?);
    let backlinks = to_refs(LinkRepository::list_in(pool, note_id).await?);

    Ok(NoteGraph {
        note_id,
        tags,
        links_out,
        backlinks,
    })
}

fn to_refs(rows: Vec<(i64, String)>) -> Vec<NoteRef> {
    rows.into_iter()
        .map(|(id, title)| NoteRef { id, title })
        .collect()
}
