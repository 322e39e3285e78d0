//! Tag rows and note-tag associations.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

pub struct TagRepository;

impl TagRepository {
    /// Replace the tag set of a note: drop all associations, then
    /// find-or-create each tag by name and associate it.
    pub async fn replace_for_note(
        conn: &mut SqliteConnection,
        note_id: i64,
        names: &[String],
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *conn)
            .await?;

        for name in names {
            sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
                .bind(name)
                .execute(&mut *conn)
                .await?;
            let (tag_id,): (i64,) = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *conn)
                .await?;
            sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
                .bind(note_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Tag names attached to a note, alphabetical.
    pub async fn list_for_note(pool: &SqlitePool, note_id: i64) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT t.name
             FROM note_tags nt
             JOIN tags t ON t.id = nt.tag_id
             WHERE nt.note_id = ?
             ORDER BY t.name ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Every tag with the number of notes carrying it.
    pub async fn list_all_with_counts(pool: &SqlitePool) -> DbResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT t.name, COUNT(nt.note_id)
             FROM tags t
             LEFT JOIN note_tags nt ON nt.tag_id = t.id
             GROUP BY t.id
             ORDER BY t.name ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Remove tags no note refers to any more.
    pub async fn delete_orphans(conn: &mut SqliteConnection) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM note_tags)",
        )
        .execute(&mut *conn)
        .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            debug!("Removed {} orphaned tags", removed);
        }
        Ok(removed)
    }
}
