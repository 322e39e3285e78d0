//! Directed note-to-note links.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;

pub struct LinkRepository;

impl LinkRepository {
    /// Replace all outgoing links of `source_id`. Duplicate targets collapse.
    pub async fn replace_for_note(
        conn: &mut SqliteConnection,
        source_id: i64,
        target_ids: &[i64],
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM note_links WHERE source_id = ?")
            .bind(source_id)
            .execute(&mut *conn)
            .await?;

        for target_id in target_ids {
            sqlx::query("INSERT OR IGNORE INTO note_links (source_id, target_id) VALUES (?, ?)")
                .bind(source_id)
                .bind(target_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Notes this note links to, as `(id, title)`.
    pub async fn list_out(pool: &SqlitePool, note_id: i64) -> DbResult<Vec<(i64, String)>> {
        let rows = sqlx::query_as(
            "SELECT n.id, n.title
             FROM note_links l
             JOIN notes n ON n.id = l.target_id
             WHERE l.source_id = ?
             ORDER BY n.id ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Notes linking to this note, as `(id, title)`.
    pub async fn list_in(pool: &SqlitePool, note_id: i64) -> DbResult<Vec<(i64, String)>> {
        let rows = sqlx::query_as(
            "SELECT n.id, n.title
             FROM note_links l
             JOIN notes n ON n.id = l.source_id
             WHERE l.target_id = ?
             ORDER BY n.id ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
