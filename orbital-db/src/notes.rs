//! Note CRUD operations.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::tags::TagRepository;

/// Note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Note repository for database operations
pub struct NoteRepository;

impl NoteRepository {
    /// Insert a new note and return its id.
    pub async fn create(conn: &mut SqliteConnection, title: &str, content: &str) -> DbResult<i64> {
        let now = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO notes (title, content, summary, created_at, updated_at)
             VALUES (?, ?, '', ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        info!("Created note: {}", id);
        Ok(id)
    }

    /// Get note by ID
    pub async fn get(pool: &SqlitePool, id: i64) -> DbResult<Option<Note>> {
        let row = sqlx::query_as::<_, NoteRow>(
            "SELECT id, title, content, summary, created_at, updated_at
             FROM notes
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Note::from))
    }

    /// Whether a note with this id exists.
    pub async fn exists(pool: &SqlitePool, id: i64) -> DbResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// All note ids, oldest first.
    pub async fn list_ids(pool: &SqlitePool) -> DbResult<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM notes ORDER BY id ASC")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// All notes, oldest first.
    pub async fn list(pool: &SqlitePool) -> DbResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, title, content, summary, created_at, updated_at
             FROM notes
             ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    /// Resolve a title to a note id by exact match. When several notes share
    /// a title the oldest one wins.
    pub async fn find_id_by_title(
        conn: &mut SqliteConnection,
        title: &str,
    ) -> DbResult<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM notes WHERE title = ? ORDER BY id ASC LIMIT 1")
                .bind(title)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Overwrite the editable fields of a note and bump `updated_at`.
    pub async fn update_fields(
        conn: &mut SqliteConnection,
        id: i64,
        title: &str,
        content: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notes SET title = ?, content = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title)
        .bind(content)
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NoteNotFound(id));
        }
        Ok(())
    }

    /// Store the derived summary text for a note.
    pub async fn set_summary(conn: &mut SqliteConnection, id: i64, summary: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE notes SET summary = ? WHERE id = ?")
            .bind(summary)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NoteNotFound(id));
        }
        Ok(())
    }

    /// Delete a note. Chunks, embeddings, tag associations and links go with
    /// it through foreign-key cascades; tags left without notes are removed.
    ///
    /// Returns `false` when no such note existed.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let removed = TagRepository::delete_orphans(conn).await?;
        info!("Deleted note: {} ({} orphaned tags removed)", id, removed);
        Ok(true)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    summary: String,
    created_at: i64,
    updated_at: i64,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            title: row.title,
            content: row.content,
            summary: row.summary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
