//! Chunk rows and their embedding vectors.
//!
//! Vectors are stored as raw `f32` blobs next to their dimension and the
//! model that produced them. Decoding is done per row so a single damaged
//! blob never aborts a scan.

use futures::TryStreamExt;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use zerocopy::{FromBytes, IntoBytes};

use crate::error::{DbError, DbResult};

/// Stored chunk of a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub id: i64,
    pub note_id: i64,
    pub chunk_index: i64,
    pub content: String,
}

/// One chunk embedding as read back during a similarity scan.
#[derive(Debug)]
pub struct StoredVector {
    pub chunk_id: i64,
    pub note_id: i64,
    pub vector: DbResult<Vec<f32>>,
}

/// Chunk repository for database operations
pub struct ChunkRepository;

impl ChunkRepository {
    /// Remove every chunk of a note; their embeddings cascade.
    pub async fn delete_for_note(conn: &mut SqliteConnection, note_id: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert one chunk and return its row id.
    pub async fn insert_chunk(
        conn: &mut SqliteConnection,
        note_id: i64,
        chunk_index: i64,
        content: &str,
    ) -> DbResult<i64> {
        let result =
            sqlx::query("INSERT INTO chunks (note_id, chunk_index, content) VALUES (?, ?, ?)")
                .bind(note_id)
                .bind(chunk_index)
                .bind(content)
                .execute(&mut *conn)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_embedding(
        conn: &mut SqliteConnection,
        chunk_id: i64,
        note_id: i64,
        vector: &[f32],
        model: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO chunk_embeddings (chunk_id, note_id, embedding, embedding_dim, embedding_model)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(chunk_id)
        .bind(note_id)
        .bind(encode_vector(vector))
        .bind(vector.len() as i64)
        .bind(model)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Chunks of a note in index order.
    pub async fn list_for_note(pool: &SqlitePool, note_id: i64) -> DbResult<Vec<ChunkRecord>> {
        let rows: Vec<(i64, i64, i64, String)> = sqlx::query_as(
            "SELECT id, note_id, chunk_index, content
             FROM chunks
             WHERE note_id = ?
             ORDER BY chunk_index ASC",
        )
        .bind(note_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, note_id, chunk_index, content)| ChunkRecord {
                id,
                note_id,
                chunk_index,
                content,
            })
            .collect())
    }

    pub async fn count_embeddings_for_note(pool: &SqlitePool, note_id: i64) -> DbResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM chunk_embeddings WHERE note_id = ?")
                .bind(note_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Read every stored chunk vector.
    ///
    /// Rows are streamed from SQLite and decoded one at a time; a row whose
    /// blob does not decode carries `DbError::MalformedEmbedding` in its
    /// `vector` field instead of failing the whole call.
    pub async fn load_chunk_vectors(pool: &SqlitePool) -> DbResult<Vec<StoredVector>> {
        let mut rows = sqlx::query_as::<_, (i64, i64, Vec<u8>, i64)>(
            "SELECT chunk_id, note_id, embedding, embedding_dim
             FROM chunk_embeddings
             ORDER BY chunk_id ASC",
        )
        .fetch(pool);

        let mut vectors = Vec::new();
        while let Some((chunk_id, note_id, blob, dim)) = rows.try_next().await? {
            let vector = decode_vector(&blob, dim).map_err(|reason| {
                DbError::MalformedEmbedding(format!("chunk {chunk_id}: {reason}"))
            });
            vectors.push(StoredVector {
                chunk_id,
                note_id,
                vector,
            });
        }

        debug!("Loaded {} chunk vectors", vectors.len());
        Ok(vectors)
    }

    /// Replace the summary embedding of a note. `None` just clears it.
    pub async fn replace_summary_embedding(
        conn: &mut SqliteConnection,
        note_id: i64,
        vector: Option<&[f32]>,
        model: &str,
    ) -> DbResult<()> {
        sqlx::query("DELETE FROM summary_embeddings WHERE note_id = ?")
            .bind(note_id)
            .execute(&mut *conn)
            .await?;

        if let Some(vector) = vector {
            sqlx::query(
                "INSERT INTO summary_embeddings (note_id, embedding, embedding_dim, embedding_model)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(note_id)
            .bind(encode_vector(vector))
            .bind(vector.len() as i64)
            .bind(model)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn get_summary_embedding(
        pool: &SqlitePool,
        note_id: i64,
    ) -> DbResult<Option<Vec<f32>>> {
        let row: Option<(Vec<u8>, i64)> = sqlx::query_as(
            "SELECT embedding, embedding_dim FROM summary_embeddings WHERE note_id = ?",
        )
        .bind(note_id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some((blob, dim)) => decode_vector(&blob, dim)
                .map(Some)
                .map_err(|reason| DbError::MalformedEmbedding(format!("note {note_id}: {reason}"))),
            None => Ok(None),
        }
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.as_bytes().to_vec()
}

fn decode_vector(blob: &[u8], dim: i64) -> Result<Vec<f32>, String> {
    if blob.len() % 4 != 0 {
        return Err(format!("blob length {} is not a multiple of 4", blob.len()));
    }
    let vector: Vec<f32> = blob
        .chunks_exact(4)
        .filter_map(|bytes| f32::read_from_bytes(bytes).ok())
        .collect();
    if i64::try_from(vector.len()).ok() != Some(dim) {
        return Err(format!(
            "decoded {} values but row declares dimension {dim}",
            vector.len()
        ));
    }
    Ok(vector)
}
