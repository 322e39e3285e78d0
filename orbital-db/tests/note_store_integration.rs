use orbital_db::{
    ChunkRepository, DbError, FtsTokenizer, LinkRepository, NoteRepository, NoteStore,
    TagRepository, lexical_search,
};

async fn open_temp_store() -> (tempfile::TempDir, NoteStore) {
    let temp = tempfile::TempDir::new().unwrap();
    let store = NoteStore::open(&temp.path().join("notes.db")).await.unwrap();
    (temp, store)
}

async fn table_count(store: &NoteStore, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn delete_cascades_index_rows_and_collects_tags() {
    let (_temp, store) = open_temp_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let roadmap = NoteRepository::create(&mut conn, "Roadmap", "Q3 goals").await.unwrap();
    let meeting = NoteRepository::create(&mut conn, "Meeting", "with @alice")
        .await
        .unwrap();

    let chunk_id = ChunkRepository::insert_chunk(&mut conn, meeting, 0, "with @alice")
        .await
        .unwrap();
    ChunkRepository::insert_embedding(&mut conn, chunk_id, meeting, &[1.0, 0.0], "test")
        .await
        .unwrap();
    ChunkRepository::replace_summary_embedding(&mut conn, meeting, Some(&[0.0, 1.0]), "test")
        .await
        .unwrap();
    TagRepository::replace_for_note(&mut conn, meeting, &["alice".to_string()])
        .await
        .unwrap();
    TagRepository::replace_for_note(&mut conn, roadmap, &["planning".to_string()])
        .await
        .unwrap();
    LinkRepository::replace_for_note(&mut conn, meeting, &[roadmap])
        .await
        .unwrap();
    LinkRepository::replace_for_note(&mut conn, roadmap, &[meeting])
        .await
        .unwrap();
    drop(conn);

    assert_eq!(
        LinkRepository::list_in(store.pool(), roadmap).await.unwrap(),
        vec![(meeting, "Meeting".to_string())]
    );

    let mut conn = store.pool().acquire().await.unwrap();
    assert!(NoteRepository::delete(&mut conn, meeting).await.unwrap());
    drop(conn);

    assert_eq!(table_count(&store, "chunks").await, 0);
    assert_eq!(table_count(&store, "chunk_embeddings").await, 0);
    assert_eq!(table_count(&store, "summary_embeddings").await, 0);
    assert_eq!(table_count(&store, "note_links").await, 0);

    let tags = TagRepository::list_all_with_counts(store.pool()).await.unwrap();
    assert_eq!(tags, vec![("planning".to_string(), 1)]);
}

#[tokio::test]
async fn fts_indexes_follow_note_mutations() {
    let (_temp, store) = open_temp_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let id = NoteRepository::create(&mut conn, "Run log", "Running the Roadmap review")
        .await
        .unwrap();
    drop(conn);

    let unicode = lexical_search(store.pool(), FtsTokenizer::Unicode, "roadmap", None)
        .await
        .unwrap();
    assert_eq!(unicode.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![id]);

    let stemmed = lexical_search(store.pool(), FtsTokenizer::Porter, "runs", None)
        .await
        .unwrap();
    assert_eq!(stemmed.len(), 1);
    let unstemmed = lexical_search(store.pool(), FtsTokenizer::Unicode, "runs", None)
        .await
        .unwrap();
    assert!(unstemmed.is_empty());

    let substring = lexical_search(store.pool(), FtsTokenizer::Trigram, "oadma", None)
        .await
        .unwrap();
    assert_eq!(substring.len(), 1);

    let mut conn = store.pool().acquire().await.unwrap();
    NoteRepository::update_fields(&mut conn, id, "Run log", "Budget draft")
        .await
        .unwrap();
    drop(conn);

    for tokenizer in FtsTokenizer::ALL {
        let stale = lexical_search(store.pool(), tokenizer, "roadmap", None)
            .await
            .unwrap();
        assert!(stale.is_empty(), "{tokenizer} still matches old content");
        let fresh = lexical_search(store.pool(), tokenizer, "budget", None)
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1, "{tokenizer} misses new content");
    }

    let mut conn = store.pool().acquire().await.unwrap();
    NoteRepository::delete(&mut conn, id).await.unwrap();
    drop(conn);

    for tokenizer in FtsTokenizer::ALL {
        let gone = lexical_search(store.pool(), tokenizer, "budget", None)
            .await
            .unwrap();
        assert!(gone.is_empty(), "{tokenizer} still matches deleted note");
    }
}

#[tokio::test]
async fn lexical_search_tolerates_operator_syntax() {
    let (_temp, store) = open_temp_store().await;
    let mut conn = store.pool().acquire().await.unwrap();
    NoteRepository::create(&mut conn, "Ops", "alpha beta").await.unwrap();
    drop(conn);

    for query in ["alpha AND", "\"unterminated", "NEAR(", "xyz-nonexistent-token", "   "] {
        for tokenizer in FtsTokenizer::ALL {
            lexical_search(store.pool(), tokenizer, query, Some(10))
                .await
                .unwrap();
        }
    }
}

#[tokio::test]
async fn malformed_vectors_are_reported_per_row() {
    let (_temp, store) = open_temp_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let note = NoteRepository::create(&mut conn, "Vectors", "a b").await.unwrap();
    let good = ChunkRepository::insert_chunk(&mut conn, note, 0, "a").await.unwrap();
    let bad = ChunkRepository::insert_chunk(&mut conn, note, 1, "b").await.unwrap();
    ChunkRepository::insert_embedding(&mut conn, good, note, &[0.5, 0.5, 0.5], "test")
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO chunk_embeddings (chunk_id, note_id, embedding, embedding_dim, embedding_model)
         VALUES (?, ?, ?, 2, 'test')",
    )
    .bind(bad)
    .bind(note)
    .bind(vec![1u8, 2, 3, 4, 5, 6, 7])
    .execute(&mut *conn)
    .await
    .unwrap();
    drop(conn);

    let vectors = ChunkRepository::load_chunk_vectors(store.pool()).await.unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].chunk_id, good);
    assert_eq!(vectors[0].vector.as_ref().unwrap(), &vec![0.5, 0.5, 0.5]);
    assert_eq!(vectors[1].chunk_id, bad);
    assert!(matches!(
        vectors[1].vector,
        Err(DbError::MalformedEmbedding(_))
    ));

    assert_eq!(
        ChunkRepository::count_embeddings_for_note(store.pool(), note)
            .await
            .unwrap(),
        2
    );
}
