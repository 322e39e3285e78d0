use tracing::debug;

use crate::errors::KnowledgeResult;
use crate::models::SearchHit;
use crate::search::{fuse_ranked, similarity_search, strategy_results, union_results};

use super::NoteEngine;

pub(crate) async fn search(engine: &NoteEngine, query: &str) -> KnowledgeResult<Vec<i64>> {
    let results = strategy_results(
        engine.pool(),
        engine.embedder(),
        query,
        &engine.settings().search,
    )
    .await?;
    let ids = union_results(&results);
    debug!("search {:?} returned {} notes", query, ids.len());
    Ok(ids)
}

pub(crate) async fn search_ranked(
    engine: &NoteEngine,
    query: &str,
) -> KnowledgeResult<Vec<SearchHit>> {
    let search = &engine.settings().search;
    let results = strategy_results(engine.pool(), engine.embedder(), query, search).await?;
    Ok(fuse_ranked(&results, search))
}

pub(crate) async fn similarity_scores(
    engine: &NoteEngine,
    query: &str,
) -> KnowledgeResult<Vec<(i64, f32)>> {
    similarity_search(
        engine.pool(),
        engine.embedder(),
        query,
        engine.settings().search.similarity_threshold,
    )
    .await
}
