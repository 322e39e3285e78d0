//! Hybrid search: three lexical strategies plus one semantic strategy.

use std::collections::{HashMap, HashSet};

use orbital_core::SearchDefaults;
use orbital_db::{ChunkRepository, lexical_search};
use sqlx::SqlitePool;
use tracing::debug;

use crate::embeddings::Embedder;
use crate::errors::KnowledgeResult;
use crate::models::{SearchHit, Strategy};
use crate::similarity::rank_by_similarity;

/// Note ids whose best chunk scores at least `threshold` against the query,
/// best first, one entry per note.
pub async fn similarity_search(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    query: &str,
    threshold: f32,
) -> KnowledgeResult<Vec<(i64, f32)>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed(query).await?;
    let stored = ChunkRepository::load_chunk_vectors(pool).await?;

    let candidates = stored.into_iter().filter_map(|row| match row.vector {
        Ok(vector) => Some((row.note_id, vector)),
        Err(err) => {
            debug!("Skipping chunk {}: {}", row.chunk_id, err);
            None
        }
    });

    let ranked = rank_by_similarity(&query_vector, candidates, threshold);
    debug!("semantic strategy matched {} notes", ranked.len());
    Ok(ranked)
}

/// Per-strategy note id lists in strategy order, each ranked best first.
pub(crate) async fn strategy_results(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    query: &str,
    search: &SearchDefaults,
) -> KnowledgeResult<Vec<(Strategy, Vec<i64>)>> {
    let mut results = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let ids: Vec<i64> = match strategy.tokenizer() {
            Some(tokenizer) => lexical_search(pool, tokenizer, query, search.lexical_limit)
                .await?
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
            None => similarity_search(pool, embedder, query, search.similarity_threshold)
                .await?
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
        };
        results.push((strategy, ids));
    }
    Ok(results)
}

/// Union of all strategy results: concatenated in strategy order, first
/// occurrence kept.
pub fn union_results(results: &[(Strategy, Vec<i64>)]) -> Vec<i64> {
    let mut seen = HashSet::new();
    results
        .iter()
        .flat_map(|(_, ids)| ids.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Weighted reciprocal rank fusion: each strategy adds `weight / (k + rank)`
/// for every note it returned, with rank starting at 1. Equal scores keep
/// union order.
pub fn fuse_ranked(results: &[(Strategy, Vec<i64>)], search: &SearchDefaults) -> Vec<SearchHit> {
    let k = search.rrf_k as f32;
    let mut hits: HashMap<i64, SearchHit> = HashMap::new();

    for (strategy, ids) in results {
        let weight = strategy_weight(*strategy, search);
        for (idx, note_id) in ids.iter().enumerate() {
            let rank = (idx + 1) as f32;
            let hit = hits.entry(*note_id).or_insert_with(|| SearchHit {
                note_id: *note_id,
                score: 0.0,
                strategies: Vec::new(),
            });
            if hit.strategies.contains(strategy) {
                continue;
            }
            hit.score += weight / (k + rank);
            hit.strategies.push(*strategy);
        }
    }

    let order: HashMap<i64, usize> = union_results(results)
        .into_iter()
        .enumerate()
        .map(|(pos, id)| (id, pos))
        .collect();

    let mut fused: Vec<SearchHit> = hits.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| order[&a.note_id].cmp(&order[&b.note_id]))
    });
    fused
}

fn strategy_weight(strategy: Strategy, search: &SearchDefaults) -> f32 {
    match strategy {
        Strategy::Unicode => search.unicode_weight,
        Strategy::Porter => search.porter_weight,
        Strategy::Trigram => search.trigram_weight,
        Strategy::Semantic => search.semantic_weight,
    }
}
