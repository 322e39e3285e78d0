//! Cosine scoring and threshold ranking over dense vectors.

use std::collections::HashSet;

/// Cosine similarity of two vectors.
///
/// Returns `None` when the dimensions differ. A zero-norm vector scores 0.0
/// against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        Some(dot / (norm_a * norm_b))
    } else {
        Some(0.0)
    }
}

/// Score every `(note_id, vector)` candidate against `query`, keep scores at
/// or above `threshold`, sort best first and keep each note's best score
/// only. Candidates of a different dimension are skipped.
pub fn rank_by_similarity<I, V>(query: &[f32], candidates: I, threshold: f32) -> Vec<(i64, f32)>
where
    I: IntoIterator<Item = (i64, V)>,
    V: AsRef<[f32]>,
{
    let mut scored: Vec<(i64, f32)> = candidates
        .into_iter()
        .filter_map(|(note_id, vector)| {
            cosine_similarity(query, vector.as_ref()).map(|score| (note_id, score))
        })
        .filter(|(_, score)| *score >= threshold)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut seen = HashSet::new();
    scored.retain(|(note_id, _)| seen.insert(*note_id));
    scored
}
