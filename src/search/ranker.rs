//! Cosine-similarity ranking of candidates against one modality's features.

use crate::error::{SearchError, SearchResult};
use crate::model::{Embedding, FeatureTable, ScoredSpot, SpotEntry};
use tracing::{debug, trace};

/// Cosine similarity between two vectors: `dot(a,b) / (‖a‖·‖b‖)`.
///
/// Returns `0.0` when either vector has zero norm or the lengths differ,
/// never an error; callers that care about length drift check it up front.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Scores every candidate with a stored feature vector and sorts the result
/// by similarity descending.
///
/// Candidates without a feature vector are skipped: gaps in the feature
/// store are expected and must not zero-score or fail the request. A
/// dimension mismatch between the query and the table is a hard error
/// (provider drift). Ties keep candidate iteration order, so output is
/// deterministic for a fixed input.
pub fn rank_by_similarity(
    candidates: &[SpotEntry],
    query: &Embedding,
    features: &FeatureTable,
) -> SearchResult<Vec<ScoredSpot>> {
    if candidates.is_empty() || features.is_empty() {
        return Ok(Vec::new());
    }
    if features.dimension() != query.dim() {
        return Err(SearchError::DimensionMismatch {
            expected: features.dimension(),
            found: query.dim(),
        });
    }

    let mut scored = Vec::with_capacity(candidates.len());
    let mut skipped = 0usize;
    for entry in candidates {
        let Some(vector) = features.get(&entry.id) else {
            skipped += 1;
            trace!(id = %entry.id, modality = %features.modality(), "feature_vector_missing");
            continue;
        };
        scored.push(ScoredSpot {
            id: entry.id.clone(),
            similarity: cosine_similarity(query.as_slice(), vector),
            name: Some(entry.name.clone()),
            location: Some(entry.location.clone()),
        });
    }

    // Stable sort keeps catalog order for equal similarities.
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    debug!(
        modality = %features.modality(),
        scored = scored.len(),
        skipped,
        "similarity_ranking_complete"
    );
    Ok(scored)
}
