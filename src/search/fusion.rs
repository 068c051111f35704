//! Weighted fusion of the text and image rankings.
//!
//! Takes the union of ids from both per-modality lists; a modality that did
//! not score an id contributes `0.0`. Each fused entry scores
//!
//! ```text
//! integrated_score = text_similarity * w + image_similarity * (1 - w)
//! ```
//!
//! Output order is deterministic: entries are unioned in first-seen order
//! (text list, then image-only ids) and the final stable sort by
//! `integrated_score` preserves that order for ties.

use crate::model::{FusedSpot, ModalityWeights, ScoredSpot};
use std::collections::HashMap;
use tracing::debug;

/// Fixed weight pairs evaluated by [`comparison_slices`] for side-by-side
/// ratio comparisons: text-only, even split, image-only.
pub const COMPARISON_WEIGHTS: [ModalityWeights; 3] = [
    ModalityWeights {
        text: 1.0,
        image: 0.0,
    },
    ModalityWeights {
        text: 0.5,
        image: 0.5,
    },
    ModalityWeights {
        text: 0.0,
        image: 1.0,
    },
];

/// Top-N fusion computed for one fixed weight pair.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WeightedSlice {
    pub weights: ModalityWeights,
    pub spots: Vec<FusedSpot>,
}

/// Merges two per-modality rankings into one list sorted by
/// `integrated_score` descending.
///
/// `name`/`location` come from the text-side entry; an id seen only on the
/// image side keeps empty strings, and the catalog is never consulted here
/// to fill them in.
pub fn fuse_rankings(
    text: &[ScoredSpot],
    image: &[ScoredSpot],
    weights: ModalityWeights,
) -> Vec<FusedSpot> {
    let capacity = text.len() + image.len();
    let mut fused: Vec<FusedSpot> = Vec::with_capacity(capacity);
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(capacity);

    for spot in text {
        if index.contains_key(spot.id.as_str()) {
            continue;
        }
        index.insert(spot.id.as_str(), fused.len());
        fused.push(FusedSpot {
            id: spot.id.clone(),
            name: spot.name.clone().unwrap_or_default(),
            location: spot.location.clone().unwrap_or_default(),
            text_similarity: spot.similarity,
            image_similarity: 0.0,
            integrated_score: 0.0,
        });
    }

    for spot in image {
        if let Some(&at) = index.get(spot.id.as_str()) {
            fused[at].image_similarity = spot.similarity;
        } else {
            index.insert(spot.id.as_str(), fused.len());
            fused.push(FusedSpot {
                id: spot.id.clone(),
                name: String::new(),
                location: String::new(),
                text_similarity: 0.0,
                image_similarity: spot.similarity,
                integrated_score: 0.0,
            });
        }
    }

    for spot in &mut fused {
        spot.integrated_score =
            spot.text_similarity * weights.text + spot.image_similarity * weights.image;
    }

    fused.sort_by(|a, b| b.integrated_score.total_cmp(&a.integrated_score));

    debug!(
        text = text.len(),
        image = image.len(),
        fused = fused.len(),
        text_weight = weights.text,
        "rank_fusion_complete"
    );
    fused
}

/// Same fusion rule, truncated to the best `n` entries.
pub fn fuse_top_n(
    text: &[ScoredSpot],
    image: &[ScoredSpot],
    weights: ModalityWeights,
    n: usize,
) -> Vec<FusedSpot> {
    let mut fused = fuse_rankings(text, image, weights);
    fused.truncate(n);
    fused
}

/// Evaluates [`COMPARISON_WEIGHTS`] independently, yielding one top-N slice
/// per weight pair.
pub fn comparison_slices(
    text: &[ScoredSpot],
    image: &[ScoredSpot],
    n: usize,
) -> Vec<WeightedSlice> {
    COMPARISON_WEIGHTS
        .iter()
        .map(|&weights| WeightedSlice {
            weights,
            spots: fuse_top_n(text, image, weights, n),
        })
        .collect()
}
