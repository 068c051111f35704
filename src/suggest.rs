//! Random query-image suggestions.
//!
//! Backs `GET /suggest-images` and the `suggest` CLI command: the catalog's
//! curated query images, sampled down to a fixed count so callers get a
//! fresh set of starting points on every request.

use crate::error::SearchResult;
use crate::providers::SpotCatalog;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Samples up to `count` ids without repetition.
///
/// A pool no larger than `count` comes back whole, in catalog order; a
/// larger pool yields a uniform random subset.
pub fn sample_ids<R: Rng + ?Sized>(ids: &[String], count: usize, rng: &mut R) -> Vec<String> {
    if ids.len() <= count {
        return ids.to_vec();
    }
    ids.choose_multiple(rng, count).cloned().collect()
}

/// Fetches the curated query-image pool and samples it with thread-local
/// randomness.
pub async fn suggest_query_images(
    catalog: &dyn SpotCatalog,
    count: usize,
) -> SearchResult<Vec<String>> {
    let pool = catalog.query_image_ids().await?;
    let picked = sample_ids(&pool, count, &mut rand::thread_rng());
    debug!(
        pool = pool.len(),
        picked = picked.len(),
        "query_image_suggestions"
    );
    Ok(picked)
}
