//! Location-based candidate narrowing.
//!
//! Retains catalog entries whose `location` contains any extracted keyword.
//! When nothing matches, the full catalog is returned instead of an empty
//! set, so ranking always has candidates even when the query text carries
//! no usable location hint.

use crate::model::SpotEntry;
use crate::search::keywords::MIN_KEYWORD_CHARS;
use tracing::debug;

/// Filters the catalog down to entries matching at least one keyword.
///
/// Matching is case-sensitive exact substring against `location`; keywords
/// shorter than [`MIN_KEYWORD_CHARS`] never match (the built-in extractor
/// already drops them, but injected extractors may not). An empty match set
/// falls back to the full catalog.
pub fn filter_by_location(keywords: &[String], catalog: &[SpotEntry]) -> Vec<SpotEntry> {
    if catalog.is_empty() {
        return Vec::new();
    }

    let filtered: Vec<SpotEntry> = catalog
        .iter()
        .filter(|entry| {
            keywords.iter().any(|keyword| {
                keyword.chars().count() >= MIN_KEYWORD_CHARS
                    && entry.location.contains(keyword.as_str())
            })
        })
        .cloned()
        .collect();

    if filtered.is_empty() {
        debug!(
            keywords = keywords.len(),
            catalog = catalog.len(),
            "location_filter_no_match_returning_full_catalog"
        );
        return catalog.to_vec();
    }

    debug!(
        keywords = keywords.len(),
        kept = filtered.len(),
        catalog = catalog.len(),
        "location_filter_applied"
    );
    filtered
}
