//! Provider contracts for the pipeline's external collaborators.
//!
//! The core never talks to a model or a data store directly; it goes
//! through these traits, constructed once at startup and handed to the
//! orchestrator as `Arc<dyn Trait>` handles:
//!
//! - **[`TextEmbedder`]** / **[`ImageEmbedder`]**: query text/bytes into a
//!   fixed-length vector.
//! - **[`CaptionGenerator`]** / **[`ImageGenerator`]**: fallback producers
//!   filling in a missing modality.
//! - **[`SpotCatalog`]**: the candidate list, the per-modality feature
//!   store, and the curated query-image ids.
//!
//! Implementations: [`gateway`] (remote inference service over HTTP),
//! [`offline`] (deterministic hash embedders for dev and tests),
//! [`catalog_fs`] (JSON files on disk).

pub mod catalog_fs;
pub mod gateway;
pub mod offline;

use crate::error::SearchResult;
use crate::model::{Embedding, FeatureTable, ImagePayload, Modality, SpotEntry};
use async_trait::async_trait;

/// Embeds query text into the text-modality vector space.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_text(&self, text: &str) -> SearchResult<Embedding>;

    /// Stable identifier for logs.
    fn id(&self) -> &str;
}

/// Embeds a query image into the image-modality vector space.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    async fn embed_image(&self, image: &ImagePayload) -> SearchResult<Embedding>;

    /// Stable identifier for logs.
    fn id(&self) -> &str;
}

/// Produces text describing an image; invoked when a query arrives without
/// text but the selected strategy needs some.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn caption(&self, image: &ImagePayload) -> SearchResult<String>;
}

/// Synthesizes an image from text; invoked when a query arrives without an
/// image but the selected strategy needs one.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> SearchResult<ImagePayload>;
}

/// Read-only access to the spot catalog and its precomputed features.
#[async_trait]
pub trait SpotCatalog: Send + Sync {
    /// Full candidate list, in catalog order.
    async fn spots(&self) -> SearchResult<Vec<SpotEntry>>;

    /// The `id → vector` table for one modality.
    async fn feature_table(&self, modality: Modality) -> SearchResult<FeatureTable>;

    /// Curated image ids users can pick as query starting points.
    async fn query_image_ids(&self) -> SearchResult<Vec<String>>;
}
