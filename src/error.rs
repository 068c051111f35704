//! Crate-wide error type.

use crate::model::Modality;

/// Unified error type covering every failure mode of the search pipeline.
///
/// Variant messages are written to be actionable for the caller. Dependency
/// failures (embedding, generation, catalog retrieval) stay distinguishable
/// from a legitimate empty result set: callers must be able to tell "no
/// matches" from "the pipeline could not run".
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Both query modalities were absent when the pipeline was invoked.
    #[error("empty query: supply text, an image, or both")]
    EmptyQuery,

    /// The range parameter was outside [0, 100].
    #[error("invalid search range {value}: expected an integer between 0 and 100")]
    InvalidRange { value: i64 },

    /// The text-from-image generator failed or produced nothing usable.
    #[error(
        "text generation failed: {reason}. The request needed a caption for its image because no text was supplied."
    )]
    TextGenerationFailed { reason: String },

    /// The image-from-text generator failed or produced nothing usable.
    #[error(
        "image generation failed: {reason}. The request needed a synthesized image because none was supplied."
    )]
    ImageGenerationFailed { reason: String },

    /// Embedding inference failed for one modality.
    #[error("{modality} embedding failed: {source}")]
    EmbeddingFailed {
        modality: Modality,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The catalog or feature store could not be read.
    #[error("catalog unavailable: {detail}")]
    CatalogUnavailable {
        detail: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored feature vector violates the table's shape constraints.
    #[error("invalid {modality} feature data for id {id}: {detail}")]
    FeatureDataInvalid {
        modality: Modality,
        id: String,
        detail: String,
    },

    /// Query embedding dimension differs from the stored vectors.
    ///
    /// Indicates provider drift: the query was embedded with a different
    /// model than the one that produced the feature store.
    #[error(
        "incompatible embedding dimensions: feature store has {expected}-dim vectors, query has {found}-dim. Re-extract features with the matching model."
    )]
    DimensionMismatch { expected: usize, found: usize },

    /// A configuration value could not be used.
    #[error("invalid config {field}=\"{value}\": {reason}")]
    InvalidConfig {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Wraps `std::io::Error` for local file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// True for failures of an external collaborator (generator, embedder,
    /// catalog/feature store). These map to 502 at the HTTP boundary.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            SearchError::TextGenerationFailed { .. }
                | SearchError::ImageGenerationFailed { .. }
                | SearchError::EmbeddingFailed { .. }
                | SearchError::CatalogUnavailable { .. }
        )
    }

    /// True for caller mistakes (bad input, bad range). These map to 400.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SearchError::EmptyQuery | SearchError::InvalidRange { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type SearchResult<T> = Result<T, SearchError>;
