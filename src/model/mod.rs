//! Request-scoped data model shared across the pipeline.

pub mod types;

pub use types::{
    DEFAULT_SEARCH_RANGE, Embedding, FeatureTable, FusedSpot, ImagePayload, InputOrigin, Modality,
    ModalityWeights, ScoredSpot, SearchQuery, SearchRange, SearchStrategy, SpotEntry,
};
