//! Core entity structs and value objects.
//!
//! Everything here is created at the start of one search request and dropped
//! at the end; no cross-request state lives in these types.

use crate::error::{SearchError, SearchResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Default `search_range` when the caller does not supply one.
pub const DEFAULT_SEARCH_RANGE: u8 = 50;

/// One of the two input channels contributing an independent similarity
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pipeline shape a given range selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    TextOnly,
    ImageOnly,
    Hybrid,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchStrategy::TextOnly => "text_only",
            SearchStrategy::ImageOnly => "image_only",
            SearchStrategy::Hybrid => "hybrid",
        })
    }
}

/// Where a modality's input came from: supplied by the caller, or produced
/// by a fallback generator because the caller left it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    Caller,
    Generated,
}

/// Validated range parameter in `[0, 100]` steering the text/image mix.
///
/// `0` runs text-only, `100` runs image-only, anything between runs the
/// hybrid pipeline with `text_weight = range / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SearchRange(u8);

impl SearchRange {
    pub fn new(value: i64) -> SearchResult<Self> {
        if !(0..=100).contains(&value) {
            return Err(SearchError::InvalidRange { value });
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn text_weight(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn image_weight(self) -> f32 {
        1.0 - self.text_weight()
    }

    pub fn weights(self) -> ModalityWeights {
        ModalityWeights::from_text_weight(self.text_weight())
    }

    pub fn strategy(self) -> SearchStrategy {
        match self.0 {
            0 => SearchStrategy::TextOnly,
            100 => SearchStrategy::ImageOnly,
            _ => SearchStrategy::Hybrid,
        }
    }
}

impl Default for SearchRange {
    fn default() -> Self {
        Self(DEFAULT_SEARCH_RANGE)
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pair of fusion weights, kept summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModalityWeights {
    pub text: f32,
    pub image: f32,
}

impl ModalityWeights {
    /// Builds a weight pair from the text share. Non-finite input falls back
    /// to an even split; out-of-range input is clamped into `[0, 1]`.
    pub fn from_text_weight(text: f32) -> Self {
        let text = if text.is_finite() {
            text.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self {
            text,
            image: 1.0 - text,
        }
    }
}

/// Raw image bytes crossing the provider boundary.
///
/// Cheap to clone; providers receive a borrowed view of the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Bytes,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for ImagePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImagePayload({} bytes)", self.bytes.len())
    }
}

/// One search request. At least one modality is expected to be present;
/// [`SearchQuery::new`] normalizes empty inputs to `None` so the pipeline
/// only ever sees a modality as present or absent, never as an empty shell.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub image: Option<ImagePayload>,
    pub range: SearchRange,
}

impl SearchQuery {
    pub fn new(text: Option<String>, image: Option<ImagePayload>, range: SearchRange) -> Self {
        Self {
            text: text.filter(|t| !t.is_empty()),
            image: image.filter(|i| !i.is_empty()),
            range,
        }
    }

    /// A caption must be generated when text is missing and the strategy
    /// consumes text (every range except pure image search).
    pub fn needs_caption(&self) -> bool {
        self.range.value() < 100 && self.text.is_none()
    }

    /// An image must be synthesized when the image is missing and the
    /// strategy consumes image similarity (every range except pure text
    /// search).
    pub fn needs_synthesis(&self) -> bool {
        self.range.value() > 0 && self.image.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

/// One catalog entry ("spot"). Unknown provider fields ride along in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Fixed-length embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Read-only `id → vector` lookup for one modality.
///
/// Vector shape is validated once when the table is built; the ranker can
/// then trust every stored vector to share [`FeatureTable::dimension`].
#[derive(Debug, Clone)]
pub struct FeatureTable {
    modality: Modality,
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FeatureTable {
    pub fn from_vectors(
        modality: Modality,
        vectors: HashMap<String, Vec<f32>>,
    ) -> SearchResult<Self> {
        // Validate in sorted id order so a shape complaint is deterministic.
        let mut ids: Vec<&String> = vectors.keys().collect();
        ids.sort();

        let mut dimension = 0;
        for id in ids {
            let len = vectors[id].len();
            if len == 0 {
                return Err(SearchError::FeatureDataInvalid {
                    modality,
                    id: id.clone(),
                    detail: "empty vector".into(),
                });
            }
            if dimension == 0 {
                dimension = len;
            } else if len != dimension {
                return Err(SearchError::FeatureDataInvalid {
                    modality,
                    id: id.clone(),
                    detail: format!("expected {dimension} dims, found {len}"),
                });
            }
        }

        Ok(Self {
            modality,
            dimension,
            vectors,
        })
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Shared dimension of every stored vector; `0` for an empty table.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }
}

/// Ranker output for one candidate in one modality.
///
/// `name`/`location` are denormalized from the catalog entry the ranker
/// scored, so downstream stages never have to re-fetch the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSpot {
    pub id: String,
    pub similarity: f32,
    pub name: Option<String>,
    pub location: Option<String>,
}

/// Final per-spot result after fusion (or after a single-modality pass,
/// with the unused similarity reported as 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSpot {
    pub id: String,
    pub name: String,
    pub location: String,
    pub text_similarity: f32,
    pub image_similarity: f32,
    pub integrated_score: f32,
}
