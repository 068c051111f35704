//! Deterministic offline embedders.
//!
//! No network, no model files: the text embedder buckets FNV-1a token
//! hashes, the image embedder histograms raw bytes. Neither is semantic,
//! capturing lexical/byte overlap only, but both are deterministic, which
//! is what development fixtures and pipeline tests need.
//!
//! There is no offline generator: a request that needs captioning or image
//! synthesis in offline mode fails with the usual dependency error.

use crate::error::{SearchError, SearchResult};
use crate::model::{Embedding, ImagePayload};
use crate::providers::{CaptionGenerator, ImageEmbedder, ImageGenerator, TextEmbedder};
use async_trait::async_trait;

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Tokens shorter than this are ignored by the text embedder.
const MIN_TOKEN_CHARS: usize = 2;

/// Default dimension for offline feature fixtures.
pub const OFFLINE_DIMENSION: usize = 384;

/// Bag-of-tokens text embedder: each token hashes to one bucket with a
/// sign taken from the hash's high bit, then the vector is l2-normalized.
#[derive(Debug, Clone)]
pub struct FnvTextEmbedder {
    dimension: usize,
}

impl FnvTextEmbedder {
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self { dimension }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0_f32; self.dimension];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let index = (hash as usize) % self.dimension;
            let sign = if (hash >> 63) == 1 { 1.0 } else { -1.0 };
            values[index] += sign;
        }
        l2_normalize(values)
    }
}

impl Default for FnvTextEmbedder {
    fn default() -> Self {
        Self::new(OFFLINE_DIMENSION)
    }
}

#[async_trait]
impl TextEmbedder for FnvTextEmbedder {
    async fn embed_text(&self, text: &str) -> SearchResult<Embedding> {
        Ok(Embedding::new(self.embed_sync(text)))
    }

    fn id(&self) -> &str {
        "offline-fnv-text"
    }
}

/// Byte-frequency image embedder: buckets byte values into the vector and
/// l2-normalizes. Two payloads with the same bytes always embed equally.
#[derive(Debug, Clone)]
pub struct ByteHistogramImageEmbedder {
    dimension: usize,
}

impl ByteHistogramImageEmbedder {
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self { dimension }
    }

    pub fn embed_sync(&self, image: &ImagePayload) -> Vec<f32> {
        let mut values = vec![0.0_f32; self.dimension];
        for byte in image.as_slice() {
            values[usize::from(*byte) % self.dimension] += 1.0;
        }
        l2_normalize(values)
    }
}

impl Default for ByteHistogramImageEmbedder {
    fn default() -> Self {
        Self::new(OFFLINE_DIMENSION)
    }
}

#[async_trait]
impl ImageEmbedder for ByteHistogramImageEmbedder {
    async fn embed_image(&self, image: &ImagePayload) -> SearchResult<Embedding> {
        Ok(Embedding::new(self.embed_sync(image)))
    }

    fn id(&self) -> &str {
        "offline-byte-histogram"
    }
}

/// Stand-in for the generators, which have no offline form. Every
/// invocation fails with a dependency error telling the caller to supply
/// the missing modality directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGenerator;

#[async_trait]
impl CaptionGenerator for UnavailableGenerator {
    async fn caption(&self, _image: &ImagePayload) -> SearchResult<String> {
        Err(SearchError::TextGenerationFailed {
            reason: "captioning is not available in offline mode; supply text directly".into(),
        })
    }
}

#[async_trait]
impl ImageGenerator for UnavailableGenerator {
    async fn synthesize(&self, _prompt: &str) -> SearchResult<ImagePayload> {
        Err(SearchError::ImageGenerationFailed {
            reason: "image synthesis is not available in offline mode; supply an image directly"
                .into(),
        })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Scales to unit length; an all-zero vector stays all-zero.
fn l2_normalize(mut values: Vec<f32>) -> Vec<f32> {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut values {
            *v /= norm;
        }
    }
    values
}
