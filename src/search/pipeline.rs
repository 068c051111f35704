//! Request orchestration: input resolution, strategy dispatch, ranking,
//! fusion.
//!
//! [`SearchPipeline::search`] is the one entry point. It fills in a missing
//! modality via the fallback generators when the selected strategy needs it,
//! then runs the strategy's stage sequence. Generation failures are
//! terminal: a request that needed a caption or a synthesized image and did
//! not get one errors out instead of degrading to a narrower search.

use crate::error::{SearchError, SearchResult};
use crate::model::{
    FusedSpot, ImagePayload, InputOrigin, Modality, ModalityWeights, ScoredSpot, SearchQuery,
    SearchRange, SearchStrategy,
};
use crate::providers::{CaptionGenerator, ImageEmbedder, ImageGenerator, SpotCatalog, TextEmbedder};
use crate::search::fusion::{WeightedSlice, comparison_slices, fuse_rankings};
use crate::search::keywords::{KeywordExtractor, UnicodeKeywordExtractor};
use crate::search::location_filter::filter_by_location;
use crate::search::ranker::rank_by_similarity;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// External collaborators the pipeline runs against, fixed at startup.
#[derive(Clone)]
pub struct Providers {
    pub text_embedder: Arc<dyn TextEmbedder>,
    pub image_embedder: Arc<dyn ImageEmbedder>,
    pub captioner: Arc<dyn CaptionGenerator>,
    pub synthesizer: Arc<dyn ImageGenerator>,
    pub catalog: Arc<dyn SpotCatalog>,
}

/// Result of one search request: the fused ranking plus enough context for
/// the caller to see which pipeline shape ran and where each input came
/// from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<FusedSpot>,
    pub strategy: SearchStrategy,
    /// `None` when the strategy never consumed text.
    pub text_origin: Option<InputOrigin>,
    /// `None` when the strategy never consumed an image.
    pub image_origin: Option<InputOrigin>,
}

/// The orchestrator. Stateless between requests; every call re-reads the
/// catalog through the [`SpotCatalog`] handle.
pub struct SearchPipeline {
    providers: Providers,
    extractor: Arc<dyn KeywordExtractor>,
}

impl SearchPipeline {
    pub fn new(providers: Providers) -> Self {
        Self::with_extractor(providers, Arc::new(UnicodeKeywordExtractor))
    }

    /// Swaps in a different keyword extractor (a morphological tagger, a
    /// test stub) without touching the rest of the pipeline.
    pub fn with_extractor(providers: Providers, extractor: Arc<dyn KeywordExtractor>) -> Self {
        Self {
            providers,
            extractor,
        }
    }

    /// Runs one search request end to end.
    pub async fn search(&self, query: &SearchQuery) -> SearchResult<SearchOutcome> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let strategy = query.range.strategy();
        let started = Instant::now();
        info!(
            %strategy,
            range = query.range.value(),
            has_text = query.text.is_some(),
            has_image = query.image.is_some(),
            "search_start"
        );

        // Text resolves first: a synthesized image needs the resolved text
        // (caller's or captioned) as its prompt.
        let (text, text_origin) = self.resolve_text(query).await?;
        let (image, image_origin) = self.resolve_image(query, text.as_deref()).await?;

        let results = match strategy {
            SearchStrategy::TextOnly => {
                let Some(text) = text.as_deref() else {
                    return Err(SearchError::EmptyQuery);
                };
                self.run_text_only(text).await?
            }
            SearchStrategy::ImageOnly => {
                let Some(image) = image.as_ref() else {
                    return Err(SearchError::EmptyQuery);
                };
                self.run_image_only(image).await?
            }
            SearchStrategy::Hybrid => {
                let (Some(text), Some(image)) = (text.as_deref(), image.as_ref()) else {
                    return Err(SearchError::EmptyQuery);
                };
                self.run_hybrid(text, image, query.range.weights()).await?
            }
        };

        info!(
            %strategy,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search_complete"
        );
        Ok(SearchOutcome {
            results,
            strategy,
            text_origin,
            image_origin,
        })
    }

    /// Caller text, or a generated caption when the strategy consumes text
    /// and none was supplied. An empty caption counts as a failure.
    async fn resolve_text(
        &self,
        query: &SearchQuery,
    ) -> SearchResult<(Option<String>, Option<InputOrigin>)> {
        if let Some(text) = &query.text {
            return Ok((Some(text.clone()), Some(InputOrigin::Caller)));
        }
        if !query.needs_caption() {
            return Ok((None, None));
        }
        // needs_caption() on a non-empty query implies the image is present.
        let Some(image) = &query.image else {
            return Err(SearchError::EmptyQuery);
        };

        let caption = self.providers.captioner.caption(image).await?;
        let caption = caption.trim().to_string();
        if caption.is_empty() {
            return Err(SearchError::TextGenerationFailed {
                reason: "captioner returned empty output".into(),
            });
        }
        debug!(chars = caption.chars().count(), "caption_generated");
        Ok((Some(caption), Some(InputOrigin::Generated)))
    }

    /// Caller image, or a synthesized one when the strategy consumes image
    /// similarity and none was supplied. An empty payload counts as a
    /// failure.
    async fn resolve_image(
        &self,
        query: &SearchQuery,
        text: Option<&str>,
    ) -> SearchResult<(Option<ImagePayload>, Option<InputOrigin>)> {
        if let Some(image) = &query.image {
            return Ok((Some(image.clone()), Some(InputOrigin::Caller)));
        }
        if !query.needs_synthesis() {
            return Ok((None, None));
        }
        // needs_synthesis() on a non-empty query implies text is present.
        let Some(prompt) = text else {
            return Err(SearchError::EmptyQuery);
        };

        let image = self.providers.synthesizer.synthesize(prompt).await?;
        if image.is_empty() {
            return Err(SearchError::ImageGenerationFailed {
                reason: "generator returned an empty image".into(),
            });
        }
        debug!(bytes = image.len(), "image_synthesized");
        Ok((Some(image), Some(InputOrigin::Generated)))
    }

    /// range = 0: keyword filter, text ranking, no fusion.
    async fn run_text_only(&self, text: &str) -> SearchResult<Vec<FusedSpot>> {
        let spots = self.providers.catalog.spots().await?;
        let keywords = self.extractor.extract(text);
        let candidates = filter_by_location(&keywords, &spots);

        let (query, features) = tokio::try_join!(
            self.providers.text_embedder.embed_text(text),
            self.providers.catalog.feature_table(Modality::Text),
        )?;

        let ranked = rank_by_similarity(&candidates, &query, &features)?;
        Ok(single_modality_results(ranked, Modality::Text))
    }

    /// range = 100: full catalog, image ranking, no fusion. There is no
    /// location hint to narrow with, so the filter never runs here.
    async fn run_image_only(&self, image: &ImagePayload) -> SearchResult<Vec<FusedSpot>> {
        let spots = self.providers.catalog.spots().await?;

        let (query, features) = tokio::try_join!(
            self.providers.image_embedder.embed_image(image),
            self.providers.catalog.feature_table(Modality::Image),
        )?;

        let ranked = rank_by_similarity(&spots, &query, &features)?;
        Ok(single_modality_results(ranked, Modality::Image))
    }

    /// 0 < range < 100: keyword filter once, then both modalities rank the
    /// same candidate set and the rankings fuse at the range's weights.
    async fn run_hybrid(
        &self,
        text: &str,
        image: &ImagePayload,
        weights: ModalityWeights,
    ) -> SearchResult<Vec<FusedSpot>> {
        let (text_ranked, image_ranked) = self.hybrid_rankings(text, image).await?;
        Ok(fuse_rankings(&text_ranked, &image_ranked, weights))
    }

    /// Top-N fusion at each fixed comparison weight pair, for side-by-side
    /// inspection of how the text/image mix reshapes the ranking.
    ///
    /// Always runs the hybrid stage sequence: a missing modality is
    /// generated whatever the query's range says, since every weight pair
    /// needs both rankings.
    pub async fn search_comparison(
        &self,
        query: &SearchQuery,
        n: usize,
    ) -> SearchResult<Vec<WeightedSlice>> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let hybrid = SearchQuery {
            text: query.text.clone(),
            image: query.image.clone(),
            range: SearchRange::default(),
        };
        let (text, _) = self.resolve_text(&hybrid).await?;
        let (image, _) = self.resolve_image(&hybrid, text.as_deref()).await?;
        let (Some(text), Some(image)) = (text.as_deref(), image.as_ref()) else {
            return Err(SearchError::EmptyQuery);
        };

        let (text_ranked, image_ranked) = self.hybrid_rankings(text, image).await?;
        Ok(comparison_slices(&text_ranked, &image_ranked, n))
    }

    /// Shared hybrid core: filter once, embed both inputs, rank both
    /// modalities over the same candidate set.
    async fn hybrid_rankings(
        &self,
        text: &str,
        image: &ImagePayload,
    ) -> SearchResult<(Vec<ScoredSpot>, Vec<ScoredSpot>)> {
        let spots = self.providers.catalog.spots().await?;
        let keywords = self.extractor.extract(text);
        let candidates = filter_by_location(&keywords, &spots);
        debug!(
            candidates = candidates.len(),
            catalog = spots.len(),
            "hybrid_candidates_selected"
        );

        let (text_query, image_query, text_features, image_features) = tokio::try_join!(
            self.providers.text_embedder.embed_text(text),
            self.providers.image_embedder.embed_image(image),
            self.providers.catalog.feature_table(Modality::Text),
            self.providers.catalog.feature_table(Modality::Image),
        )?;

        let text_ranked = rank_by_similarity(&candidates, &text_query, &text_features)?;
        let image_ranked = rank_by_similarity(&candidates, &image_query, &image_features)?;
        Ok((text_ranked, image_ranked))
    }
}

/// Lifts a single-modality ranking into the fused result shape: the active
/// modality's similarity doubles as the integrated score, the inactive one
/// reads 0.
fn single_modality_results(ranked: Vec<ScoredSpot>, modality: Modality) -> Vec<FusedSpot> {
    ranked
        .into_iter()
        .map(|spot| {
            let (text_similarity, image_similarity) = match modality {
                Modality::Text => (spot.similarity, 0.0),
                Modality::Image => (0.0, spot.similarity),
            };
            FusedSpot {
                id: spot.id,
                name: spot.name.unwrap_or_default(),
                location: spot.location.unwrap_or_default(),
                text_similarity,
                image_similarity,
                integrated_score: spot.similarity,
            }
        })
        .collect()
}
