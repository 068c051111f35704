//! HTTP client for the remote inference gateway.
//!
//! One service hosts every model this pipeline consumes, behind four JSON
//! endpoints relative to a configurable base URL:
//!
//! - `POST /embed/text`  `{ "text": ... }` → `{ "embedding": [f32, ...] }`
//! - `POST /embed/image` `{ "image": <base64> }` → `{ "embedding": [f32, ...] }`
//! - `POST /caption`     `{ "image": <base64> }` → `{ "text": ... }`
//! - `POST /synthesize`  `{ "prompt": ... }` → `{ "image": <base64> }`
//!
//! An empty embedding, caption, or image in an otherwise successful reply
//! counts as a provider failure: the pipeline must never mistake a hollow
//! response for a result.

use crate::config::GatewayConfig;
use crate::error::{SearchError, SearchResult};
use crate::model::{Embedding, ImagePayload, Modality};
use crate::providers::{CaptionGenerator, ImageEmbedder, ImageGenerator, TextEmbedder};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Serialize)]
struct EmbedTextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbedImageRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct CaptionRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    image: String,
}

/// Client implementing all four model provider traits against the gateway.
#[derive(Debug, Clone)]
pub struct RemoteModelGateway {
    client: reqwest::Client,
    base_url: String,
    prompt_suffix: String,
}

impl RemoteModelGateway {
    pub fn new(config: &GatewayConfig) -> SearchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::InvalidConfig {
                field: "gateway",
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            prompt_suffix: config.prompt_suffix.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Synthesis prompt with the configured style suffix appended.
    fn synthesis_prompt(&self, prompt: &str) -> String {
        if self.prompt_suffix.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt}, {}", self.prompt_suffix)
        }
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BoxError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Resp>().await?)
    }
}

#[async_trait]
impl TextEmbedder for RemoteModelGateway {
    async fn embed_text(&self, text: &str) -> SearchResult<Embedding> {
        let response: EmbedResponse = self
            .post_json("/embed/text", &EmbedTextRequest { text })
            .await
            .map_err(|source| SearchError::EmbeddingFailed {
                modality: Modality::Text,
                source,
            })?;
        if response.embedding.is_empty() {
            return Err(SearchError::EmbeddingFailed {
                modality: Modality::Text,
                source: "gateway returned an empty embedding".into(),
            });
        }
        debug!(dim = response.embedding.len(), "gateway_text_embedded");
        Ok(Embedding::new(response.embedding))
    }

    fn id(&self) -> &str {
        "gateway-text"
    }
}

#[async_trait]
impl ImageEmbedder for RemoteModelGateway {
    async fn embed_image(&self, image: &ImagePayload) -> SearchResult<Embedding> {
        let encoded = BASE64.encode(image.as_slice());
        let response: EmbedResponse = self
            .post_json("/embed/image", &EmbedImageRequest { image: &encoded })
            .await
            .map_err(|source| SearchError::EmbeddingFailed {
                modality: Modality::Image,
                source,
            })?;
        if response.embedding.is_empty() {
            return Err(SearchError::EmbeddingFailed {
                modality: Modality::Image,
                source: "gateway returned an empty embedding".into(),
            });
        }
        debug!(dim = response.embedding.len(), "gateway_image_embedded");
        Ok(Embedding::new(response.embedding))
    }

    fn id(&self) -> &str {
        "gateway-image"
    }
}

#[async_trait]
impl CaptionGenerator for RemoteModelGateway {
    async fn caption(&self, image: &ImagePayload) -> SearchResult<String> {
        let encoded = BASE64.encode(image.as_slice());
        let response: CaptionResponse = self
            .post_json("/caption", &CaptionRequest { image: &encoded })
            .await
            .map_err(|e| SearchError::TextGenerationFailed {
                reason: e.to_string(),
            })?;
        let caption = response.text.trim().to_string();
        if caption.is_empty() {
            return Err(SearchError::TextGenerationFailed {
                reason: "gateway returned an empty caption".into(),
            });
        }
        debug!(chars = caption.len(), "gateway_caption_generated");
        Ok(caption)
    }
}

#[async_trait]
impl ImageGenerator for RemoteModelGateway {
    async fn synthesize(&self, prompt: &str) -> SearchResult<ImagePayload> {
        let full_prompt = self.synthesis_prompt(prompt);
        let response: SynthesizeResponse = self
            .post_json(
                "/synthesize",
                &SynthesizeRequest {
                    prompt: &full_prompt,
                },
            )
            .await
            .map_err(|e| SearchError::ImageGenerationFailed {
                reason: e.to_string(),
            })?;
        let bytes = BASE64
            .decode(response.image.as_bytes())
            .map_err(|e| SearchError::ImageGenerationFailed {
                reason: format!("gateway returned undecodable image data: {e}"),
            })?;
        if bytes.is_empty() {
            return Err(SearchError::ImageGenerationFailed {
                reason: "gateway returned an empty image".into(),
            });
        }
        debug!(bytes = bytes.len(), "gateway_image_synthesized");
        Ok(ImagePayload::new(bytes))
    }
}
