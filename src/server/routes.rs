//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::error::SearchError;
use crate::model::{ImagePayload, SearchQuery, SearchRange};
use crate::search::pipeline::SearchOutcome;
use crate::suggest::suggest_query_images;

use super::AppState;

/// Builds the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/suggest-images", get(suggest_images))
        .with_state(state)
}

/// Error envelope: classified status code plus a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = if err.is_input_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_dependency_failure() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SearchOutcome>, ApiError> {
    let query = parse_search_request(multipart).await?;
    if query.is_empty() {
        return Err(ApiError::bad_request(
            "either text or image is required: both were missing or empty",
        ));
    }

    let outcome = state.pipeline.search(&query).await.map_err(|e| {
        warn!(error = %e, "search_request_failed");
        ApiError::from(e)
    })?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggested_images: Vec<String>,
}

async fn suggest_images(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let suggested_images = suggest_query_images(state.catalog.as_ref(), state.suggestion_count)
        .await
        .map_err(|e| {
            warn!(error = %e, "suggest_request_failed");
            ApiError::from(e)
        })?;
    Ok(Json(SuggestResponse { suggested_images }))
}

/// Reads the multipart form into a [`SearchQuery`], applying the browser
/// quirks normalization before the core ever sees the input.
async fn parse_search_request(mut multipart: Multipart) -> Result<SearchQuery, ApiError> {
    let mut text: Option<String> = None;
    let mut image: Option<ImagePayload> = None;
    let mut range = SearchRange::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                text = normalize_text(field.text().await.map_err(bad_multipart)?);
            }
            "image" => {
                // A file input submitted empty arrives as a part with no
                // filename; treat it as absent.
                if !field.file_name().is_some_and(|f| !f.is_empty()) {
                    continue;
                }
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    image = Some(ImagePayload::new(bytes));
                }
            }
            "search_range" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let value: i64 = raw.trim().parse().map_err(|_| {
                    ApiError::bad_request(format!(
                        "search_range must be an integer between 0 and 100, got \"{}\"",
                        raw.trim()
                    ))
                })?;
                range = SearchRange::new(value)?;
            }
            // Unknown fields are ignored.
            _ => {}
        }
    }

    Ok(SearchQuery::new(text, image, range))
}

/// Empty/whitespace text and the literal `"undefined"` (a stringified
/// missing value from JS form clients) count as no text at all.
fn normalize_text(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("undefined") {
        None
    } else {
        Some(raw)
    }
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("malformed multipart request: {err}"))
}
