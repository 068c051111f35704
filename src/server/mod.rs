//! HTTP surface for the spot search service.
//!
//! Endpoints:
//! - `POST /search` - multipart search request (text and/or image, optional
//!   `search_range`)
//! - `GET /suggest-images` - random query-image suggestions
//! - `GET /health` - liveness probe

pub mod routes;

pub use routes::create_router;

use crate::providers::SpotCatalog;
use crate::search::pipeline::{Providers, SearchPipeline};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state handed to every handler.
pub struct AppState {
    pub pipeline: SearchPipeline,
    pub catalog: Arc<dyn SpotCatalog>,
    pub suggestion_count: usize,
}

impl AppState {
    pub fn new(providers: Providers, suggestion_count: usize) -> Self {
        let catalog = Arc::clone(&providers.catalog);
        Self {
            pipeline: SearchPipeline::new(providers),
            catalog,
            suggestion_count,
        }
    }
}

/// Starts the HTTP server and runs until Ctrl+C.
pub async fn run_server(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    run_server_with_shutdown(state, addr, shutdown_signal()).await
}

/// Same as [`run_server`] with a caller-supplied shutdown future; the server
/// stops accepting connections when it completes.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app: Router = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown_signal_received"),
        Err(e) => {
            // Without a working Ctrl+C handler the server just runs until
            // the process is killed.
            error!(error = %e, "ctrl_c_handler_unavailable");
            std::future::pending::<()>().await;
        }
    }
}
