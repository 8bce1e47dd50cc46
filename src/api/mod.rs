// ============================================================
// Layer 1 — HTTP API (axum)
// ============================================================
// Routes:
//   GET  /                 single-page web UI
//   GET  /health           liveness + model loaded
//   GET  /languages        supported languages and directions
//   GET  /model/info       checkpoint and decoding details
//   POST /translate        one text
//   POST /translate/batch  up to 50 texts
//
// The service is loaded before the router is built, so a server
// that is listening always has a model. Generation is CPU/GPU
// bound and runs on the blocking pool.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::translate_use_case::TranslationService;

pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranslationService>,
}

impl AppState {
    pub fn new(service: TranslationService) -> Self {
        Self { service: Arc::new(service) }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/languages", get(handlers::languages))
        .route("/model/info", get(handlers::model_info))
        .route("/translate", post(handlers::translate))
        .route("/translate/batch", post(handlers::translate_batch))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    tracing::info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
