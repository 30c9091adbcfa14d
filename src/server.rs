//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::api::AccessGate;
use crate::models::AppConfig;

/// Application state shared by the router.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gate: AccessGate,
}

/// Create application state from a loaded configuration.
pub fn create_app_state(config: AppConfig) -> AppState {
    let gate = AccessGate::new(config.base_url.clone(), config.key());
    tracing::info!(base_url = %gate.base_url(), "Access gate configured");

    AppState {
        config: Arc::new(config),
        gate,
    }
}

/// Build the router: `/files` behind the access gate, `/health` open.
pub fn build_router(state: AppState) -> Router {
    let files = Router::new()
        .nest_service("/files", ServeDir::new(&state.config.files_dir))
        .layer(state.gate.clone());

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(files)
        .layer(TraceLayer::new_for_http())
}
