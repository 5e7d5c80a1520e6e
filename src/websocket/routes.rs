//! Builds the Axum router serving the WebSocket channel, the audio gate,
//! and the operational endpoints on a single listening port (spec §6).

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::audio::audio_handler;
use super::handler::websocket_handler;
use super::metrics_routes::{health_check, metrics_handler, prometheus_metrics_handler};
use super::state::AppState;

#[must_use]
pub fn create_router(cors_origins: &str) -> Router<Arc<AppState>> {
    let cors = build_cors_layer(cors_origins);

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/audio", get(audio_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/metrics/prom", get(prometheus_metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(cors_origins: &str) -> CorsLayer {
    if cors_origins == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("no valid CORS origins configured, falling back to permissive CORS");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
