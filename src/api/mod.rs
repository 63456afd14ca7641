//! HTTP API: liveness and prediction endpoints.

pub mod error;
pub mod handlers;

use crate::config::CorsConfig;
use crate::metrics::ServiceMetrics;
use crate::models::InferenceEngine;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scoring pipeline around the loaded classifier
    pub engine: InferenceEngine,
    /// Request counters and latency
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine, metrics: Arc<ServiceMetrics>) -> Self {
        Self { engine, metrics }
    }
}

/// Build the router with all routes, CORS and request tracing.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Translate the configured cross-origin policy into a tower-http layer.
///
/// Entries that do not parse are skipped with a warning.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if cors.allowed_origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(origins);
    }

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    if cors.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| match h.parse() {
                Ok(header) => Some(header),
                Err(_) => {
                    warn!(header = %h, "Ignoring invalid CORS header");
                    None
                }
            })
            .collect();
        layer = layer.allow_headers(headers);
    }

    layer
}
