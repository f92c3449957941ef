use axum::Router;
use std::sync::Arc;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache_key;
pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod formatter;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod throttle;
pub mod upstream;
pub mod utils;

use api::create_api_router;
use middleware::require_api_key;
use observability::{metrics_middleware, observability_router};
use state::AppState;

use axum::middleware as axum_middleware;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    // Rutas de transcripciones detrás de la API key
    let api_router = create_api_router().route_layer(axum_middleware::from_fn_with_state(
        app_state.clone(),
        require_api_key,
    ));

    Router::new()
        // Health y /metrics sin autenticación
        .merge(observability_router())
        .merge(api_router)
        .with_state(app_state)
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .compress_when(SizeAbove::new(1024)), // Only compress responses > 1KB
        )
        .layer(TraceLayer::new_for_http())
}
