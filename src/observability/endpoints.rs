// ============================================================================
// HEALTH & PROMETHEUS ENDPOINTS
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use crate::db::check_health;
use crate::state::AppState;

/// Rutas sin autenticación: health y métricas
pub fn observability_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store_healthy = match &state.db_pool {
        Some(pool) => check_health(pool).await,
        None => true,
    };

    let health = serde_json::json!({
        "ok": store_healthy,
        "status": if store_healthy { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "transcript_cache_ws",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.transcripts.store_backend(),
        "formats": state
            .transcripts
            .settings()
            .supported_formats
            .iter()
            .map(|format| format.as_str())
            .collect::<Vec<_>>(),
    });

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Handler para el endpoint /metrics de Prometheus
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
