use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::ErrorResponse;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Require `X-API-Key` to match the configured key. No key configured, no check.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if !state.config.auth_enabled() {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|header| header.to_str().ok());

    if provided != Some(state.config.auth.api_key.as_str()) {
        warn!("Rejected request to {}: invalid or missing X-API-Key", request.uri().path());
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "AUTH_ERROR".to_string(),
                message: "Invalid X-API-Key".to_string(),
                code: StatusCode::UNAUTHORIZED.as_u16().to_string(),
                details: None,
            }),
        ));
    }

    Ok(next.run(request).await)
}
