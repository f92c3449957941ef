pub mod transcripts;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

pub use transcripts::{get_available, get_transcript, purge_cache};

/// Rutas protegidas por API key
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transcript", get(get_transcript))
        .route("/available", get(get_available))
        .route("/admin/purge", post(purge_cache))
}
