use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{retention_age, MAX_RETENTION_DAYS};
use crate::error::TranscriptError;
use crate::models::{
    AvailableTranscriptsResponse, PurgeResponse, TranscriptRequest, TranscriptResponse,
};
use crate::state::AppState;
use crate::utils::{extract_video_id, parse_flag};

// ============================================================================
// QUERY PARSING
// ============================================================================

/// `languages` may repeat, so the raw pair list is read instead of a struct.
fn transcript_request(params: Vec<(String, String)>) -> Result<TranscriptRequest, TranscriptError> {
    let mut video = None;
    let mut languages = Vec::new();
    let mut format = None;
    let mut preserve_formatting = false;
    let mut force = false;

    for (name, value) in params {
        match name.as_str() {
            "video" => video = Some(value),
            "languages" | "language" => languages.push(value),
            "format" => format = Some(value),
            "preserve_formatting" => {
                preserve_formatting = parse_flag(&value).ok_or_else(|| {
                    TranscriptError::bad_request(format!(
                        "Invalid value for preserve_formatting: '{}'",
                        value
                    ))
                })?
            }
            "force" => {
                force = parse_flag(&value).ok_or_else(|| {
                    TranscriptError::bad_request(format!("Invalid value for force: '{}'", value))
                })?
            }
            _ => {}
        }
    }

    let video =
        video.ok_or_else(|| TranscriptError::bad_request("Missing 'video' query parameter"))?;
    let video_id = extract_video_id(&video)
        .ok_or_else(|| TranscriptError::bad_request(format!("Invalid video id / url: {}", video)))?;

    Ok(TranscriptRequest {
        video_id,
        languages,
        format: format.unwrap_or_else(|| "text".to_string()),
        preserve_formatting,
        force,
    })
}

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub video: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    pub older_than_days: Option<i64>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /transcript?video=&languages=&format=&preserve_formatting=&force=
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TranscriptResponse>, TranscriptError> {
    let request = transcript_request(params)?;
    debug!(
        "Transcript request: video={}, languages={:?}, format={}, formatting={}, force={}",
        request.video_id,
        request.languages,
        request.format,
        request.preserve_formatting,
        request.force
    );

    let response = state.transcripts.fetch(request).await?;
    Ok(Json(response))
}

/// GET /available?video=
pub async fn get_available(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<AvailableTranscriptsResponse>, TranscriptError> {
    let video = query
        .video
        .ok_or_else(|| TranscriptError::bad_request("Missing 'video' query parameter"))?;
    let video_id = extract_video_id(&video)
        .ok_or_else(|| TranscriptError::bad_request(format!("Invalid video id / url: {}", video)))?;

    let transcripts = state.transcripts.available(&video_id).await?;
    Ok(Json(AvailableTranscriptsResponse { video_id, transcripts }))
}

/// POST /admin/purge?older_than_days=
pub async fn purge_cache(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResponse>, TranscriptError> {
    let older_than_days = query.older_than_days.unwrap_or(state.config.cache.retention_days);
    let age = retention_age(older_than_days).ok_or_else(|| {
        TranscriptError::bad_request(format!(
            "older_than_days must be between 1 and {}",
            MAX_RETENTION_DAYS
        ))
    })?;

    let purged = state.transcripts.purge_older_than(age).await?;
    info!("🧹 Manual purge removed {} entries older than {} days", purged, older_than_days);

    Ok(Json(PurgeResponse { purged, older_than_days }))
}
