//! Upstream transcript source contract.
//!
//! The core never looks past [`UpstreamError::kind`]; the individual variants are
//! kept for diagnostics and for the HTTP status mapping at the boundary.

pub mod http_client;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{FetchedTranscript, TranscriptInfo};

pub use http_client::HttpTranscriptSource;

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// First available transcript among `languages`, in preference order.
    /// `preserve_formatting` keeps inline formatting tags in segment text.
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
        preserve_formatting: bool,
    ) -> Result<FetchedTranscript, UpstreamError>;

    /// Transcript tracks offered for `video_id`.
    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptInfo>, UpstreamError>;
}

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Request blocked by upstream (rate/anti-bot)")]
    RequestBlocked,

    #[error("Video unavailable: {video_id}")]
    VideoUnavailable { video_id: String },

    #[error("Transcripts disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for {video_id} in languages [{languages}]")]
    NoTranscriptFound { video_id: String, languages: String },

    #[error("Video {video_id} requires authentication / special token")]
    AuthenticationRequired { video_id: String },

    #[error("Invalid video id: {video_id}")]
    InvalidVideoId { video_id: String },

    #[error("Upstream response error (blocked/unparsable/unplayable): {message}")]
    Unparsable { message: String },

    #[error("Upstream transport error: {message}")]
    Transport { message: String },
}

/// Coarse classes the core and its callers act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamFailureKind {
    /// Retry later.
    RateLimited,
    /// Upstream broken or refusing this video; may recover.
    Unavailable,
    /// Nothing to fetch for this video/language combination.
    NoContent,
}

impl UpstreamFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamFailureKind::RateLimited => "rate_limited",
            UpstreamFailureKind::Unavailable => "unavailable",
            UpstreamFailureKind::NoContent => "no_content",
        }
    }
}

impl std::fmt::Display for UpstreamFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UpstreamError {
    pub fn kind(&self) -> UpstreamFailureKind {
        match self {
            UpstreamError::RequestBlocked => UpstreamFailureKind::RateLimited,
            UpstreamError::VideoUnavailable { .. }
            | UpstreamError::TranscriptsDisabled { .. }
            | UpstreamError::NoTranscriptFound { .. }
            | UpstreamError::InvalidVideoId { .. } => UpstreamFailureKind::NoContent,
            UpstreamError::AuthenticationRequired { .. }
            | UpstreamError::Unparsable { .. }
            | UpstreamError::Transport { .. } => UpstreamFailureKind::Unavailable,
        }
    }

    /// Wire tag used by the HTTP sidecar protocol and in error details.
    pub fn tag(&self) -> &'static str {
        match self {
            UpstreamError::RequestBlocked => "request_blocked",
            UpstreamError::VideoUnavailable { .. } => "video_unavailable",
            UpstreamError::TranscriptsDisabled { .. } => "transcripts_disabled",
            UpstreamError::NoTranscriptFound { .. } => "no_transcript_found",
            UpstreamError::AuthenticationRequired { .. } => "authentication_required",
            UpstreamError::InvalidVideoId { .. } => "invalid_video_id",
            UpstreamError::Unparsable { .. } => "unparsable",
            UpstreamError::Transport { .. } => "transport",
        }
    }
}
