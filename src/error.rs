//! Error taxonomy of the transcript service and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::upstream::{UpstreamError, UpstreamFailureKind};

pub type Result<T> = std::result::Result<T, TranscriptError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Upstream fetch failed ({kind}): {cause}")]
    Upstream {
        kind: UpstreamFailureKind,
        #[source]
        cause: UpstreamError,
    },

    #[error("No content available for video {video_id}")]
    EmptyContent { video_id: String },
}

impl From<UpstreamError> for TranscriptError {
    fn from(cause: UpstreamError) -> Self {
        Self::Upstream {
            kind: cause.kind(),
            cause,
        }
    }
}

impl TranscriptError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat { format: format.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranscriptError::StoreUnavailable(_) => true,
            TranscriptError::Upstream { kind, .. } => *kind != UpstreamFailureKind::NoContent,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TranscriptError::UnsupportedFormat { .. } => StatusCode::BAD_REQUEST,
            TranscriptError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            TranscriptError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TranscriptError::EmptyContent { .. } => StatusCode::NOT_FOUND,
            TranscriptError::Upstream { cause, kind } => match (cause, kind) {
                (UpstreamError::InvalidVideoId { .. }, _) => StatusCode::BAD_REQUEST,
                (UpstreamError::AuthenticationRequired { .. }, _) => StatusCode::FORBIDDEN,
                (_, UpstreamFailureKind::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
                (_, UpstreamFailureKind::NoContent) => StatusCode::NOT_FOUND,
                (_, UpstreamFailureKind::Unavailable) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TranscriptError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            TranscriptError::BadRequest { .. } => "BAD_REQUEST",
            TranscriptError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            TranscriptError::EmptyContent { .. } => "EMPTY_CONTENT",
            TranscriptError::Upstream { kind, .. } => match kind {
                UpstreamFailureKind::RateLimited => "UPSTREAM_RATE_LIMITED",
                UpstreamFailureKind::Unavailable => "UPSTREAM_UNAVAILABLE",
                UpstreamFailureKind::NoContent => "UPSTREAM_NO_CONTENT",
            },
        }
    }
}

impl IntoResponse for TranscriptError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            TranscriptError::Upstream { cause, .. } => Some(serde_json::json!({
                "cause": cause.tag(),
                "retryable": self.is_retryable(),
            })),
            _ => None,
        };
        let error_response = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            code: status.as_u16().to_string(),
            details,
        };

        if status.is_server_error() {
            tracing::error!("API Error: {} - {}", self.error_code(), self);
        } else {
            tracing::warn!("API Error: {} - {}", self.error_code(), self);
        }

        (status, Json(error_response)).into_response()
    }
}
