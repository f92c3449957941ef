use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::models::{FetchedTranscript, TranscriptInfo};
use crate::upstream::{TranscriptSource, UpstreamError};

/// Body of a successful `/list` call
#[derive(Debug, Deserialize)]
struct ListResponse {
    transcripts: Vec<TranscriptInfo>,
}

/// Error body returned by the sidecar on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default, alias = "detail")]
    message: Option<String>,
}

/// Transcript source backed by an HTTP transcript-provider sidecar.
pub struct HttpTranscriptSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriptSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!("🔗 Initializing transcript upstream HTTP client for: {}", base_url);

        Ok(Self { base_url, client })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        video_id: &str,
        languages: &[String],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("❌ Upstream request to {} failed: {}", url, e);
                UpstreamError::Transport { message: e.to_string() }
            })?;

        let status = response.status();
        debug!("Upstream {} answered {} in {}ms", path, status, start.elapsed().as_millis());

        if status.is_success() {
            return response.json::<T>().await.map_err(|e| UpstreamError::Unparsable {
                message: format!("invalid response body: {}", e),
            });
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(classify_failure(status, body, video_id, languages))
    }
}

fn classify_failure(
    status: StatusCode,
    body: ErrorBody,
    video_id: &str,
    languages: &[String],
) -> UpstreamError {
    let video_id = video_id.to_string();
    let message = body
        .message
        .unwrap_or_else(|| format!("upstream answered {}", status));

    match body.error.as_deref() {
        Some("request_blocked") | Some("ip_blocked") => UpstreamError::RequestBlocked,
        Some("video_unavailable") => UpstreamError::VideoUnavailable { video_id },
        Some("transcripts_disabled") => UpstreamError::TranscriptsDisabled { video_id },
        Some("no_transcript_found") => UpstreamError::NoTranscriptFound {
            video_id,
            languages: languages.join(","),
        },
        Some("authentication_required") | Some("age_restricted") | Some("po_token_required") => {
            UpstreamError::AuthenticationRequired { video_id }
        }
        Some("invalid_video_id") => UpstreamError::InvalidVideoId { video_id },
        Some(_) => UpstreamError::Unparsable { message },
        None => match status {
            StatusCode::TOO_MANY_REQUESTS => UpstreamError::RequestBlocked,
            StatusCode::NOT_FOUND => UpstreamError::NoTranscriptFound {
                video_id,
                languages: languages.join(","),
            },
            StatusCode::FORBIDDEN => UpstreamError::AuthenticationRequired { video_id },
            StatusCode::BAD_REQUEST => UpstreamError::InvalidVideoId { video_id },
            _ => UpstreamError::Unparsable { message },
        },
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch(
        &self,
        video_id: &str,
        languages: &[String],
        preserve_formatting: bool,
    ) -> Result<FetchedTranscript, UpstreamError> {
        let mut query: Vec<(&str, &str)> = vec![("video", video_id)];
        query.extend(languages.iter().map(|code| ("languages", code.as_str())));
        if preserve_formatting {
            query.push(("preserve_formatting", "true"));
        }

        let fetched: FetchedTranscript = self.get("/fetch", &query, video_id, languages).await?;
        debug!(
            "Fetched {} segments for {} (language: {}, generated: {})",
            fetched.segments.len(),
            video_id,
            fetched.track.language_code,
            fetched.track.is_generated
        );
        Ok(fetched)
    }

    async fn list(&self, video_id: &str) -> Result<Vec<TranscriptInfo>, UpstreamError> {
        let listed: ListResponse = self.get("/list", &[("video", video_id)], video_id, &[]).await?;
        Ok(listed.transcripts)
    }
}
