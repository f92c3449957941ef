use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache_key::CacheKey;
use crate::formatter::TranscriptFormat;

// ============================================================================
// UPSTREAM DATA
// ============================================================================

/// One timed piece of transcript text as returned by the upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A transcript track the upstream offers for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptInfo {
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// The track the upstream picked from the caller's language preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTrack {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub language_code: String,
    #[serde(default)]
    pub is_generated: bool,
}

impl SelectedTrack {
    pub fn new(
        language: impl Into<String>,
        language_code: impl Into<String>,
        is_generated: bool,
    ) -> Self {
        Self {
            language: language.into(),
            language_code: language_code.into(),
            is_generated,
        }
    }
}

/// Result of one upstream fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTranscript {
    #[serde(flatten)]
    pub track: SelectedTrack,
    pub segments: Vec<Segment>,
}

impl FetchedTranscript {
    pub fn new(track: SelectedTrack, segments: Vec<Segment>) -> Self {
        Self { track, segments }
    }
}

// ============================================================================
// CACHE ROW
// ============================================================================

/// One cached transcript. `fingerprint` is always the hash of `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CacheEntry {
    pub video_id: String,
    pub language_key: String,
    pub format: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub content: String,
    pub fingerprint: String,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry for `key`, fingerprinting `content`.
    pub fn new(
        key: &CacheKey,
        track: &SelectedTrack,
        content: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            video_id: key.video_id.clone(),
            language_key: key.language_key.clone(),
            format: key.format.clone(),
            language: track.language.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            fingerprint: crate::fingerprint::compute(&content),
            content,
            fetched_at,
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.video_id, &self.language_key, &self.format)
    }

    pub fn track(&self) -> SelectedTrack {
        SelectedTrack::new(&self.language, &self.language_code, self.is_generated)
    }

    /// Whether the stored fingerprint still matches the stored content.
    pub fn is_intact(&self) -> bool {
        crate::fingerprint::verify(&self.content, &self.fingerprint)
    }
}

// ============================================================================
// ORCHESTRATOR INPUT / OUTPUT
// ============================================================================

#[derive(Debug, Clone)]
pub struct TranscriptRequest {
    pub video_id: String,
    pub languages: Vec<String>,
    pub format: String,
    pub preserve_formatting: bool,
    pub force: bool,
}

impl TranscriptRequest {
    pub fn new(
        video_id: impl Into<String>,
        languages: Vec<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            languages,
            format: format.into(),
            preserve_formatting: false,
            force: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_formatting(mut self) -> Self {
        self.preserve_formatting = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub language_key: String,
    pub languages: Vec<String>,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub format: String,
    pub preserve_formatting: bool,
    pub content: String,
    pub fingerprint: String,
    pub fetched_at: DateTime<Utc>,
    pub cache: CacheStatus,
}

impl TranscriptResponse {
    /// `format` is the requested format; the entry's format slot may carry a suffix.
    pub fn from_entry(
        entry: CacheEntry,
        languages: Vec<String>,
        format: TranscriptFormat,
        preserve_formatting: bool,
        cache: CacheStatus,
    ) -> Self {
        Self {
            video_id: entry.video_id,
            language_key: entry.language_key,
            languages,
            language: entry.language,
            language_code: entry.language_code,
            is_generated: entry.is_generated,
            format: format.as_str().to_string(),
            preserve_formatting,
            content: entry.content,
            fingerprint: entry.fingerprint,
            fetched_at: entry.fetched_at,
            cache,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTranscriptsResponse {
    pub video_id: String,
    pub transcripts: Vec<TranscriptInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub purged: u64,
    pub older_than_days: i64,
}
