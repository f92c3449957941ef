//! Rendering of upstream segments into the cached output representations.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{FetchedTranscript, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    Text,
    Json,
    Srt,
    WebVtt,
    Pretty,
    Raw,
}

impl TranscriptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptFormat::Text => "text",
            TranscriptFormat::Json => "json",
            TranscriptFormat::Srt => "srt",
            TranscriptFormat::WebVtt => "webvtt",
            TranscriptFormat::Pretty => "pretty",
            TranscriptFormat::Raw => "raw",
        }
    }

    /// Render a fetched transcript. Callers check for empty text beforehand.
    pub fn render(&self, transcript: &FetchedTranscript) -> String {
        let segments = &transcript.segments;
        match self {
            TranscriptFormat::Text => plain_text(segments),
            TranscriptFormat::Json => serde_json::json!(segments).to_string(),
            TranscriptFormat::Pretty => format!("{:#}", serde_json::json!(segments)),
            // Snippets plus the track they came from
            TranscriptFormat::Raw => serde_json::json!({
                "language": transcript.track.language,
                "language_code": transcript.track.language_code,
                "is_generated": transcript.track.is_generated,
                "snippets": segments,
            })
            .to_string(),
            TranscriptFormat::Srt => segments
                .iter()
                .enumerate()
                .map(|(i, segment)| {
                    format!(
                        "{}\n{} --> {}\n{}",
                        i + 1,
                        timestamp(segment.start, ','),
                        timestamp(segment.start + segment.duration, ','),
                        segment.text.trim()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            TranscriptFormat::WebVtt => {
                let cues = segments
                    .iter()
                    .map(|segment| {
                        format!(
                            "{} --> {}\n{}",
                            timestamp(segment.start, '.'),
                            timestamp(segment.start + segment.duration, '.'),
                            segment.text.trim()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                format!("WEBVTT\n\n{}", cues)
            }
        }
    }
}

impl FromStr for TranscriptFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(TranscriptFormat::Text),
            "json" => Ok(TranscriptFormat::Json),
            "srt" => Ok(TranscriptFormat::Srt),
            "webvtt" | "vtt" => Ok(TranscriptFormat::WebVtt),
            "pretty" => Ok(TranscriptFormat::Pretty),
            "raw" => Ok(TranscriptFormat::Raw),
            other => Err(format!("unknown transcript format '{}'", other)),
        }
    }
}

impl std::fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Segment texts joined by newlines, surrounding whitespace trimmed.
pub fn plain_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn timestamp(seconds: f64, millis_separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, millis_separator, millis)
}
