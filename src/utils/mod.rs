// Utils module for utility functions
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BARE_VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref VIDEO_ID_IN_URL: Regex =
        Regex::new(r"(?:v=|/shorts/|youtu\.be/|/embed/)([A-Za-z0-9_-]{11})").unwrap();
}

/// Accept either a bare 11-character video id or a watch / shorts / short-link URL.
pub fn extract_video_id(video_id_or_url: &str) -> Option<String> {
    let input = video_id_or_url.trim();
    if BARE_VIDEO_ID.is_match(input) {
        return Some(input.to_string());
    }

    VIDEO_ID_IN_URL
        .captures(input)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Parse query-string booleans the way browsers and curl users write them.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
