//! Cache key generation utilities
//!
//! A cached transcript is addressed by the triple (video id, language key, format).
//! The language key is derived from the caller's ordered language preferences, so
//! `["pl", "en"]` and `["en", "pl"]` are different slots.

use serde::{Deserialize, Serialize};

/// Separator used when joining cleaned language codes into a key.
pub const LANGUAGE_DELIMITER: char = ',';

/// Fallback preference pair when neither the request nor the configuration supply one.
pub const DEFAULT_LANGUAGES: [&str; 2] = ["pl", "en"];

/// Appended to the format slot when upstream formatting tags are kept.
pub const PRESERVE_FORMATTING_SUFFIX: &str = "+formatting";

/// Cleaned language preferences plus the canonical key derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreference {
    pub languages: Vec<String>,
    pub key: String,
}

/// Composite primary key of one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub video_id: String,
    pub language_key: String,
    pub format: String,
}

impl CacheKey {
    pub fn new(
        video_id: impl Into<String>,
        language_key: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            language_key: language_key.into(),
            format: format.into(),
        }
    }
}

/// Format component of the key. Transcripts fetched with formatting tags kept
/// render differently, so they get their own slot (`text` vs `text+formatting`).
pub fn format_slot(format: &str, preserve_formatting: bool) -> String {
    if preserve_formatting {
        format!("{}{}", format, PRESERVE_FORMATTING_SUFFIX)
    } else {
        format.to_string()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transcript:{}:{}:{}", self.video_id, self.language_key, self.format)
    }
}

/// Trim, drop blanks and drop repeats (first occurrence wins). Entries that
/// themselves contain the delimiter are split first, so `"pl,en"` counts as two codes.
fn clean<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        for code in entry.as_ref().split(LANGUAGE_DELIMITER) {
            let code = code.trim();
            if code.is_empty() || cleaned.iter().any(|seen| seen == code) {
                continue;
            }
            cleaned.push(code.to_string());
        }
    }
    cleaned
}

/// Normalize a raw language preference list into its cleaned form and cache key.
///
/// When nothing usable remains, `defaults` is substituted (and if that is empty
/// too, [`DEFAULT_LANGUAGES`]), so the returned key is never empty.
pub fn normalize_languages<S: AsRef<str>>(raw: &[S], defaults: &[String]) -> LanguagePreference {
    let mut languages = clean(raw);
    if languages.is_empty() {
        languages = clean(defaults);
    }
    if languages.is_empty() {
        languages = DEFAULT_LANGUAGES.iter().map(|code| code.to_string()).collect();
    }

    let key = languages.join(&LANGUAGE_DELIMITER.to_string());
    LanguagePreference { languages, key }
}
