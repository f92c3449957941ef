// ============================================================================
// TRANSCRIPT SERVICE - cache lookup, throttled upstream fetch, persistence
// ============================================================================

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache_key::{format_slot, normalize_languages, CacheKey};
use crate::error::{Result, TranscriptError};
use crate::formatter::{plain_text, TranscriptFormat};
use crate::models::{CacheStatus, TranscriptInfo, TranscriptRequest, TranscriptResponse};
use crate::observability::{record_cache_lookup, record_purge, record_upstream_call};
use crate::store::TranscriptStore;
use crate::throttle::UpstreamThrottle;
use crate::upstream::TranscriptSource;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub supported_formats: Vec<TranscriptFormat>,
    pub default_languages: Vec<String>,
}

pub struct TranscriptService {
    store: Arc<dyn TranscriptStore>,
    source: Arc<dyn TranscriptSource>,
    throttle: Arc<UpstreamThrottle>,
    settings: FetchSettings,
}

impl TranscriptService {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        source: Arc<dyn TranscriptSource>,
        throttle: Arc<UpstreamThrottle>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            store,
            source,
            throttle,
            settings,
        }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    fn resolve_format(&self, tag: &str) -> Result<TranscriptFormat> {
        tag.parse::<TranscriptFormat>()
            .ok()
            .filter(|format| self.settings.supported_formats.contains(format))
            .ok_or_else(|| TranscriptError::unsupported_format(tag))
    }

    /// Serve a transcript from cache, or fetch it upstream and cache it.
    ///
    /// A forced request skips the lookup and always overwrites the cached row. A
    /// cached row whose fingerprint no longer matches its content is refetched.
    pub async fn fetch(&self, request: TranscriptRequest) -> Result<TranscriptResponse> {
        let format = self.resolve_format(&request.format)?;
        let preference = normalize_languages(&request.languages, &self.settings.default_languages);
        let slot = format_slot(format.as_str(), request.preserve_formatting);
        let key = CacheKey::new(&request.video_id, &preference.key, slot);

        if request.force {
            record_cache_lookup("bypass");
            debug!("🔄 Forced refresh for {}", key);
        } else {
            match self.store.get(&key).await? {
                Some(entry) if entry.is_intact() => {
                    record_cache_lookup("hit");
                    debug!("✅ Cache hit for {}", key);
                    return Ok(TranscriptResponse::from_entry(
                        entry,
                        preference.languages,
                        format,
                        request.preserve_formatting,
                        CacheStatus::Hit,
                    ));
                }
                Some(_) => {
                    record_cache_lookup("corrupt");
                    warn!("⚠️ Fingerprint mismatch for {}, refetching", key);
                }
                None => {
                    record_cache_lookup("miss");
                    debug!("Cache miss for {}", key);
                }
            }
        }

        self.throttle.acquire().await;

        let start = Instant::now();
        let fetched = self
            .source
            .fetch(&request.video_id, &preference.languages, request.preserve_formatting)
            .await
            .map_err(|cause| {
                warn!("❌ Upstream fetch for {} failed: {}", key, cause);
                record_upstream_call("fetch", cause.kind().as_str());
                TranscriptError::from(cause)
            })?;
        record_upstream_call("fetch", "success");

        let text = plain_text(&fetched.segments);
        if text.is_empty() {
            warn!("⚠️ Upstream returned no usable text for {}, not caching", key);
            return Err(TranscriptError::EmptyContent {
                video_id: request.video_id,
            });
        }

        let content = match format {
            TranscriptFormat::Text => text,
            other => other.render(&fetched),
        };

        let entry = self.store.upsert(&key, &fetched.track, &content).await?;
        info!(
            "📥 Fetched {} ({}, {} segments, {} bytes) in {}ms",
            key,
            fetched.track.language_code,
            fetched.segments.len(),
            entry.content.len(),
            start.elapsed().as_millis()
        );

        Ok(TranscriptResponse::from_entry(
            entry,
            preference.languages,
            format,
            request.preserve_formatting,
            CacheStatus::Miss,
        ))
    }

    /// Tracks the upstream offers for a video. Throttled, never cached.
    pub async fn available(&self, video_id: &str) -> Result<Vec<TranscriptInfo>> {
        self.throttle.acquire().await;

        match self.source.list(video_id).await {
            Ok(transcripts) => {
                record_upstream_call("list", "success");
                Ok(transcripts)
            }
            Err(cause) => {
                warn!("❌ Upstream list for {} failed: {}", video_id, cause);
                record_upstream_call("list", cause.kind().as_str());
                Err(cause.into())
            }
        }
    }

    /// Drop cache rows older than `age`.
    pub async fn purge_older_than(&self, age: chrono::Duration) -> Result<u64> {
        let purged = self.store.purge_older_than(age).await?;
        record_purge(purged);
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CacheEntry, FetchedTranscript, Segment, SelectedTrack};
    use crate::store::MemoryTranscriptStore;
    use crate::upstream::{UpstreamError, UpstreamFailureKind};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    type Answer = std::result::Result<FetchedTranscript, UpstreamError>;

    /// Upstream stub returning a fixed answer and counting calls
    struct StubSource {
        answer: Mutex<Answer>,
        calls: AtomicUsize,
        last_languages: Mutex<Vec<String>>,
        last_preserve_formatting: AtomicBool,
    }

    impl StubSource {
        fn answering(answer: Answer) -> Arc<Self> {
            Arc::new(Self {
                answer: Mutex::new(answer),
                calls: AtomicUsize::new(0),
                last_languages: Mutex::new(Vec::new()),
                last_preserve_formatting: AtomicBool::new(false),
            })
        }

        fn returning(segments: Vec<Segment>) -> Arc<Self> {
            Self::answering(Ok(FetchedTranscript::new(track(), segments)))
        }

        fn failing(error: UpstreamError) -> Arc<Self> {
            Self::answering(Err(error))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscriptSource for StubSource {
        async fn fetch(
            &self,
            _video_id: &str,
            languages: &[String],
            preserve_formatting: bool,
        ) -> std::result::Result<FetchedTranscript, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_languages.lock().unwrap() = languages.to_vec();
            self.last_preserve_formatting
                .store(preserve_formatting, Ordering::SeqCst);
            self.answer.lock().unwrap().clone()
        }

        async fn list(
            &self,
            _video_id: &str,
        ) -> std::result::Result<Vec<TranscriptInfo>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![TranscriptInfo {
                language: "English".into(),
                language_code: "en".into(),
                is_generated: true,
                is_translatable: true,
            }])
        }
    }

    fn track() -> SelectedTrack {
        SelectedTrack::new("English (auto-generated)", "en", true)
    }

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new("  first line", 0.0, 1.0),
            Segment::new("second line  ", 1.0, 1.0),
        ]
    }

    fn service(store: &MemoryTranscriptStore, source: Arc<StubSource>) -> TranscriptService {
        service_with_formats(store, source, vec![TranscriptFormat::Text])
    }

    fn service_with_formats(
        store: &MemoryTranscriptStore,
        source: Arc<StubSource>,
        supported_formats: Vec<TranscriptFormat>,
    ) -> TranscriptService {
        TranscriptService::new(
            Arc::new(store.clone()),
            source,
            Arc::new(UpstreamThrottle::new(Duration::ZERO)),
            FetchSettings {
                supported_formats,
                default_languages: vec!["pl".into(), "en".into()],
            },
        )
    }

    fn request() -> TranscriptRequest {
        TranscriptRequest::new(
            "dQw4w9WgXcQ",
            vec!["en".into(), "en".into(), "pl".into()],
            "text",
        )
    }

    fn with_format(format: &str) -> TranscriptRequest {
        let mut req = request();
        req.format = format.into();
        req
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let first = service.fetch(request()).await.unwrap();
        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(first.content, "first line\nsecond line");
        assert_eq!(first.language_key, "en,pl");
        assert_eq!(source.calls(), 1);
        assert_eq!(*source.last_languages.lock().unwrap(), vec!["en", "pl"]);

        let second = service.fetch(request()).await.unwrap();
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(second.fingerprint, first.fingerprint);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_selected_track_is_returned_and_cached() {
        let store = MemoryTranscriptStore::new();
        let service = service(&store, StubSource::returning(segments()));

        let miss = service.fetch(request()).await.unwrap();
        assert_eq!(miss.language, "English (auto-generated)");
        assert_eq!(miss.language_code, "en");
        assert!(miss.is_generated);

        let hit = service.fetch(request()).await.unwrap();
        assert_eq!(hit.cache, CacheStatus::Hit);
        assert_eq!(hit.language_code, "en");
        assert!(hit.is_generated);
    }

    #[tokio::test]
    async fn test_forced_refresh_is_stable_and_advances_timestamp() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let first = service.fetch(request().forced()).await.unwrap();
        let second = service.fetch(request().forced()).await.unwrap();

        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(second.cache, CacheStatus::Miss);
        assert_eq!(first.content, second.content);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert!(second.fetched_at > first.fetched_at);
        assert_eq!(source.calls(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_refetched_and_overwritten() {
        let store = MemoryTranscriptStore::new();
        let key = CacheKey::new("dQw4w9WgXcQ", "en,pl", "text");
        let mut damaged = CacheEntry::new(&key, &track(), "first line\nsecond line", Utc::now());
        damaged.content = "first line\nsecond line\ntruncated garbage".to_string();
        store.insert_entry(damaged);

        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let response = service.fetch(request()).await.unwrap();
        assert_eq!(response.cache, CacheStatus::Miss);
        assert_eq!(response.content, "first line\nsecond line");
        assert_eq!(source.calls(), 1);

        let repaired = store.get(&key).await.unwrap().unwrap();
        assert!(repaired.is_intact());
        assert_eq!(repaired.content, "first line\nsecond line");
    }

    #[tokio::test]
    async fn test_empty_upstream_result_is_not_cached() {
        let store = MemoryTranscriptStore::new();
        let no_segments = service(&store, StubSource::returning(vec![]));

        let err = no_segments.fetch(request()).await.unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyContent { .. }));
        assert!(store.is_empty());

        let blank = vec![Segment::new("   ", 0.0, 1.0)];
        let blank_segments = service(&store, StubSource::returning(blank));
        let err = blank_segments.fetch(request()).await.unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyContent { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_fast() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let err = service.fetch(with_format("srt")).await.unwrap_err();
        assert!(matches!(err, TranscriptError::UnsupportedFormat { .. }));

        assert!(matches!(
            service.fetch(with_format("markdown")).await.unwrap_err(),
            TranscriptError::UnsupportedFormat { .. }
        ));

        assert_eq!(source.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_store_untouched() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::failing(UpstreamError::RequestBlocked);
        let service = service(&store, source.clone());

        match service.fetch(request()).await.unwrap_err() {
            TranscriptError::Upstream { kind, cause } => {
                assert_eq!(kind, UpstreamFailureKind::RateLimited);
                assert!(matches!(cause, UpstreamError::RequestBlocked));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_forced_refresh_overwrites_existing_entry() {
        let store = MemoryTranscriptStore::new();
        let key = CacheKey::new("dQw4w9WgXcQ", "en,pl", "text");
        store.upsert(&key, &track(), "stale content").await.unwrap();

        let source = StubSource::returning(segments());
        let service = service(&store, source);

        let hit = service.fetch(request()).await.unwrap();
        assert_eq!(hit.content, "stale content");

        let refreshed = service.fetch(request().forced()).await.unwrap();
        assert_eq!(refreshed.content, "first line\nsecond line");
        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.content, "first line\nsecond line");
    }

    #[tokio::test]
    async fn test_srt_when_enabled() {
        let store = MemoryTranscriptStore::new();
        let formats = vec![TranscriptFormat::Text, TranscriptFormat::Srt];
        let service = service_with_formats(&store, StubSource::returning(segments()), formats);

        let response = service.fetch(with_format("srt")).await.unwrap();
        assert_eq!(response.format, "srt");
        assert!(response
            .content
            .starts_with("1\n00:00:00,000 --> 00:00:01,000\nfirst line"));
        assert!(store.contains(&CacheKey::new("dQw4w9WgXcQ", "en,pl", "srt")));
    }

    #[tokio::test]
    async fn test_raw_and_pretty_when_enabled() {
        let store = MemoryTranscriptStore::new();
        let formats = vec![TranscriptFormat::Raw, TranscriptFormat::Pretty];
        let service = service_with_formats(&store, StubSource::returning(segments()), formats);

        let raw = service.fetch(with_format("raw")).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&raw.content).unwrap();
        assert_eq!(body["language_code"], "en");
        assert_eq!(body["is_generated"], true);
        assert_eq!(body["snippets"].as_array().unwrap().len(), 2);

        let pretty = service.fetch(with_format("pretty")).await.unwrap();
        assert!(pretty.content.contains("\n  {"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_preserve_formatting_uses_its_own_slot() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let plain = service.fetch(request()).await.unwrap();
        assert!(!plain.preserve_formatting);
        assert!(!source.last_preserve_formatting.load(Ordering::SeqCst));

        let formatted = service.fetch(request().with_formatting()).await.unwrap();
        assert_eq!(formatted.cache, CacheStatus::Miss);
        assert_eq!(formatted.format, "text");
        assert!(formatted.preserve_formatting);
        assert!(source.last_preserve_formatting.load(Ordering::SeqCst));
        assert_eq!(source.calls(), 2);
        assert!(store.contains(&CacheKey::new("dQw4w9WgXcQ", "en,pl", "text+formatting")));

        let again = service.fetch(request().with_formatting()).await.unwrap();
        assert_eq!(again.cache, CacheStatus::Hit);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_languages_use_default_key() {
        let store = MemoryTranscriptStore::new();
        let service = service(&store, StubSource::returning(segments()));

        let response = service
            .fetch(TranscriptRequest::new("dQw4w9WgXcQ", vec![], "text"))
            .await
            .unwrap();
        assert_eq!(response.language_key, "pl,en");
    }

    #[tokio::test]
    async fn test_purge_through_service() {
        let store = MemoryTranscriptStore::new();
        let now = Utc::now();
        for (video, days) in [("a", 90), ("b", 30), ("c", 1)] {
            store.insert_entry(CacheEntry::new(
                &CacheKey::new(video, "pl,en", "text"),
                &track(),
                "content",
                now - chrono::Duration::days(days),
            ));
        }
        let service = service(&store, StubSource::returning(segments()));

        let purged = service
            .purge_older_than(chrono::Duration::days(60))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_available_goes_upstream() {
        let store = MemoryTranscriptStore::new();
        let source = StubSource::returning(segments());
        let service = service(&store, source.clone());

        let listed = service.available("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(listed[0].language_code, "en");
        assert_eq!(source.calls(), 1);
    }
}
