//! Durable transcript cache keyed by (video id, language key, format).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::cache_key::CacheKey;
use crate::models::{CacheEntry, SelectedTrack};

pub use memory::MemoryTranscriptStore;
pub use postgres::PgTranscriptStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Point lookup. A miss is `Ok(None)`.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;

    /// Insert or overwrite the row for `key`. The fingerprint is computed here and
    /// `fetched_at` always moves forward for the key.
    async fn upsert(
        &self,
        key: &CacheKey,
        track: &SelectedTrack,
        content: &str,
    ) -> Result<CacheEntry, StoreError>;

    /// Delete rows fetched strictly before `now - age`; returns how many went away.
    /// An age reaching past the representable calendar purges nothing.
    async fn purge_older_than(&self, age: Duration) -> Result<u64, StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Next `fetched_at` for a key: now, unless the clock hasn't moved past the
/// previous write, in which case one microsecond after it.
pub(crate) fn advance_fetched_at(
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous >= now => previous + Duration::microseconds(1),
        _ => now,
    }
}

/// `now - age`, or `None` when that falls outside the representable range.
pub(crate) fn purge_cutoff(now: DateTime<Utc>, age: Duration) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_fetched_at() {
        let now = Utc::now();
        assert_eq!(advance_fetched_at(None, now), now);
        assert_eq!(advance_fetched_at(Some(now - Duration::seconds(5)), now), now);
        assert_eq!(
            advance_fetched_at(Some(now), now),
            now + Duration::microseconds(1)
        );
    }

    #[test]
    fn test_purge_cutoff_out_of_range() {
        let now = Utc::now();
        assert_eq!(purge_cutoff(now, Duration::days(60)), Some(now - Duration::days(60)));

        let huge = Duration::try_days(100_000_000).unwrap();
        assert_eq!(purge_cutoff(now, huge), None);
    }
}
