use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache_key::CacheKey;
use crate::models::{CacheEntry, SelectedTrack};
use crate::store::{advance_fetched_at, purge_cutoff, StoreError, TranscriptStore};

/// In-process store for tests and local runs without Postgres.
/// Per-key atomicity comes from DashMap's shard locks.
#[derive(Clone, Default)]
pub struct MemoryTranscriptStore {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a row in as-is, keeping its `fetched_at`. Used to seed fixtures.
    pub fn insert_entry(&self, entry: CacheEntry) {
        self.entries.insert(entry.key(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn upsert(
        &self,
        key: &CacheKey,
        track: &SelectedTrack,
        content: &str,
    ) -> Result<CacheEntry, StoreError> {
        let now = Utc::now();
        let stored = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let fetched_at = advance_fetched_at(Some(occupied.get().fetched_at), now);
                let entry = CacheEntry::new(key, track, content, fetched_at);
                occupied.insert(entry.clone());
                entry
            }
            Entry::Vacant(vacant) => {
                let entry = CacheEntry::new(key, track, content, now);
                vacant.insert(entry.clone());
                entry
            }
        };

        debug!("💾 Cached {} ({} bytes)", key, stored.content.len());
        Ok(stored)
    }

    async fn purge_older_than(&self, age: Duration) -> Result<u64, StoreError> {
        let Some(cutoff) = purge_cutoff(Utc::now(), age) else {
            info!(
                "🧹 Purge age of {} days reaches past the calendar, nothing to purge",
                age.num_days()
            );
            return Ok(0);
        };
        let mut purged = 0u64;
        self.entries.retain(|_, entry| {
            let keep = entry.fetched_at >= cutoff;
            if !keep {
                purged += 1;
            }
            keep
        });

        info!("🧹 Purged {} in-memory transcript entries older than {}", purged, cutoff);
        Ok(purged)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
