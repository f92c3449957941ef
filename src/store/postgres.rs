use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{error, info};

use crate::cache_key::CacheKey;
use crate::models::{CacheEntry, SelectedTrack};
use crate::store::{purge_cutoff, StoreError, TranscriptStore};

// ============================================================================
// SCHEMA
// ============================================================================

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS transcript_cache (
        video_id      TEXT        NOT NULL,
        language_key  TEXT        NOT NULL,
        format        TEXT        NOT NULL,
        language      TEXT        NOT NULL DEFAULT '',
        language_code TEXT        NOT NULL DEFAULT '',
        is_generated  BOOLEAN     NOT NULL DEFAULT FALSE,
        content       TEXT        NOT NULL,
        fingerprint   TEXT        NOT NULL,
        fetched_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (video_id, language_key, format)
    )
"#;

// Tables created before track metadata was stored
const ADD_TRACK_COLUMNS: &str = r#"
    ALTER TABLE transcript_cache
        ADD COLUMN IF NOT EXISTS language      TEXT    NOT NULL DEFAULT '',
        ADD COLUMN IF NOT EXISTS language_code TEXT    NOT NULL DEFAULT '',
        ADD COLUMN IF NOT EXISTS is_generated  BOOLEAN NOT NULL DEFAULT FALSE
"#;

const CREATE_FETCHED_AT_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_transcript_cache_fetched_at
        ON transcript_cache (fetched_at ASC)
"#;

// ============================================================================
// QUERIES
// ============================================================================

const SELECT_ENTRY: &str = r#"
    SELECT video_id, language_key, format, language, language_code, is_generated,
           content, fingerprint, fetched_at
    FROM transcript_cache
    WHERE video_id = $1 AND language_key = $2 AND format = $3
"#;

// fetched_at must move forward even if two writes land in the same microsecond.
const UPSERT_ENTRY: &str = r#"
    INSERT INTO transcript_cache
        (video_id, language_key, format, language, language_code, is_generated,
         content, fingerprint, fetched_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, clock_timestamp())
    ON CONFLICT (video_id, language_key, format) DO UPDATE SET
        language      = EXCLUDED.language,
        language_code = EXCLUDED.language_code,
        is_generated  = EXCLUDED.is_generated,
        content       = EXCLUDED.content,
        fingerprint   = EXCLUDED.fingerprint,
        fetched_at    = GREATEST(
            EXCLUDED.fetched_at,
            transcript_cache.fetched_at + INTERVAL '1 microsecond'
        )
    RETURNING video_id, language_key, format, language, language_code, is_generated,
              content, fingerprint, fetched_at
"#;

// Cutoff on the database clock, the same clock that stamps fetched_at.
const DELETE_OLDER_THAN: &str = r#"
    DELETE FROM transcript_cache
    WHERE fetched_at < now() - make_interval(secs => $1)
"#;

/// Postgres-backed cache. Concurrency control is the upsert's own atomicity.
#[derive(Clone)]
pub struct PgTranscriptStore {
    pool: PgPool,
}

impl PgTranscriptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the cache table and its purge index if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(ADD_TRACK_COLUMNS).execute(&self.pool).await?;
        sqlx::query(CREATE_FETCHED_AT_INDEX).execute(&self.pool).await?;
        info!("✅ transcript_cache schema ready");
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for PgTranscriptStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        sqlx::query_as::<_, CacheEntry>(SELECT_ENTRY)
            .bind(&key.video_id)
            .bind(&key.language_key)
            .bind(&key.format)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Error reading {}: {}", key, e);
                StoreError::Database(e)
            })
    }

    async fn upsert(
        &self,
        key: &CacheKey,
        track: &SelectedTrack,
        content: &str,
    ) -> Result<CacheEntry, StoreError> {
        let fingerprint = crate::fingerprint::compute(content);

        sqlx::query_as::<_, CacheEntry>(UPSERT_ENTRY)
            .bind(&key.video_id)
            .bind(&key.language_key)
            .bind(&key.format)
            .bind(&track.language)
            .bind(&track.language_code)
            .bind(track.is_generated)
            .bind(content)
            .bind(&fingerprint)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Error upserting {}: {}", key, e);
                StoreError::Database(e)
            })
    }

    async fn purge_older_than(&self, age: Duration) -> Result<u64, StoreError> {
        if purge_cutoff(Utc::now(), age).is_none() {
            info!(
                "🧹 Purge age of {} days reaches past the calendar, nothing to purge",
                age.num_days()
            );
            return Ok(0);
        }

        let age_secs = age.num_milliseconds() as f64 / 1000.0;
        let result = sqlx::query(DELETE_OLDER_THAN)
            .bind(age_secs)
            .execute(&self.pool)
            .await?;

        info!(
            "🧹 Purged {} transcript_cache rows older than {} days",
            result.rows_affected(),
            age.num_days()
        );
        Ok(result.rows_affected())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
