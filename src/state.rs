use anyhow::{anyhow, Context};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::db::{create_db_pool, DatabaseSettings};
use crate::services::{FetchSettings, TranscriptService};
use crate::store::{MemoryTranscriptStore, PgTranscriptStore, TranscriptStore};
use crate::throttle::UpstreamThrottle;
use crate::upstream::{HttpTranscriptSource, TranscriptSource};

/// Estado compartido de la aplicación.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub transcripts: Arc<TranscriptService>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let backend = config.database.backend;
        let (store, db_pool): (Arc<dyn TranscriptStore>, Option<PgPool>) = match backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database
                    .url
                    .as_deref()
                    .ok_or_else(|| {
                        anyhow!("DATABASE_URL must be set when STORE_BACKEND=postgres")
                    })?;
                let pool = create_db_pool(database_url, &DatabaseSettings::from(&config.database))
                    .await
                    .context("connecting to transcript cache database")?;
                let store = PgTranscriptStore::new(pool.clone());
                store.ensure_schema().await?;
                (Arc::new(store), Some(pool))
            }
            StoreBackend::Memory => {
                info!("ℹ️ STORE_BACKEND=memory: cache is not persisted across restarts");
                (Arc::new(MemoryTranscriptStore::new()), None)
            }
        };

        let source = HttpTranscriptSource::new(
            config.upstream.base_url.clone(),
            Duration::from_secs(config.upstream.timeout_seconds),
        )?;

        Ok(Self::from_parts(config, store, Arc::new(source), db_pool))
    }

    /// Assemble state around an already-built store and source.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn TranscriptStore>,
        source: Arc<dyn TranscriptSource>,
        db_pool: Option<PgPool>,
    ) -> Self {
        let throttle = Arc::new(UpstreamThrottle::new(config.upstream.min_interval));
        info!(
            "⏱️ Upstream throttle: one call every {}ms",
            throttle.min_interval().as_millis()
        );

        let settings = FetchSettings {
            supported_formats: config.cache.supported_formats.clone(),
            default_languages: config.cache.default_languages.clone(),
        };
        let transcripts = Arc::new(TranscriptService::new(store, source, throttle, settings));

        Self {
            config: Arc::new(config),
            transcripts,
            db_pool,
        }
    }
}
