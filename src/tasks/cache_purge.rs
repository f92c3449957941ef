use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::TranscriptService;

/// Inicia el scheduler de purga por retención del cache de transcripciones
pub async fn start_cache_purge_scheduler(
    transcripts: Arc<TranscriptService>,
    cron: &str,
    retention: chrono::Duration,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let transcripts = Arc::clone(&transcripts);

        Box::pin(async move {
            tracing::info!("⏰ Executing scheduled transcript cache purge");
            execute_purge(&transcripts, retention).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(
        "✅ Cache purge scheduler started ({}; retention {} days)",
        cron,
        retention.num_days()
    );

    Ok(scheduler)
}

async fn execute_purge(transcripts: &TranscriptService, retention: chrono::Duration) {
    let start = std::time::Instant::now();

    match transcripts.purge_older_than(retention).await {
        Ok(purged) => tracing::info!(
            "🧹 Scheduled purge removed {} entries in {}ms",
            purged,
            start.elapsed().as_millis()
        ),
        Err(e) => tracing::error!("❌ Scheduled purge failed: {}", e),
    }
}
