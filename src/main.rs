use anyhow::Result;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;
use transcript_cache_ws::{
    config::Config, create_app_router, state::AppState, tasks::start_cache_purge_scheduler,
};

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Carga las variables de entorno desde el archivo .env. Falla silenciosamente si no existe.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let port = config.server.port;
    let purge_cron = config.cache.purge_cron.clone();
    let retention = config.retention();

    let app_state = AppState::new(config).await?;
    info!("🚀 Application state initialized (store: {})", app_state.transcripts.store_backend());

    // Keep the scheduler handle alive for the lifetime of the server
    let _purge_scheduler = if purge_cron.is_empty() {
        info!("ℹ️ PURGE_CRON empty: scheduled cache purge disabled");
        None
    } else {
        let service = app_state.transcripts.clone();
        Some(start_cache_purge_scheduler(service, &purge_cron, retention).await?)
    };

    let app = create_app_router(Arc::new(app_state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
