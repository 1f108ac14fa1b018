use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;
use error::AppError;
use tts::{EdgeTtsEngine, TtsService};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Speech Gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Voice: {}", config.voice);
    tracing::info!("Engine: {}", config.engine_bin.display());

    let engine = Arc::new(EdgeTtsEngine::new(config.engine_bin.clone()));
    let tts = TtsService::new(engine, config.voice.clone(), config.output_dir.clone());
    tts.prepare().await?;
    tracing::info!("Output directory: {}", tts.output_dir().display());

    let state = Arc::new(AppState {
        tts,
        max_upload_bytes: config.max_upload_bytes,
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Starting server on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
