//! Mediaforge daemon — media-processing task pipeline worker.
//!
//! Main entry point that wires all crates together and runs the worker
//! loop plus the maintenance scheduler. Exits non-zero only on an
//! unrecoverable startup failure (bad configuration, unreachable queue
//! store); once the loop is running, every task-level failure is contained.

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use mediaforge_core::config::AppConfig;
use mediaforge_core::error::AppError;
use mediaforge_database::repositories::task::TaskRepository;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by MEDIAFORGE_ENV.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("MEDIAFORGE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Mediaforge v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Create data directories ──────────────────────────
    create_data_directories(&config).await?;

    // ── Step 2: Queue store connection + migrations ──────────────
    tracing::info!("Connecting to queue store...");
    let pool = mediaforge_database::connection::DatabasePool::connect(&config.database)
        .await?
        .into_pool();

    mediaforge_database::migration::run_migrations(&pool).await?;

    // ── Step 3: Wire the pipeline ────────────────────────────────
    let pipeline =
        mediaforge_worker::bootstrap::build(&config, TaskRepository::new(pool)).await?;
    pipeline.scheduler.start().await?;

    // ── Step 4: Run until a shutdown signal arrives ──────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_signal_listener(shutdown_tx);

    if config.worker.enabled {
        pipeline.runner.run(shutdown_rx).await;
    } else {
        tracing::warn!("Worker loop disabled by configuration; only maintenance runs");
        let mut shutdown_rx = shutdown_rx;
        let _ = shutdown_rx.changed().await;
    }

    let mut scheduler = pipeline.scheduler;
    scheduler.shutdown().await?;
    tracing::info!("Mediaforge stopped");
    Ok(())
}

/// Flip the shutdown flag on SIGINT or SIGTERM.
fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}

/// Create the working directories the pipeline expects.
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    for dir in [
        &config.worker.work_root,
        &config.delivery.spool_root,
        &config.delivery.outbox_root,
        &config.storage.staging_root,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create directory {dir}: {e}")))?;
    }
    Ok(())
}
