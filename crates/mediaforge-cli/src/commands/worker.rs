//! Foreground worker command.

use clap::Args;
use tokio::sync::watch;

use mediaforge_core::error::AppError;
use mediaforge_database::repositories::task::TaskRepository;

use crate::output;

/// Arguments for the worker command
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Skip running migrations before starting
    #[arg(long)]
    pub no_migrate: bool,
}

/// Execute the worker command: run the claim loop until Ctrl-C.
pub async fn execute(args: &WorkerArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    if !args.no_migrate {
        mediaforge_database::migration::run_migrations(&pool).await?;
    }

    let pipeline =
        mediaforge_worker::bootstrap::build(&config, TaskRepository::new(pool)).await?;
    pipeline.scheduler.start().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    output::print_success("Worker running; Ctrl-C to stop");
    pipeline.runner.run(shutdown_rx).await;

    let mut scheduler = pipeline.scheduler;
    scheduler.shutdown().await?;
    Ok(())
}
