//! CLI command definitions and dispatch.

pub mod cancel;
pub mod migrate;
pub mod status;
pub mod submit;
pub mod worker;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use mediaforge_core::error::AppError;

/// Mediaforge — media-processing task pipeline
#[derive(Debug, Parser)]
#[command(name = "mediaforge", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment overlay (config/<env>.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a new task into the queue
    Submit(submit::SubmitArgs),
    /// Show queue status and recent tasks
    Status(status::StatusArgs),
    /// Request cancellation of a task
    Cancel(cancel::CancelArgs),
    /// Run the worker loop in the foreground
    Worker(worker::WorkerArgs),
    /// Run database migrations
    Migrate,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Submit(args) => submit::execute(args, &self.env).await,
            Commands::Status(args) => status::execute(args, &self.env, self.format).await,
            Commands::Cancel(args) => cancel::execute(args, &self.env).await,
            Commands::Worker(args) => worker::execute(args, &self.env).await,
            Commands::Migrate => migrate::execute(&self.env).await,
        }
    }
}

/// Helper: load configuration for the given environment
pub fn load_config(env: &str) -> Result<mediaforge_core::config::AppConfig, AppError> {
    mediaforge_core::config::AppConfig::load(env)
}

/// Helper: create a database pool from config
pub async fn create_db_pool(
    config: &mediaforge_core::config::AppConfig,
) -> Result<sqlx::PgPool, AppError> {
    let pool = mediaforge_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
