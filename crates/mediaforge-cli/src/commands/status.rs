//! Queue status command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use mediaforge_core::error::AppError;
use mediaforge_database::repositories::task::TaskRepository;
use mediaforge_entity::task::status::TaskStatus;

use crate::output::{self, OutputFormat};

/// Arguments for the status command
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// How many recent tasks to list
    #[arg(long, default_value_t = 10)]
    pub limit: i64,
}

/// One row of the recent-task table
#[derive(Debug, Serialize, Tabled)]
struct TaskRow {
    /// Task id
    id: String,
    /// Kind
    kind: String,
    /// Status
    status: String,
    /// Failed phase, if any
    phase: String,
    /// Submission time
    created: String,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let repo = TaskRepository::new(pool);

    println!("Queue Status:");
    for status in [
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Done,
        TaskStatus::Error,
        TaskStatus::Cancelled,
    ] {
        let count = repo.count_by_status(status).await?;
        output::print_kv(status.as_str(), &count.to_string());
    }

    let recent = repo.find_recent(args.limit).await?;
    let rows: Vec<TaskRow> = recent
        .iter()
        .map(|task| TaskRow {
            id: task.id.to_string(),
            kind: task.kind.to_string(),
            status: task.status.to_string(),
            phase: task.error_phase.clone().unwrap_or_default(),
            created: task.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    println!();
    output::print_list(&rows, format);
    Ok(())
}
