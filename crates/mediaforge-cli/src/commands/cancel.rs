//! Task cancellation command.

use clap::Args;
use uuid::Uuid;

use mediaforge_core::error::AppError;
use mediaforge_database::repositories::task::TaskRepository;

use crate::output;

/// Arguments for the cancel command
#[derive(Debug, Args)]
pub struct CancelArgs {
    /// Id of the task to cancel
    pub id: Uuid,
}

/// Execute the cancel command.
///
/// Cancellation is a request: the worker observes the flag at its next
/// phase boundary, so an in-flight engine step still runs to completion.
pub async fn execute(args: &CancelArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let repo = TaskRepository::new(pool);

    if repo.request_cancel(args.id).await? {
        output::print_success(&format!("Cancellation requested for {}", args.id));
    } else {
        output::print_warning(&format!(
            "Task {} is not pending or processing; nothing to cancel",
            args.id
        ));
    }
    Ok(())
}
