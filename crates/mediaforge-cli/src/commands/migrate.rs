//! Migration command.

use mediaforge_core::error::AppError;

use crate::output;

/// Execute the migrate command
pub async fn execute(env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    mediaforge_database::migration::run_migrations(&pool).await?;
    output::print_success("Migrations applied");
    Ok(())
}
