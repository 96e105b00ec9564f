//! Task submission command.

use clap::Args;

use mediaforge_core::error::AppError;
use mediaforge_core::traits::transport::FileReference;
use mediaforge_database::repositories::task::TaskRepository;
use mediaforge_entity::processing::ProcessingConfig;
use mediaforge_entity::task::model::NewTask;
use mediaforge_entity::task::source::TaskSource;
use mediaforge_entity::task::status::TaskKind;

use crate::output;

/// Arguments for task submission
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Submitting-user identifier
    #[arg(long)]
    pub owner: i64,

    /// Task kind
    #[arg(long, value_parser = parse_kind, default_value = "video")]
    pub kind: TaskKind,

    /// Remote URL source
    #[arg(long, conflicts_with = "file_id")]
    pub url: Option<String>,

    /// Provider format identifier for URL sources
    #[arg(long, requires = "url")]
    pub format_id: Option<String>,

    /// Transport file-id source (resolved against the spool)
    #[arg(long)]
    pub file_id: Option<String>,

    /// Channel the transport file lives in
    #[arg(long, default_value_t = 0, requires = "file_id")]
    pub channel: i64,

    /// Message id of the transport file
    #[arg(long, default_value_t = 0, requires = "file_id")]
    pub message_id: i64,

    /// Processing options as a JSON object (e.g. '{"quality":"720p"}')
    #[arg(long, default_value = "{}")]
    pub options: String,
}

fn parse_kind(value: &str) -> Result<TaskKind, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown task kind '{value}'"))
}

/// Execute the submit command
pub async fn execute(args: &SubmitArgs, env: &str) -> Result<(), AppError> {
    let source = match (&args.url, &args.file_id) {
        (Some(url), None) => TaskSource::Url {
            url: url.clone(),
            format_id: args.format_id.clone(),
        },
        (None, Some(file_id)) => TaskSource::TransportFile(FileReference {
            channel_id: args.channel,
            message_id: args.message_id,
            file_id: file_id.clone(),
            file_name: None,
            size_bytes: None,
        }),
        _ => {
            return Err(AppError::validation(
                "Exactly one of --url or --file-id is required",
            ));
        }
    };

    let config: ProcessingConfig = serde_json::from_str(&args.options)
        .map_err(|e| AppError::validation(format!("Invalid --options JSON: {e}")))?;

    let app_config = super::load_config(env)?;
    let pool = super::create_db_pool(&app_config).await?;
    let repo = TaskRepository::new(pool);

    let task = repo
        .submit(&NewTask {
            owner_id: args.owner,
            kind: args.kind,
            source,
            config,
        })
        .await?;

    output::print_success(&format!("Task submitted (id: {})", task.id));
    Ok(())
}
