//! Task processor: phase orchestration with a strict error taxonomy and
//! guaranteed workspace cleanup.
//!
//! Phases run in order — acquire, probe + plan, execute, stage, deliver —
//! with each phase announced to the status sink before it starts. The cancel
//! flag is observed at phase boundaries only: an in-flight engine step runs
//! to completion or failure before a cancellation request takes effect.
//! Staging is the one non-fatal phase; everything else converts a typed
//! failure into a terminal `error` state carrying the phase label, a short
//! summary, and a bounded engine log excerpt. The workspace is removed on
//! every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use mediaforge_acquire::SourceAcquirer;
use mediaforge_core::config::delivery::DeliveryConfig;
use mediaforge_core::config::worker::WorkerConfig;
use mediaforge_core::error::AppError;
use mediaforge_core::traits::status::{Phase, StatusSink};
use mediaforge_core::traits::transport::{DeliveryRequest, TransportClient};
use mediaforge_engine::{CommandPlanner, MediaProber, PlanRequest, StepExecutor};
use mediaforge_entity::task::model::{Task, TaskErrorInfo};
use mediaforge_entity::task::source::TaskSource;
use mediaforge_entity::task::status::TaskKind;
use mediaforge_storage::StagingService;

use crate::guard::ResourceGuard;
use crate::queue::QueueStore;
use crate::workspace::TaskWorkspace;

/// Terminal pipeline outcomes short of an error.
enum Outcome {
    Done,
    Cancelled,
}

/// A phase failure on its way to the task's error record.
struct PhaseFailure {
    phase: Phase,
    error: AppError,
    log: Option<String>,
}

impl PhaseFailure {
    fn new(phase: Phase, error: AppError) -> Self {
        Self {
            phase,
            error,
            log: None,
        }
    }
}

/// Orchestrates one task attempt end to end.
#[derive(Debug, Clone)]
pub struct TaskProcessor {
    store: Arc<dyn QueueStore>,
    acquirer: SourceAcquirer,
    prober: MediaProber,
    planner: CommandPlanner,
    executor: StepExecutor,
    guard: Arc<ResourceGuard>,
    staging: StagingService,
    transport: Arc<dyn TransportClient>,
    sink: Arc<dyn StatusSink>,
    worker_config: WorkerConfig,
    delivery_config: DeliveryConfig,
}

impl TaskProcessor {
    /// Create a processor over its injected collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn QueueStore>,
        acquirer: SourceAcquirer,
        prober: MediaProber,
        planner: CommandPlanner,
        executor: StepExecutor,
        guard: Arc<ResourceGuard>,
        staging: StagingService,
        transport: Arc<dyn TransportClient>,
        sink: Arc<dyn StatusSink>,
        worker_config: WorkerConfig,
        delivery_config: DeliveryConfig,
    ) -> Self {
        Self {
            store,
            acquirer,
            prober,
            planner,
            executor,
            guard,
            staging,
            transport,
            sink,
            worker_config,
            delivery_config,
        }
    }

    /// Process one claimed task to a terminal state.
    ///
    /// Never returns an error: every failure is converted into the task's
    /// terminal `error` record so one bad task cannot take the worker loop
    /// down with it.
    pub async fn process(&self, task: Task) {
        let task_id = task.id;
        info!(task_id = %task_id, kind = %task.kind, "Processing task");

        let work_root = PathBuf::from(&self.worker_config.work_root);
        let workspace = match TaskWorkspace::create(&work_root, task_id).await {
            Ok(workspace) => workspace,
            Err(e) => {
                self.finish_error(task_id, PhaseFailure::new(Phase::Download, e))
                    .await;
                return;
            }
        };

        let result = self.run_pipeline(&task, &workspace).await;

        // Unconditional cleanup: acquired source, produced artifacts, and
        // staged intermediates all live under the workspace.
        workspace.remove().await;

        match result {
            Ok(Outcome::Done) => {
                if let Err(e) = self.store.mark_done(task_id).await {
                    error!(task_id = %task_id, error = %e, "Failed to persist done state");
                }
                info!(task_id = %task_id, "Task done");
            }
            Ok(Outcome::Cancelled) => {
                if let Err(e) = self.store.mark_cancelled(task_id).await {
                    error!(task_id = %task_id, error = %e, "Failed to persist cancelled state");
                }
                info!(task_id = %task_id, "Task cancelled");
            }
            Err(failure) => self.finish_error(task_id, failure).await,
        }
    }

    /// Persist a phase failure and tell the requester which phase broke.
    /// The requester sees a phase label and a short summary, never a trace.
    async fn finish_error(&self, task_id: Uuid, failure: PhaseFailure) {
        error!(
            task_id = %task_id,
            phase = %failure.phase,
            error = %failure.error,
            "Task failed"
        );

        self.sink
            .warn(
                task_id,
                &format!(
                    "Task failed during {}: {}",
                    failure.phase, failure.error.message
                ),
            )
            .await;

        let record = TaskErrorInfo {
            phase: failure.phase.as_str().to_string(),
            message: failure.error.message.clone(),
            log_excerpt: failure.log,
        };
        if let Err(e) = self.store.mark_error(task_id, &record).await {
            error!(task_id = %task_id, error = %e, "Failed to persist error state");
        }
    }

    async fn run_pipeline(
        &self,
        task: &Task,
        workspace: &TaskWorkspace,
    ) -> Result<Outcome, PhaseFailure> {
        let task_id = task.id;

        if self.cancel_requested(task_id).await {
            return Ok(Outcome::Cancelled);
        }

        // ── Phase 1: acquire ─────────────────────────────────────────
        self.sink
            .report(task_id, Phase::Download, "Fetching source")
            .await;

        self.guard
            .check_disk_space(workspace.path(), task.source.known_size().unwrap_or(0))
            .map_err(|e| PhaseFailure::new(Phase::Download, e))?;

        let input = workspace.file(&format!(
            "source_{}",
            sanitize_file_name(&task.source.display_name())
        ));
        let progress = self.progress_fn(task_id, Phase::Download);
        self.acquirer
            .acquire(&task.source, &input, &progress)
            .await
            .map_err(|e| PhaseFailure::new(Phase::Download, e))?;

        let side_audio = match &task.config.add_audio {
            Some(source) => Some(
                self.acquire_extra(source, workspace, "side_audio")
                    .await
                    .map_err(|e| PhaseFailure::new(Phase::Download, e))?,
            ),
            None => None,
        };
        let side_subtitle = match &task.config.add_subtitle {
            Some(source) => Some(
                self.acquire_extra(source, workspace, "side_subtitle")
                    .await
                    .map_err(|e| PhaseFailure::new(Phase::Download, e))?,
            ),
            None => None,
        };

        let mut join_inputs = vec![input.clone()];
        if let Some(parts) = &task.config.join_parts {
            for (index, part) in parts.iter().enumerate() {
                let path = self
                    .acquire_extra(part, workspace, &format!("part_{index:03}"))
                    .await
                    .map_err(|e| PhaseFailure::new(Phase::Download, e))?;
                join_inputs.push(path);
            }
        }

        if self.cancel_requested(task_id).await {
            return Ok(Outcome::Cancelled);
        }

        // ── Phase 2: probe + plan ────────────────────────────────────
        self.sink
            .report(task_id, Phase::Processing, "Inspecting media")
            .await;

        let media = self.prober.probe(&input).await;
        let needs_streams = !matches!(task.kind, TaskKind::Document | TaskKind::Archive);
        if needs_streams && media.is_empty() {
            return Err(PhaseFailure::new(
                Phase::Processing,
                AppError::invalid_media("Source has no readable media streams"),
            ));
        }

        let output_dir = workspace
            .output_dir()
            .await
            .map_err(|e| PhaseFailure::new(Phase::Processing, e))?;
        let output = output_dir.join(CommandPlanner::output_file_name(task, &media));

        let concat_list = if task.kind == TaskKind::Join {
            Some(
                write_concat_list(workspace, &join_inputs)
                    .await
                    .map_err(|e| PhaseFailure::new(Phase::Processing, e))?,
            )
        } else {
            None
        };

        let plan = self
            .planner
            .plan(&PlanRequest {
                task,
                media: &media,
                input: &input,
                output: &output,
                side_audio: side_audio.as_deref(),
                side_subtitle: side_subtitle.as_deref(),
                concat_list: concat_list.as_deref(),
            })
            .map_err(|e| PhaseFailure::new(Phase::Processing, e.into()))?;

        if self.cancel_requested(task_id).await {
            return Ok(Outcome::Cancelled);
        }

        // ── Phase 3: execute ─────────────────────────────────────────
        self.sink
            .report(
                task_id,
                Phase::Processing,
                &format!("Transforming ({} steps)", plan.len()),
            )
            .await;

        let input_size = tokio::fs::metadata(&input).await.map(|m| m.len()).unwrap_or(0);
        self.guard
            .check_disk_space(workspace.path(), input_size)
            .map_err(|e| PhaseFailure::new(Phase::Processing, e))?;

        // The CPU permit is held across the whole plan, not per step.
        let permit = self
            .guard
            .acquire_slot()
            .await
            .map_err(|e| PhaseFailure::new(Phase::Processing, e))?;

        for step in &plan.steps {
            if let Err(e) = self.executor.run(step).await {
                let log = e.log_excerpt().map(str::to_string);
                return Err(PhaseFailure {
                    phase: Phase::Processing,
                    error: e.into(),
                    log,
                });
            }
        }
        drop(permit);

        // An empty plan means pass-through: the acquired source is the
        // artifact.
        let artifacts = if plan.is_empty() {
            vec![input.clone()]
        } else {
            resolve_artifacts(plan.final_output().unwrap_or(&output)).await
        };
        if artifacts.is_empty() {
            return Err(PhaseFailure::new(
                Phase::Processing,
                AppError::engine("Plan completed without producing artifacts"),
            ));
        }

        if self.cancel_requested(task_id).await {
            return Ok(Outcome::Cancelled);
        }

        // ── Phase 4: stage (non-fatal) ───────────────────────────────
        // Delivering to the requester outranks mirroring; a staging failure
        // degrades to a single warning and the pipeline continues.
        if self.staging.is_enabled() {
            self.sink
                .report(task_id, Phase::Staging, "Copying to final destination")
                .await;
            for artifact in &artifacts {
                let name = file_name(artifact);
                if let Err(e) = self.staging.stage(artifact, &name).await {
                    warn!(task_id = %task_id, error = %e, "Staging failed, continuing to egress");
                    self.sink
                        .warn(task_id, &format!("Staging failed: {}", e.message))
                        .await;
                    break;
                }
            }
        }

        // ── Phase 5: egress handoff ──────────────────────────────────
        self.sink
            .report(task_id, Phase::Delivery, "Delivering result")
            .await;

        let chat_id = match &*task.source {
            TaskSource::TransportFile(file) => file.channel_id,
            TaskSource::Url { .. } => task.owner_id,
        };

        let limit = self.delivery_config.max_artifact_bytes;
        let progress = self.progress_fn(task_id, Phase::Delivery);
        for artifact in &artifacts {
            let size = tokio::fs::metadata(artifact)
                .await
                .map(|m| m.len())
                .map_err(|e| {
                    PhaseFailure::new(
                        Phase::Delivery,
                        AppError::delivery(format!("Artifact vanished before handoff: {e}")),
                    )
                })?;

            if size > limit {
                warn!(
                    task_id = %task_id,
                    size,
                    limit,
                    "Artifact exceeds egress limit, skipping handoff"
                );
                self.sink
                    .warn(
                        task_id,
                        &format!(
                            "Result is {} which exceeds the {} delivery limit",
                            human_bytes(size),
                            human_bytes(limit)
                        ),
                    )
                    .await;
                continue;
            }

            // Pass-through artifacts keep the task's display name; produced
            // artifacts already carry a name derived from it.
            let display_name = if plan.is_empty() {
                task.display_name()
            } else {
                file_name(artifact)
            };
            let request = DeliveryRequest {
                chat_id,
                path: artifact.clone(),
                kind: task.kind.artifact_kind(),
                display_name,
                caption: task.config.caption.clone(),
                with_thumbnail: task.config.thumbnail.unwrap_or(false),
            };
            self.transport
                .deliver(&request, &progress)
                .await
                .map_err(|e| PhaseFailure::new(Phase::Delivery, e))?;
        }

        Ok(Outcome::Done)
    }

    /// Acquire a secondary source (side input or join part) into the
    /// workspace under a stable prefix.
    async fn acquire_extra(
        &self,
        source: &TaskSource,
        workspace: &TaskWorkspace,
        prefix: &str,
    ) -> Result<PathBuf, AppError> {
        let dest = workspace.file(&format!(
            "{prefix}_{}",
            sanitize_file_name(&source.display_name())
        ));
        self.acquirer.acquire(source, &dest, &|_, _| {}).await
    }

    /// Read the cancel flag; store failures are logged and treated as "not
    /// cancelled" so a flaky store cannot cancel work by accident.
    async fn cancel_requested(&self, task_id: Uuid) -> bool {
        match self.store.cancel_requested(task_id).await {
            Ok(flag) => flag,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Failed to read cancel flag");
                false
            }
        }
    }

    /// Progress callback bridging a synchronous transfer loop into the
    /// async status sink.
    fn progress_fn(
        &self,
        task_id: Uuid,
        phase: Phase,
    ) -> impl Fn(u64, Option<u64>) + Send + Sync + 'static {
        let sink = Arc::clone(&self.sink);
        move |current, total| {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                let text = match total {
                    Some(total) => {
                        format!("Transferred {} / {}", human_bytes(current), human_bytes(total))
                    }
                    None => format!("Transferred {}", human_bytes(current)),
                };
                sink.report(task_id, phase, &text).await;
            });
        }
    }
}

/// Collect the artifact files a finished plan left behind: the declared
/// file itself, the matching segment files for a `%`-pattern output, or the
/// regular files inside an extraction directory.
async fn resolve_artifacts(declared: &Path) -> Vec<PathBuf> {
    let name = declared
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if name.contains('%') {
        let prefix: String = name.chars().take_while(|c| *c != '%').collect();
        return list_files(declared.parent().unwrap_or(Path::new(".")), Some(&prefix)).await;
    }

    match tokio::fs::metadata(declared).await {
        Ok(meta) if meta.is_dir() => list_files(declared, None).await,
        Ok(_) => vec![declared.to_path_buf()],
        Err(_) => Vec::new(),
    }
}

/// Regular files in `dir`, optionally filtered by name prefix, sorted.
async fn list_files(dir: &Path, prefix: Option<&str>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(prefix) = prefix {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            if !matches {
                continue;
            }
        }
        files.push(path);
    }
    files.sort();
    files
}

/// Write the concat demuxer list for a join task. Single quotes inside
/// paths are escaped the way the demuxer expects.
async fn write_concat_list(
    workspace: &TaskWorkspace,
    inputs: &[PathBuf],
) -> Result<PathBuf, AppError> {
    let mut content = String::new();
    for input in inputs {
        let escaped = input.to_string_lossy().replace('\'', "'\\''");
        content.push_str(&format!("file '{escaped}'\n"));
    }
    let list = workspace.file("concat.txt");
    tokio::fs::write(&list, content)
        .await
        .map_err(|e| AppError::storage(format!("Failed to write concat list: {e}")))?;
    Ok(list)
}

/// Strip path separators and control characters out of a display name so it
/// is safe as a workspace file name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact")
        .to_string()
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a/b\\c.mp4"), "a_b_c.mp4");
        assert_eq!(sanitize_file_name(""), "source");
        assert_eq!(sanitize_file_name("plain.mkv"), "plain.mkv");
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[tokio::test]
    async fn test_resolve_artifacts_single_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("out.mp4");
        tokio::fs::write(&file, b"x").await.expect("write");

        let artifacts = resolve_artifacts(&file).await;
        assert_eq!(artifacts, vec![file]);
    }

    #[tokio::test]
    async fn test_resolve_artifacts_pattern_collects_segments() {
        let temp = tempfile::tempdir().expect("tempdir");
        for name in ["clip_000.mp4", "clip_001.mp4", "other.txt"] {
            tokio::fs::write(temp.path().join(name), b"x").await.expect("write");
        }

        let artifacts = resolve_artifacts(&temp.path().join("clip_%03d.mp4")).await;
        let names: Vec<String> = artifacts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["clip_000.mp4", "clip_001.mp4"]);
    }

    #[tokio::test]
    async fn test_resolve_artifacts_directory_lists_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("extracted");
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        tokio::fs::write(dir.join("b.pdf"), b"x").await.expect("write");
        tokio::fs::write(dir.join("a.pdf"), b"x").await.expect("write");

        let artifacts = resolve_artifacts(&dir).await;
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts[0].ends_with("a.pdf"));
    }

    #[tokio::test]
    async fn test_concat_list_escapes_quotes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = TaskWorkspace::create(temp.path(), Uuid::new_v4())
            .await
            .expect("workspace");
        let list = write_concat_list(
            &ws,
            &[PathBuf::from("/w/it's.mp4"), PathBuf::from("/w/b.mp4")],
        )
        .await
        .expect("list");

        let content = tokio::fs::read_to_string(&list).await.expect("read");
        assert!(content.contains("file '/w/it'\\''s.mp4'"));
        assert!(content.contains("file '/w/b.mp4'"));
    }
}
