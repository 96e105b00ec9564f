//! Planned-step execution as external processes.
//!
//! Executes one step at a time with timeout management and output
//! capturing. Steps within a plan never run in parallel; the caller holds
//! the CPU permit for the duration of the whole plan.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time;
use tracing::{debug, error, info};

use mediaforge_core::config::engine::EngineConfig;

use crate::error::EngineError;
use crate::plan::Step;

/// Executor for running planned engine steps.
#[derive(Debug, Clone)]
pub struct StepExecutor {
    /// Per-step timeout.
    timeout: Duration,
    /// Maximum trailing characters of combined output kept on failure.
    log_tail_chars: usize,
}

impl StepExecutor {
    /// Create an executor from engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.step_timeout_seconds),
            log_tail_chars: config.log_tail_chars,
        }
    }

    /// Run one step to completion.
    ///
    /// Non-zero exit and timeout both raise: a failing step must abort the
    /// remaining plan, never be skipped silently. The child is killed on
    /// timeout via `kill_on_drop`.
    pub async fn run(&self, step: &Step) -> Result<(), EngineError> {
        debug!(label = step.label, command = %step.command_line(), "Executing step");
        let start = Instant::now();

        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = time::timeout(self.timeout, cmd.output()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(label = step.label, error = %e, "Failed to spawn engine process");
                return Err(EngineError::Io(e));
            }
            Err(_) => {
                error!(
                    label = step.label,
                    timeout_s = self.timeout.as_secs(),
                    "Engine step timed out, killing process"
                );
                return Err(EngineError::Timeout {
                    label: step.label.to_string(),
                    timeout_seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let log = self.combined_tail(&output.stdout, &output.stderr);
            error!(
                label = step.label,
                code,
                elapsed_ms,
                log = %log.chars().take(500).collect::<String>(),
                "Engine step failed"
            );
            return Err(EngineError::ProcessFailed {
                label: step.label.to_string(),
                code,
                log,
            });
        }

        self.validate_output(step)?;

        info!(label = step.label, elapsed_ms, "Engine step completed");
        Ok(())
    }

    /// Bounded tail of the combined stderr + stdout.
    fn combined_tail(&self, stdout: &[u8], stderr: &[u8]) -> String {
        let mut combined = String::from_utf8_lossy(stderr).to_string();
        let out = String::from_utf8_lossy(stdout);
        if !out.trim().is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&out);
        }

        if combined.chars().count() > self.log_tail_chars {
            combined
                .chars()
                .skip(combined.chars().count() - self.log_tail_chars)
                .collect()
        } else {
            combined
        }
    }

    /// Verify the declared output exists and is non-empty. Pattern outputs
    /// (segment steps) are validated by the caller once the segment files
    /// are collected.
    fn validate_output(&self, step: &Step) -> Result<(), EngineError> {
        if step.has_pattern_output() {
            return Ok(());
        }

        let meta = match std::fs::metadata(&step.output) {
            Ok(meta) => meta,
            Err(_) => {
                return Err(EngineError::OutputMissing {
                    path: step.output.clone(),
                });
            }
        };

        if meta.is_file() && meta.len() == 0 {
            return Err(EngineError::OutputMissing {
                path: step.output.clone(),
            });
        }

        Ok(())
    }
}
