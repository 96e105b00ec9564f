//! The resolved execution plan: an ordered sequence of engine invocations.

use std::path::{Path, PathBuf};

/// One fully-resolved engine invocation. Steps execute strictly in sequence;
/// a later step may depend on an earlier step's output file existing.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Executable to invoke.
    pub program: String,
    /// Complete argument list.
    pub args: Vec<String>,
    /// Declared output artifact path (a `%`-pattern for segmenting steps).
    pub output: PathBuf,
    /// Short label used in logs and error messages.
    pub label: &'static str,
}

impl Step {
    /// Whether the declared output is a segment pattern rather than a single
    /// file.
    pub fn has_pattern_output(&self) -> bool {
        self.output
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains('%'))
    }

    /// Render the step as a shell-like command line for logging.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('\'');
                line.push_str(arg);
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Ordered sequence of steps for one task attempt.
///
/// A plan is a pure function of (task, media info, paths): it is never
/// persisted and is recomputed from scratch if processing is retried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// The steps, in execution order.
    pub steps: Vec<Step>,
}

impl Plan {
    /// Create a plan from steps.
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The final artifact path: the last step's declared output.
    pub fn final_output(&self) -> Option<&Path> {
        self.steps.last().map(|s| s.output.as_path())
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_output_detection() {
        let step = Step {
            program: "ffmpeg".to_string(),
            args: vec![],
            output: PathBuf::from("/tmp/out_%03d.mp4"),
            label: "split",
        };
        assert!(step.has_pattern_output());

        let plain = Step {
            output: PathBuf::from("/tmp/out.mp4"),
            ..step
        };
        assert!(!plain.has_pattern_output());
    }

    #[test]
    fn test_command_line_quotes_spaced_args() {
        let step = Step {
            program: "ffmpeg".to_string(),
            args: vec!["-i".to_string(), "my file.mp4".to_string()],
            output: PathBuf::from("out.mp4"),
            label: "transcode",
        };
        assert_eq!(step.command_line(), "ffmpeg -i 'my file.mp4'");
    }
}
