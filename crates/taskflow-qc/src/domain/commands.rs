//! Commands for the quality control context.

use taskflow_core::command::Command;

/// Command to record a QC verdict for a submitted task.
#[derive(Debug, Clone)]
pub struct RecordQcResult {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The submission being reviewed. Defaults to the task's latest submission.
    pub causation_id: Option<String>,
    /// The reviewed task.
    pub task_id: String,
    /// Whether the task passed.
    pub passed: bool,
    /// Reviewer notes.
    pub notes: String,
}

impl Command for RecordQcResult {
    fn command_type(&self) -> &'static str {
        "qc.record_qc_result"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}
