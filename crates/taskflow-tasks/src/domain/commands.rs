//! Commands for the task lifecycle context.

use taskflow_core::command::Command;

/// Command to create a new task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The workspace the task lives in.
    pub workspace_id: String,
    /// Short human-readable title.
    pub title: String,
}

impl Command for CreateTask {
    fn command_type(&self) -> &'static str {
        "task.create_task"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Command to hand a task to QC.
#[derive(Debug, Clone)]
pub struct SubmitTaskForQc {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The event that prompted the submission, if any.
    pub causation_id: Option<String>,
    /// The task identifier.
    pub task_id: String,
}

impl Command for SubmitTaskForQc {
    fn command_type(&self) -> &'static str {
        "task.submit_task_for_qc"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Command to accept a task after a passing QC verdict.
#[derive(Debug, Clone)]
pub struct AcceptTask {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The verdict event that led to acceptance.
    pub causation_id: Option<String>,
    /// The task identifier.
    pub task_id: String,
}

impl Command for AcceptTask {
    fn command_type(&self) -> &'static str {
        "task.accept_task"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Command to send a task back for rework.
#[derive(Debug, Clone)]
pub struct RequestRework {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The verdict event that led to the request.
    pub causation_id: Option<String>,
    /// The task identifier.
    pub task_id: String,
    /// Why the task was sent back.
    pub reason: String,
}

impl Command for RequestRework {
    fn command_type(&self) -> &'static str {
        "task.request_rework"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}
