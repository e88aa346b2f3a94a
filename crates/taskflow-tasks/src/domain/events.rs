//! Domain events for the task lifecycle context.

use serde::{Deserialize, Serialize};
use taskflow_core::event::EventPayload;

/// Emitted when a task is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreated {
    /// The task identifier.
    pub task_id: String,
    /// Short human-readable title.
    pub title: String,
}

/// Emitted when a task is handed to QC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmittedForQc {
    /// The task identifier.
    pub task_id: String,
    /// How many times this task has been submitted, starting at 1.
    pub attempt: u32,
}

/// Emitted when QC passed and the task is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAccepted {
    /// The task identifier.
    pub task_id: String,
}

/// Emitted when QC failed and the task needs more work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReworkRequested {
    /// The task identifier.
    pub task_id: String,
    /// Why the task was sent back.
    pub reason: String,
}

/// Event type identifier for [`TaskCreated`].
pub const TASK_CREATED_EVENT_TYPE: &str = "task.created";

/// Event type identifier for [`TaskSubmittedForQc`].
pub const TASK_SUBMITTED_FOR_QC_EVENT_TYPE: &str = "task.submitted_for_qc";

/// Event type identifier for [`TaskAccepted`].
pub const TASK_ACCEPTED_EVENT_TYPE: &str = "task.accepted";

/// Event type identifier for [`TaskReworkRequested`].
pub const TASK_REWORK_REQUESTED_EVENT_TYPE: &str = "task.rework_requested";

/// Every event type this context emits.
pub const TASK_EVENT_TYPES: [&str; 4] = [
    TASK_CREATED_EVENT_TYPE,
    TASK_SUBMITTED_FOR_QC_EVENT_TYPE,
    TASK_ACCEPTED_EVENT_TYPE,
    TASK_REWORK_REQUESTED_EVENT_TYPE,
];

/// Event payload variants for the task lifecycle context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEventKind {
    /// A task has been created.
    Created(TaskCreated),
    /// A task has been submitted for QC.
    SubmittedForQc(TaskSubmittedForQc),
    /// A task has been accepted.
    Accepted(TaskAccepted),
    /// A task has been sent back for rework.
    ReworkRequested(TaskReworkRequested),
}

impl TaskEventKind {
    /// True when `event_type` belongs to this context.
    #[must_use]
    pub fn is_task_event(event_type: &str) -> bool {
        TASK_EVENT_TYPES.contains(&event_type)
    }
}

impl EventPayload for TaskEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => TASK_CREATED_EVENT_TYPE,
            Self::SubmittedForQc(_) => TASK_SUBMITTED_FOR_QC_EVENT_TYPE,
            Self::Accepted(_) => TASK_ACCEPTED_EVENT_TYPE,
            Self::ReworkRequested(_) => TASK_REWORK_REQUESTED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
