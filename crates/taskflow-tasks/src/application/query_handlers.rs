//! Query handlers for the task lifecycle context.

use serde::Serialize;
use taskflow_core::aggregate::reconstitute;
use taskflow_core::error::DomainError;
use taskflow_core::store::EventStore;

use crate::domain::aggregates::{Task, TaskStatus};

/// Read-only view of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// The task identifier.
    pub task_id: String,
    /// Task title.
    pub title: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Number of QC submissions so far.
    pub attempts: u32,
    /// Number of task events applied.
    pub version: usize,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            attempts: task.attempts,
            version: task.version,
        }
    }
}

/// Retrieves a task by replaying its history from the store.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_task_by_id(task_id: &str, store: &dyn EventStore) -> Result<TaskView, DomainError> {
    let history = store.get_events_for_aggregate(task_id).await?;
    let task: Task = reconstitute(task_id, &history)?;
    Ok(TaskView::from(&task))
}
