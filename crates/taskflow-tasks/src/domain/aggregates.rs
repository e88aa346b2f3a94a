//! Aggregate roots for the task lifecycle context.

use std::fmt;

use serde::Serialize;
use taskflow_core::aggregate::AggregateRoot;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;

use super::events::{
    TaskAccepted, TaskCreated, TaskEventKind, TaskReworkRequested, TaskSubmittedForQc,
};

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet submitted.
    Open,
    /// Waiting for a QC verdict.
    InQc,
    /// QC passed.
    Accepted,
    /// QC failed; needs another submission.
    ReworkRequested,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::InQc => "in_qc",
            Self::Accepted => "accepted",
            Self::ReworkRequested => "rework_requested",
        };
        f.write_str(label)
    }
}

/// The aggregate root for a task.
#[derive(Debug, Clone)]
pub struct Task {
    /// Aggregate identifier.
    pub id: String,
    /// Workspace taken from the task's history.
    pub workspace_id: String,
    /// Task title.
    pub title: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Number of QC submissions so far.
    pub attempts: u32,
    /// Event id of the most recent `task.submitted_for_qc`.
    pub last_submission_event_id: Option<String>,
    /// Number of task events applied.
    pub version: usize,
}

impl Task {
    /// Payload for creating a task.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the title is blank.
    pub fn create(task_id: &str, title: &str) -> Result<TaskEventKind, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("title is required".to_owned()));
        }
        Ok(TaskEventKind::Created(TaskCreated {
            task_id: task_id.to_owned(),
            title: title.to_owned(),
        }))
    }

    /// Payload for submitting the task to QC.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the task is open or awaiting rework.
    pub fn submit_for_qc(&self) -> Result<TaskEventKind, DomainError> {
        self.require(&[TaskStatus::Open, TaskStatus::ReworkRequested], "submit")?;
        Ok(TaskEventKind::SubmittedForQc(TaskSubmittedForQc {
            task_id: self.id.clone(),
            attempt: self.attempts + 1,
        }))
    }

    /// Payload for accepting the task.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the task is in QC.
    pub fn accept(&self) -> Result<TaskEventKind, DomainError> {
        self.require(&[TaskStatus::InQc], "accept")?;
        Ok(TaskEventKind::Accepted(TaskAccepted {
            task_id: self.id.clone(),
        }))
    }

    /// Payload for sending the task back for rework.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the task is in QC.
    pub fn request_rework(&self, reason: &str) -> Result<TaskEventKind, DomainError> {
        self.require(&[TaskStatus::InQc], "request rework for")?;
        Ok(TaskEventKind::ReworkRequested(TaskReworkRequested {
            task_id: self.id.clone(),
            reason: reason.to_owned(),
        }))
    }

    fn require(&self, allowed: &[TaskStatus], action: &str) -> Result<(), DomainError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "cannot {action} task {} while it is {}",
                self.id, self.status
            )))
        }
    }
}

impl AggregateRoot for Task {
    fn empty(aggregate_id: &str) -> Self {
        Self {
            id: aggregate_id.to_owned(),
            workspace_id: String::new(),
            title: String::new(),
            status: TaskStatus::Open,
            attempts: 0,
            last_submission_event_id: None,
            version: 0,
        }
    }

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> usize {
        self.version
    }

    fn apply(&mut self, event: &DomainEvent) -> Result<(), DomainError> {
        if !TaskEventKind::is_task_event(&event.event_type) {
            return Ok(());
        }
        match event.decode_payload::<TaskEventKind>()? {
            TaskEventKind::Created(created) => {
                self.title = created.title;
                self.workspace_id.clone_from(&event.workspace_id);
                self.status = TaskStatus::Open;
            }
            TaskEventKind::SubmittedForQc(submitted) => {
                self.attempts = submitted.attempt;
                self.status = TaskStatus::InQc;
                self.last_submission_event_id = Some(event.event_id.clone());
            }
            TaskEventKind::Accepted(_) => self.status = TaskStatus::Accepted,
            TaskEventKind::ReworkRequested(_) => self.status = TaskStatus::ReworkRequested,
        }
        self.version += 1;
        Ok(())
    }
}
