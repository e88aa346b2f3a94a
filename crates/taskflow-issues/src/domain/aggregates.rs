//! Aggregate roots for the issue tracking context.

use serde::Serialize;
use taskflow_core::aggregate::AggregateRoot;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;

use super::events::{IssueEventKind, IssueOpened, IssueResolved};

/// Whether an issue still needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Needs attention.
    Open,
    /// Closed with a resolution.
    Resolved,
}

/// The aggregate root for an issue.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Aggregate identifier.
    pub id: String,
    /// Workspace taken from the issue's history.
    pub workspace_id: String,
    /// The task the issue was raised against.
    pub task_id: String,
    /// What needs fixing.
    pub description: String,
    /// Current status.
    pub status: IssueStatus,
    /// How it was resolved, once resolved.
    pub resolution: Option<String>,
    /// The event that opened the issue.
    pub opened_by_event_id: Option<String>,
    /// Number of events applied.
    pub version: usize,
}

impl Issue {
    /// Payload for opening an issue.
    #[must_use]
    pub fn open(issue_id: &str, task_id: &str, description: &str) -> IssueEventKind {
        IssueEventKind::Opened(IssueOpened {
            issue_id: issue_id.to_owned(),
            task_id: task_id.to_owned(),
            description: description.to_owned(),
        })
    }

    /// Payload for resolving this issue.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the issue is already resolved.
    pub fn resolve(&self, resolution: &str) -> Result<IssueEventKind, DomainError> {
        if self.status == IssueStatus::Resolved {
            return Err(DomainError::Validation(format!(
                "issue {} is already resolved",
                self.id
            )));
        }
        Ok(IssueEventKind::Resolved(IssueResolved {
            issue_id: self.id.clone(),
            resolution: resolution.to_owned(),
        }))
    }
}

impl AggregateRoot for Issue {
    fn empty(aggregate_id: &str) -> Self {
        Self {
            id: aggregate_id.to_owned(),
            workspace_id: String::new(),
            task_id: String::new(),
            description: String::new(),
            status: IssueStatus::Open,
            resolution: None,
            opened_by_event_id: None,
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
        if !IssueEventKind::is_issue_event(&event.event_type) {
            return Ok(());
        }
        match event.decode_payload::<IssueEventKind>()? {
            IssueEventKind::Opened(opened) => {
                self.task_id = opened.task_id;
                self.description = opened.description;
                self.workspace_id.clone_from(&event.workspace_id);
                self.opened_by_event_id = Some(event.event_id.clone());
                self.status = IssueStatus::Open;
            }
            IssueEventKind::Resolved(resolved) => {
                self.resolution = Some(resolved.resolution);
                self.status = IssueStatus::Resolved;
            }
        }
        self.version += 1;
        Ok(())
    }
}
