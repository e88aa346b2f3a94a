//! Query handlers for the issue tracking context.

use serde::Serialize;
use taskflow_core::aggregate::reconstitute;
use taskflow_core::error::DomainError;
use taskflow_core::store::EventStore;

use crate::domain::aggregates::{Issue, IssueStatus};

/// Read-only view of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueView {
    /// The issue identifier.
    pub issue_id: String,
    /// The task the issue was raised against.
    pub task_id: String,
    /// What needs fixing.
    pub description: String,
    /// Current status.
    pub status: IssueStatus,
    /// How it was resolved, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// The event that opened the issue.
    pub opened_by_event_id: Option<String>,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        Self {
            issue_id: issue.id.clone(),
            task_id: issue.task_id.clone(),
            description: issue.description.clone(),
            status: issue.status,
            resolution: issue.resolution.clone(),
            opened_by_event_id: issue.opened_by_event_id.clone(),
        }
    }
}

/// Retrieves an issue by replaying its history from the store.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_issue_by_id(
    issue_id: &str,
    store: &dyn EventStore,
) -> Result<IssueView, DomainError> {
    let history = store.get_events_for_aggregate(issue_id).await?;
    let issue: Issue = reconstitute(issue_id, &history)?;
    Ok(IssueView::from(&issue))
}
