//! Command handlers for the issue tracking context.

use taskflow_core::aggregate::reconstitute;
use taskflow_core::clock::Clock;
use taskflow_core::error::DomainError;
use taskflow_core::event::{DomainEvent, EventContext};
use taskflow_pipeline::{EventPublisher, ensure_published};
use taskflow_qc::domain::events::QcEventKind;
use uuid::Uuid;

use crate::domain::aggregates::Issue;
use crate::domain::commands::ResolveIssue;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct IssueCommandResult {
    /// The issue affected or created by the command.
    pub aggregate_id: String,
    /// The events produced and published.
    pub events: Vec<DomainEvent>,
}

/// Opens an issue for a failed QC verdict. The new `issue.opened` event is
/// caused by `failure` and joins its correlation.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `failure` is not a failed verdict,
/// `DomainError::Infrastructure` if its payload cannot be decoded, and
/// `DomainError::PublicationFailed` if publication fails.
pub async fn handle_open_issue_for_failure(
    failure: &DomainEvent,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<IssueCommandResult, DomainError> {
    let QcEventKind::Failed(failed) = failure.decode_payload::<QcEventKind>()? else {
        return Err(DomainError::Validation(format!(
            "event {} is not a failed QC verdict",
            failure.event_id
        )));
    };
    let issue_id = Uuid::new_v4().to_string();
    let kind = Issue::open(&issue_id, &failed.task_id, &failed.notes);
    let event = DomainEvent::caused_by(failure, &kind, issue_id.as_str(), clock);
    ensure_published(publisher.publish(&event).await)?;

    Ok(IssueCommandResult {
        aggregate_id: issue_id,
        events: vec![event],
    })
}

/// Handles the `ResolveIssue` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown issue,
/// `DomainError::Validation` if it is already resolved, and
/// `DomainError::PublicationFailed` if publication fails.
pub async fn handle_resolve_issue(
    command: &ResolveIssue,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<IssueCommandResult, DomainError> {
    let history = publisher
        .store()
        .get_events_for_aggregate(&command.issue_id)
        .await?;
    let issue: Issue = reconstitute(&command.issue_id, &history)?;
    let kind = issue.resolve(&command.resolution)?;
    let context = EventContext::root(
        issue.id.as_str(),
        issue.workspace_id.as_str(),
        command.correlation_id.as_str(),
    )
    .with_causation(command.causation_id.clone());
    let event = DomainEvent::new(&kind, context, clock);
    ensure_published(publisher.publish(&event).await)?;

    Ok(IssueCommandResult {
        aggregate_id: issue.id,
        events: vec![event],
    })
}
