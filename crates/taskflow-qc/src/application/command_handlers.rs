//! Command handlers for the quality control context.

use taskflow_core::aggregate::reconstitute;
use taskflow_core::clock::Clock;
use taskflow_core::error::DomainError;
use taskflow_core::event::{DomainEvent, EventContext};
use taskflow_pipeline::{EventPublisher, ensure_published};
use taskflow_tasks::domain::aggregates::{Task, TaskStatus};

use crate::domain::commands::RecordQcResult;
use crate::domain::events::{QcEventKind, QcFailed, QcPassed};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct QcCommandResult {
    /// The reviewed task.
    pub aggregate_id: String,
    /// The events produced and published.
    pub events: Vec<DomainEvent>,
}

/// Handles the `RecordQcResult` command: publishes `qc.passed` or
/// `qc.failed` against the task, caused by the submission under review.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown task,
/// `DomainError::Validation` if the task is not awaiting QC or its latest
/// submission already has a verdict, and `DomainError::PublicationFailed` if
/// publication fails.
pub async fn handle_record_qc_result(
    command: &RecordQcResult,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<QcCommandResult, DomainError> {
    let history = publisher
        .store()
        .get_events_for_aggregate(&command.task_id)
        .await?;
    let task: Task = reconstitute(&command.task_id, &history)?;
    if task.status != TaskStatus::InQc {
        return Err(DomainError::Validation(format!(
            "task {} is not awaiting QC (status {})",
            task.id, task.status
        )));
    }
    let submission = task.last_submission_event_id.clone();
    if verdict_after(&history, submission.as_deref()) {
        return Err(DomainError::Validation(format!(
            "latest submission of task {} already has a QC verdict",
            task.id
        )));
    }

    let kind = if command.passed {
        QcEventKind::Passed(QcPassed {
            task_id: task.id.clone(),
            attempt: task.attempts,
            notes: command.notes.clone(),
        })
    } else {
        QcEventKind::Failed(QcFailed {
            task_id: task.id.clone(),
            attempt: task.attempts,
            notes: command.notes.clone(),
        })
    };
    let context = EventContext::root(
        task.id.as_str(),
        task.workspace_id.as_str(),
        command.correlation_id.as_str(),
    )
    .with_causation(command.causation_id.clone().or(submission));
    let event = DomainEvent::new(&kind, context, clock);
    ensure_published(publisher.publish(&event).await)?;

    Ok(QcCommandResult {
        aggregate_id: task.id,
        events: vec![event],
    })
}

fn verdict_after(history: &[DomainEvent], submission_id: Option<&str>) -> bool {
    let Some(submission_id) = submission_id else {
        return false;
    };
    history
        .iter()
        .skip_while(|event| event.event_id != submission_id)
        .any(|event| QcEventKind::is_verdict(&event.event_type))
}
