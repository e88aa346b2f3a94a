//! Command handlers for the task lifecycle context.
//!
//! Each handler replays the task from the store, asks the aggregate for the
//! next event, and hands that event to the publisher.

use taskflow_core::aggregate::reconstitute;
use taskflow_core::clock::Clock;
use taskflow_core::error::DomainError;
use taskflow_core::event::{DomainEvent, EventContext};
use taskflow_pipeline::{EventPublisher, ensure_published};
use uuid::Uuid;

use crate::domain::aggregates::Task;
use crate::domain::commands::{AcceptTask, CreateTask, RequestRework, SubmitTaskForQc};
use crate::domain::events::TaskEventKind;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct TaskCommandResult {
    /// The task affected or created by the command.
    pub aggregate_id: String,
    /// The events produced and published.
    pub events: Vec<DomainEvent>,
}

/// Replays a task from its stored history.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the task has no history, or
/// the store's error if loading fails.
pub async fn load_task(task_id: &str, publisher: &EventPublisher) -> Result<Task, DomainError> {
    let history = publisher.store().get_events_for_aggregate(task_id).await?;
    reconstitute(task_id, &history)
}

async fn publish_for_task(
    task: &Task,
    kind: &TaskEventKind,
    correlation_id: &str,
    causation_id: Option<String>,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<TaskCommandResult, DomainError> {
    let context = EventContext::root(task.id.as_str(), task.workspace_id.as_str(), correlation_id)
        .with_causation(causation_id);
    let event = DomainEvent::new(kind, context, clock);
    ensure_published(publisher.publish(&event).await)?;
    Ok(TaskCommandResult {
        aggregate_id: task.id.clone(),
        events: vec![event],
    })
}

/// Handles the `CreateTask` command: allocates a task id and publishes
/// `task.created` as the root of a new causal chain.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank title and
/// `DomainError::PublicationFailed` if the event could not be published.
pub async fn handle_create_task(
    command: &CreateTask,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<TaskCommandResult, DomainError> {
    let task_id = Uuid::new_v4().to_string();
    let kind = Task::create(&task_id, &command.title)?;
    let context = EventContext::root(
        task_id.as_str(),
        command.workspace_id.as_str(),
        command.correlation_id.as_str(),
    );
    let event = DomainEvent::new(&kind, context, clock);
    ensure_published(publisher.publish(&event).await)?;

    Ok(TaskCommandResult {
        aggregate_id: task_id,
        events: vec![event],
    })
}

/// Handles the `SubmitTaskForQc` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown task,
/// `DomainError::Validation` if the task cannot be submitted in its current
/// status, and `DomainError::PublicationFailed` if publication fails.
pub async fn handle_submit_task_for_qc(
    command: &SubmitTaskForQc,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<TaskCommandResult, DomainError> {
    let task = load_task(&command.task_id, publisher).await?;
    let kind = task.submit_for_qc()?;
    publish_for_task(
        &task,
        &kind,
        &command.correlation_id,
        command.causation_id.clone(),
        clock,
        publisher,
    )
    .await
}

/// Handles the `AcceptTask` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown task,
/// `DomainError::Validation` unless the task is in QC, and
/// `DomainError::PublicationFailed` if publication fails.
pub async fn handle_accept_task(
    command: &AcceptTask,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<TaskCommandResult, DomainError> {
    let task = load_task(&command.task_id, publisher).await?;
    let kind = task.accept()?;
    publish_for_task(
        &task,
        &kind,
        &command.correlation_id,
        command.causation_id.clone(),
        clock,
        publisher,
    )
    .await
}

/// Handles the `RequestRework` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown task,
/// `DomainError::Validation` unless the task is in QC, and
/// `DomainError::PublicationFailed` if publication fails.
pub async fn handle_request_rework(
    command: &RequestRework,
    clock: &dyn Clock,
    publisher: &EventPublisher,
) -> Result<TaskCommandResult, DomainError> {
    let task = load_task(&command.task_id, publisher).await?;
    let kind = task.request_rework(&command.reason)?;
    publish_for_task(
        &task,
        &kind,
        &command.correlation_id,
        command.causation_id.clone(),
        clock,
        publisher,
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use taskflow_core::error::DomainError;
    use taskflow_core::event::DomainEvent;
    use taskflow_core::store::EventStore;
    use taskflow_event_bus::InMemoryEventBus;
    use taskflow_event_store::InMemoryEventStore;
    use taskflow_pipeline::EventPublisher;
    use taskflow_test_support::{FailingEventStore, FixedClock, RecordingEventStore};

    use crate::application::command_handlers::{
        handle_accept_task, handle_create_task, handle_request_rework, handle_submit_task_for_qc,
    };
    use crate::domain::commands::{AcceptTask, CreateTask, RequestRework, SubmitTaskForQc};
    use crate::domain::events::{TaskCreated, TaskEventKind};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn publisher() -> (Arc<RecordingEventStore<InMemoryEventStore>>, EventPublisher) {
        let store = Arc::new(RecordingEventStore::new(InMemoryEventStore::new()));
        let publisher = EventPublisher::new(store.clone(), Arc::new(InMemoryEventBus::new()));
        (store, publisher)
    }

    fn create(title: &str) -> CreateTask {
        CreateTask {
            correlation_id: "c1".to_owned(),
            workspace_id: "ws-1".to_owned(),
            title: title.to_owned(),
        }
    }

    fn submit(task_id: &str, causation_id: Option<String>) -> SubmitTaskForQc {
        SubmitTaskForQc {
            correlation_id: "c1".to_owned(),
            causation_id,
            task_id: task_id.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_handle_create_task_publishes_root_task_created_event() {
        // Arrange
        let (store, publisher) = publisher();

        // Act
        let result = handle_create_task(&create("Write docs"), &clock(), &publisher)
            .await
            .unwrap();

        // Assert
        assert_eq!(store.append_count(), 1);
        let event = &result.events[0];
        assert_eq!(event.event_type, "task.created");
        assert_eq!(event.aggregate_id, result.aggregate_id);
        assert_eq!(event.workspace_id, "ws-1");
        assert_eq!(event.correlation_id, "c1");
        assert!(event.is_root());
        assert_eq!(event.timestamp, clock().0.timestamp_millis());
        let payload: TaskEventKind = event.decode_payload().unwrap();
        assert_eq!(
            payload,
            TaskEventKind::Created(TaskCreated {
                task_id: result.aggregate_id.clone(),
                title: "Write docs".to_owned(),
            })
        );
    }

    #[tokio::test]
    async fn test_handle_create_task_rejects_blank_title_without_publishing() {
        let (store, publisher) = publisher();

        let result = handle_create_task(&create(" "), &clock(), &publisher).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(store.append_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_create_task_reports_store_failure_as_publication_failed() {
        let publisher = EventPublisher::new(
            Arc::new(FailingEventStore),
            Arc::new(InMemoryEventBus::new()),
        );

        let result = handle_create_task(&create("Write docs"), &clock(), &publisher).await;

        match result {
            Err(DomainError::PublicationFailed(reason)) => {
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected PublicationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_submit_task_for_qc_links_to_cause_and_inherits_workspace() {
        // Arrange
        let (store, publisher) = publisher();
        let created = handle_create_task(&create("Write docs"), &clock(), &publisher)
            .await
            .unwrap();
        let created_id = created.events[0].event_id.clone();

        // Act
        let result = handle_submit_task_for_qc(
            &submit(&created.aggregate_id, Some(created_id.clone())),
            &clock(),
            &publisher,
        )
        .await
        .unwrap();

        // Assert
        let event = &result.events[0];
        assert_eq!(event.event_type, "task.submitted_for_qc");
        assert_eq!(event.causation_id.as_deref(), Some(created_id.as_str()));
        assert_eq!(event.workspace_id, "ws-1");
        let history = store
            .get_events_for_aggregate(&created.aggregate_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_handle_submit_task_for_qc_unknown_task_is_not_found() {
        let (_, publisher) = publisher();

        let result = handle_submit_task_for_qc(&submit("missing", None), &clock(), &publisher).await;

        assert_eq!(
            result.unwrap_err(),
            DomainError::AggregateNotFound("missing".to_owned())
        );
    }

    #[tokio::test]
    async fn test_submit_against_a_non_task_stream_is_not_found() {
        // Arrange
        let (store, publisher) = publisher();
        let foreign = DomainEvent {
            event_id: "e1".to_owned(),
            event_type: "issue.opened".to_owned(),
            aggregate_id: "issue-1".to_owned(),
            workspace_id: "ws-1".to_owned(),
            correlation_id: "c1".to_owned(),
            causation_id: None,
            timestamp: 1_700_000_000_000,
            payload: serde_json::json!({}),
        };
        assert!(publisher.publish(&foreign).await.success);

        // Act
        let result = handle_submit_task_for_qc(&submit("issue-1", None), &clock(), &publisher).await;

        // Assert
        assert_eq!(
            result.unwrap_err(),
            DomainError::AggregateNotFound("issue-1".to_owned())
        );
        let history = store.get_events_for_aggregate("issue-1").await.unwrap();
        assert_eq!(history, vec![foreign]);
    }

    #[tokio::test]
    async fn test_double_submission_is_rejected() {
        // Arrange
        let (store, publisher) = publisher();
        let created = handle_create_task(&create("Write docs"), &clock(), &publisher)
            .await
            .unwrap();
        handle_submit_task_for_qc(&submit(&created.aggregate_id, None), &clock(), &publisher)
            .await
            .unwrap();

        // Act
        let again =
            handle_submit_task_for_qc(&submit(&created.aggregate_id, None), &clock(), &publisher)
                .await;

        // Assert
        assert!(matches!(again, Err(DomainError::Validation(_))));
        assert_eq!(store.append_count(), 2);
    }

    #[tokio::test]
    async fn test_rework_then_resubmit_then_accept() {
        // Arrange
        let (_, publisher) = publisher();
        let task_id = handle_create_task(&create("Write docs"), &clock(), &publisher)
            .await
            .unwrap()
            .aggregate_id;
        handle_submit_task_for_qc(&submit(&task_id, None), &clock(), &publisher)
            .await
            .unwrap();

        // Act
        let rework = handle_request_rework(
            &RequestRework {
                correlation_id: "c1".to_owned(),
                causation_id: None,
                task_id: task_id.clone(),
                reason: "missing tests".to_owned(),
            },
            &clock(),
            &publisher,
        )
        .await;
        let resubmitted =
            handle_submit_task_for_qc(&submit(&task_id, None), &clock(), &publisher).await;
        let accepted = handle_accept_task(
            &AcceptTask {
                correlation_id: "c1".to_owned(),
                causation_id: None,
                task_id: task_id.clone(),
            },
            &clock(),
            &publisher,
        )
        .await;

        // Assert
        assert_eq!(rework.unwrap().events[0].event_type, "task.rework_requested");
        assert_eq!(
            resubmitted.unwrap().events[0].event_type,
            "task.submitted_for_qc"
        );
        assert_eq!(accepted.unwrap().events[0].event_type, "task.accepted");
    }
}
