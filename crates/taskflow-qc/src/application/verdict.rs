//! Turns QC verdicts into task outcomes.
//!
//! `qc.passed` becomes `task.accepted` and `qc.failed` becomes
//! `task.rework_requested`. Each outcome is caused by the verdict event and
//! shares its correlation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use taskflow_core::bus::{EventBus, EventHandler, Subscription};
use taskflow_core::clock::Clock;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_pipeline::EventPublisher;
use taskflow_tasks::application::command_handlers::{handle_accept_task, handle_request_rework};
use taskflow_tasks::domain::commands::{AcceptTask, RequestRework};

use crate::domain::events::{QC_FAILED_EVENT_TYPE, QC_PASSED_EVENT_TYPE, QcEventKind};

/// Reactor publishing the task outcome of every QC verdict.
pub struct QcVerdictReactor {
    publisher: Arc<EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl QcVerdictReactor {
    /// Creates a reactor that publishes through `publisher`.
    #[must_use]
    pub fn new(publisher: Arc<EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }

    /// Subscribes to both verdict types.
    pub fn attach(self: &Arc<Self>, bus: &dyn EventBus) -> Vec<Subscription> {
        vec![
            bus.subscribe(QC_PASSED_EVENT_TYPE, self.clone()),
            bus.subscribe(QC_FAILED_EVENT_TYPE, self.clone()),
        ]
    }
}

impl fmt::Debug for QcVerdictReactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QcVerdictReactor").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventHandler for QcVerdictReactor {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let correlation_id = event.correlation_id.clone();
        let causation_id = Some(event.event_id.clone());
        let task_id = event.aggregate_id.clone();
        match event.decode_payload::<QcEventKind>()? {
            QcEventKind::Passed(_) => {
                let command = AcceptTask {
                    correlation_id,
                    causation_id,
                    task_id,
                };
                handle_accept_task(&command, self.clock.as_ref(), &self.publisher).await?;
            }
            QcEventKind::Failed(failed) => {
                let command = RequestRework {
                    correlation_id,
                    causation_id,
                    task_id,
                    reason: failed.notes,
                };
                handle_request_rework(&command, self.clock.as_ref(), &self.publisher).await?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "qc-verdict"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use taskflow_core::clock::Clock;
    use taskflow_event_bus::InMemoryEventBus;
    use taskflow_event_store::InMemoryEventStore;
    use taskflow_pipeline::{CausalityTracker, EventPublisher};
    use taskflow_tasks::application::board::TaskBoard;
    use taskflow_tasks::application::command_handlers::{
        handle_create_task, handle_submit_task_for_qc,
    };
    use taskflow_tasks::domain::aggregates::TaskStatus;
    use taskflow_tasks::domain::commands::{CreateTask, SubmitTaskForQc};
    use taskflow_test_support::StepClock;

    use super::QcVerdictReactor;
    use crate::application::command_handlers::handle_record_qc_result;
    use crate::domain::commands::RecordQcResult;

    struct Harness {
        publisher: Arc<EventPublisher>,
        tracker: Arc<CausalityTracker>,
        board: Arc<TaskBoard>,
        clock: Arc<StepClock>,
    }

    fn harness() -> Harness {
        let bus = Arc::new(InMemoryEventBus::new());
        let tracker = Arc::new(CausalityTracker::new());
        let publisher = Arc::new(
            EventPublisher::new(Arc::new(InMemoryEventStore::new()), bus.clone())
                .with_causality_tracker(tracker.clone()),
        );
        let clock = Arc::new(StepClock::new(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            1,
        ));
        let board = Arc::new(TaskBoard::new());
        board.attach(bus.as_ref());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        Arc::new(QcVerdictReactor::new(publisher.clone(), dyn_clock)).attach(bus.as_ref());
        Harness {
            publisher,
            tracker,
            board,
            clock,
        }
    }

    async fn submit(h: &Harness) -> (String, String) {
        let task_id = handle_create_task(
            &CreateTask {
                correlation_id: "c1".to_owned(),
                workspace_id: "ws-1".to_owned(),
                title: "Write docs".to_owned(),
            },
            h.clock.as_ref(),
            &h.publisher,
        )
        .await
        .unwrap()
        .aggregate_id;
        let submitted = handle_submit_task_for_qc(
            &SubmitTaskForQc {
                correlation_id: "c1".to_owned(),
                causation_id: None,
                task_id: task_id.clone(),
            },
            h.clock.as_ref(),
            &h.publisher,
        )
        .await
        .unwrap();
        (task_id, submitted.events[0].event_id.clone())
    }

    async fn record(h: &Harness, task_id: &str, passed: bool) -> String {
        let result = handle_record_qc_result(
            &RecordQcResult {
                correlation_id: "c1".to_owned(),
                causation_id: None,
                task_id: task_id.to_owned(),
                passed,
                notes: "checked".to_owned(),
            },
            h.clock.as_ref(),
            &h.publisher,
        )
        .await
        .unwrap();
        result.events[0].event_id.clone()
    }

    #[tokio::test]
    async fn test_passing_verdict_accepts_the_task() {
        // Arrange
        let h = harness();
        let (task_id, submission_id) = submit(&h).await;

        // Act
        let verdict_id = record(&h, &task_id, true).await;

        // Assert
        assert_eq!(
            h.board.get(&task_id).unwrap().status,
            TaskStatus::Accepted
        );
        let descendants = h.tracker.get_event_chain(&verdict_id).unwrap().descendants;
        assert_eq!(descendants.len(), 1);
        assert_eq!(h.tracker.get_root_cause(&descendants[0]), submission_id);
    }

    #[tokio::test]
    async fn test_failing_verdict_requests_rework_and_allows_resubmission() {
        // Arrange
        let h = harness();
        let (task_id, _) = submit(&h).await;

        // Act
        record(&h, &task_id, false).await;
        let resubmitted = handle_submit_task_for_qc(
            &SubmitTaskForQc {
                correlation_id: "c1".to_owned(),
                causation_id: None,
                task_id: task_id.clone(),
            },
            h.clock.as_ref(),
            &h.publisher,
        )
        .await;

        // Assert
        assert!(resubmitted.is_ok());
        let view = h.board.get(&task_id).unwrap();
        assert_eq!(view.status, TaskStatus::InQc);
        assert_eq!(view.attempts, 2);
    }
}
