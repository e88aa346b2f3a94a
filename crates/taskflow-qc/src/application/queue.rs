//! QC queue: submissions that are waiting for a verdict.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use taskflow_core::bus::{EventBus, EventHandler, Subscription};
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_tasks::domain::events::{TASK_SUBMITTED_FOR_QC_EVENT_TYPE, TaskEventKind};
use tracing::debug;

use crate::domain::events::{QC_FAILED_EVENT_TYPE, QC_PASSED_EVENT_TYPE, QcEventKind};

/// One submission awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingReview {
    /// The submitted task.
    pub task_id: String,
    /// The `task.submitted_for_qc` event.
    pub submission_event_id: String,
    /// Correlation of the submission.
    pub correlation_id: String,
    /// Submission attempt number.
    pub attempt: u32,
    /// When the task was submitted, in epoch milliseconds.
    pub submitted_at: i64,
}

/// Reactor tracking pending QC submissions in submission order.
#[derive(Debug, Default)]
pub struct QcQueue {
    pending: RwLock<Vec<PendingReview>>,
}

impl QcQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to submissions and to both verdict types.
    pub fn attach(self: &Arc<Self>, bus: &dyn EventBus) -> Vec<Subscription> {
        [
            TASK_SUBMITTED_FOR_QC_EVENT_TYPE,
            QC_PASSED_EVENT_TYPE,
            QC_FAILED_EVENT_TYPE,
        ]
        .into_iter()
        .map(|event_type| bus.subscribe(event_type, self.clone()))
        .collect()
    }

    /// Pending submissions, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingReview> {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True when `task_id` is waiting for a verdict.
    #[must_use]
    pub fn is_pending(&self, task_id: &str) -> bool {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|review| review.task_id == task_id)
    }
}

#[async_trait]
impl EventHandler for QcQueue {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let mut pending = self.pending.write().unwrap_or_else(PoisonError::into_inner);
        if event.event_type == TASK_SUBMITTED_FOR_QC_EVENT_TYPE {
            let TaskEventKind::SubmittedForQc(submitted) = event.decode_payload::<TaskEventKind>()?
            else {
                return Err(DomainError::Infrastructure(format!(
                    "unexpected payload for {}",
                    event.event_type
                )));
            };
            pending.retain(|review| review.task_id != submitted.task_id);
            pending.push(PendingReview {
                task_id: submitted.task_id,
                submission_event_id: event.event_id.clone(),
                correlation_id: event.correlation_id.clone(),
                attempt: submitted.attempt,
                submitted_at: event.timestamp,
            });
            debug!(task_id = %event.aggregate_id, "queued for QC");
        } else if QcEventKind::is_verdict(&event.event_type) {
            pending.retain(|review| review.task_id != event.aggregate_id);
            debug!(task_id = %event.aggregate_id, "removed from QC queue");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "qc-queue"
    }
}
