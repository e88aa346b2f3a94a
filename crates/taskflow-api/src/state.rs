//! Shared application state.

use std::fmt;
use std::sync::Arc;

use taskflow_core::bus::EventBus;
use taskflow_core::clock::Clock;
use taskflow_core::store::EventStore;
use taskflow_issues::application::tracker::IssueTracker;
use taskflow_pipeline::{CausalityTracker, EventPublisher};
use taskflow_qc::application::queue::QcQueue;
use taskflow_qc::application::verdict::QcVerdictReactor;
use taskflow_tasks::application::board::TaskBoard;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock stamping every event created through the API.
    pub clock: Arc<dyn Clock>,
    /// The single path from a use case to history and subscribers.
    pub publisher: Arc<EventPublisher>,
    /// Lineage index of every published event.
    pub causality: Arc<CausalityTracker>,
    /// Current view of every task.
    pub task_board: Arc<TaskBoard>,
    /// Submissions awaiting a QC verdict.
    pub qc_queue: Arc<QcQueue>,
    /// Issues opened by failed QC reviews.
    pub issues: Arc<IssueTracker>,
    /// Workspace stamped on new tasks.
    pub workspace_id: String,
}

impl AppState {
    /// Wires the pipeline over `store` and `bus` and attaches every reactor.
    #[must_use]
    pub fn new(
        store: Arc<dyn EventStore>,
        bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        workspace_id: impl Into<String>,
    ) -> Self {
        let causality = Arc::new(CausalityTracker::new());
        let publisher = Arc::new(
            EventPublisher::new(store, bus.clone()).with_causality_tracker(causality.clone()),
        );

        let task_board = Arc::new(TaskBoard::new());
        task_board.attach(bus.as_ref());
        let qc_queue = Arc::new(QcQueue::new());
        qc_queue.attach(bus.as_ref());
        Arc::new(QcVerdictReactor::new(publisher.clone(), clock.clone())).attach(bus.as_ref());
        let issues = Arc::new(IssueTracker::new(publisher.clone(), clock.clone()));
        issues.attach(bus.as_ref());

        Self {
            clock,
            publisher,
            causality,
            task_board,
            qc_queue,
            issues,
            workspace_id: workspace_id.into(),
        }
    }

    /// The event store behind the publisher.
    #[must_use]
    pub fn store(&self) -> &dyn EventStore {
        self.publisher.store().as_ref()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("workspace_id", &self.workspace_id)
            .finish_non_exhaustive()
    }
}
