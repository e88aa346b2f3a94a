//! Issue tracker: opens issues for failed QC reviews and keeps a view of
//! every issue it has seen.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use taskflow_core::aggregate::AggregateRoot;
use taskflow_core::bus::{EventBus, EventHandler, Subscription};
use taskflow_core::clock::Clock;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_pipeline::EventPublisher;
use taskflow_qc::domain::events::QC_FAILED_EVENT_TYPE;
use tracing::{debug, info, warn};

use crate::application::command_handlers::handle_open_issue_for_failure;
use crate::application::query_handlers::IssueView;
use crate::domain::aggregates::{Issue, IssueStatus};
use crate::domain::events::{ISSUE_OPENED_EVENT_TYPE, ISSUE_RESOLVED_EVENT_TYPE, IssueEventKind};

/// Reactor that answers `qc.failed` with `issue.opened` and tracks issues.
pub struct IssueTracker {
    publisher: Arc<EventPublisher>,
    clock: Arc<dyn Clock>,
    issues: RwLock<HashMap<String, Issue>>,
}

impl IssueTracker {
    /// Creates a tracker that publishes through `publisher`.
    #[must_use]
    pub fn new(publisher: Arc<EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            publisher,
            clock,
            issues: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to failed verdicts and to both issue event types.
    pub fn attach(self: &Arc<Self>, bus: &dyn EventBus) -> Vec<Subscription> {
        [
            QC_FAILED_EVENT_TYPE,
            ISSUE_OPENED_EVENT_TYPE,
            ISSUE_RESOLVED_EVENT_TYPE,
        ]
        .into_iter()
        .map(|event_type| bus.subscribe(event_type, self.clone()))
        .collect()
    }

    /// Current view of one issue.
    #[must_use]
    pub fn get(&self, issue_id: &str) -> Option<IssueView> {
        self.issues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(issue_id)
            .map(IssueView::from)
    }

    /// Every issue, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<IssueView> {
        let mut views: Vec<IssueView> = self
            .issues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(IssueView::from)
            .collect();
        views.sort_by(|a, b| a.issue_id.cmp(&b.issue_id));
        views
    }

    /// Issues that are still open.
    #[must_use]
    pub fn open_issues(&self) -> Vec<IssueView> {
        self.list()
            .into_iter()
            .filter(|view| view.status == IssueStatus::Open)
            .collect()
    }

    fn apply(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let mut issues = self.issues.write().unwrap_or_else(PoisonError::into_inner);
        if event.event_type == ISSUE_OPENED_EVENT_TYPE {
            issues
                .entry(event.aggregate_id.clone())
                .or_insert_with(|| Issue::empty(&event.aggregate_id));
        }
        let Some(issue) = issues.get_mut(&event.aggregate_id) else {
            warn!(issue_id = %event.aggregate_id, "resolution for an issue never seen opened");
            return Ok(());
        };
        issue.apply(event)?;
        debug!(issue_id = %issue.id, "issue view updated");
        Ok(())
    }
}

impl fmt::Debug for IssueTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueTracker")
            .field("issues", &self.issues)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventHandler for IssueTracker {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        if event.event_type == QC_FAILED_EVENT_TYPE {
            let opened =
                handle_open_issue_for_failure(event, self.clock.as_ref(), &self.publisher).await?;
            info!(
                issue_id = %opened.aggregate_id,
                task_id = %event.aggregate_id,
                "opened issue for failed QC"
            );
            return Ok(());
        }
        if IssueEventKind::is_issue_event(&event.event_type) {
            self.apply(event)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "issue-tracker"
    }
}
