//! Task board: an in-memory view of every task, kept current by the bus.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use taskflow_core::aggregate::AggregateRoot;
use taskflow_core::bus::{EventBus, EventHandler, Subscription};
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use tracing::{debug, warn};

use crate::application::query_handlers::TaskView;
use crate::domain::aggregates::{Task, TaskStatus};
use crate::domain::events::{TASK_CREATED_EVENT_TYPE, TASK_EVENT_TYPES};

/// Reactor holding the current view of every task it has seen created.
#[derive(Debug, Default)]
pub struct TaskBoard {
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes the board to every task event type.
    pub fn attach(self: &Arc<Self>, bus: &dyn EventBus) -> Vec<Subscription> {
        TASK_EVENT_TYPES
            .iter()
            .map(|event_type| bus.subscribe(event_type, self.clone()))
            .collect()
    }

    /// Current view of one task.
    #[must_use]
    pub fn get(&self, task_id: &str) -> Option<TaskView> {
        self.read().get(task_id).map(TaskView::from)
    }

    /// Every task, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<TaskView> {
        let mut views: Vec<TaskView> = self.read().values().map(TaskView::from).collect();
        views.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        views
    }

    /// Tasks currently in `status`.
    #[must_use]
    pub fn with_status(&self, status: TaskStatus) -> Vec<TaskView> {
        self.list()
            .into_iter()
            .filter(|view| view.status == status)
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Task>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventHandler for TaskBoard {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        if event.event_type == TASK_CREATED_EVENT_TYPE {
            tasks
                .entry(event.aggregate_id.clone())
                .or_insert_with(|| Task::empty(&event.aggregate_id));
        }
        let Some(task) = tasks.get_mut(&event.aggregate_id) else {
            warn!(
                task_id = %event.aggregate_id,
                event_type = %event.event_type,
                "task event for a task the board has not seen created"
            );
            return Ok(());
        };
        task.apply(event)?;
        debug!(task_id = %task.id, status = %task.status, "task board updated");
        Ok(())
    }

    fn name(&self) -> &str {
        "task-board"
    }
}
