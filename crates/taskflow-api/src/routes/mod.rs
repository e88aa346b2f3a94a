//! Route modules organized by workflow context.

pub mod events;
pub mod health;
pub mod issues;
pub mod qc;
pub mod tasks;

use serde::Serialize;
use taskflow_core::event::DomainEvent;
use uuid::Uuid;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate affected or created by the command.
    pub aggregate_id: String,
    /// IDs of the domain events produced and published.
    pub event_ids: Vec<String>,
    /// Correlation the events belong to.
    pub correlation_id: String,
}

impl CommandResponse {
    pub(crate) fn new(aggregate_id: String, events: &[DomainEvent], correlation_id: String) -> Self {
        Self {
            aggregate_id,
            event_ids: events.iter().map(|e| e.event_id.clone()).collect(),
            correlation_id,
        }
    }
}

/// Uses the caller's correlation id, or starts a new operation.
pub(crate) fn correlation_or_new(correlation_id: Option<String>) -> String {
    correlation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
