//! Domain event abstractions.
//!
//! [`DomainEvent`] is the canonical envelope every workflow publishes. It
//! carries causal metadata (`correlation_id`, `causation_id`) alongside an
//! opaque JSON payload. Workflow contexts describe their payloads as tagged
//! enums implementing [`EventPayload`]; the pipeline never looks inside.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;

/// Trait implemented by the typed payload enums of each workflow context.
pub trait EventPayload: Send + Sync + std::fmt::Debug {
    /// Returns the event type tag (used for bus routing and store queries).
    fn event_type(&self) -> &'static str;

    /// Serializes the payload to JSON.
    fn to_payload(&self) -> serde_json::Value;
}

/// Identity of the operation an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// Entity the event concerns.
    pub aggregate_id: String,
    /// Tenant/partition the event belongs to.
    pub workspace_id: String,
    /// Logical operation the event is part of.
    pub correlation_id: String,
    /// Event that directly caused this one, if any.
    pub causation_id: Option<String>,
}

impl EventContext {
    /// Context for the first event of a new operation.
    #[must_use]
    pub fn root(
        aggregate_id: impl Into<String>,
        workspace_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            workspace_id: workspace_id.into(),
            correlation_id: correlation_id.into(),
            causation_id: None,
        }
    }

    /// Sets the causing event.
    #[must_use]
    pub fn with_causation(mut self, causation_id: Option<String>) -> Self {
        self.causation_id = causation_id;
        self
    }
}

/// The canonical, immutable unit of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Globally unique event identifier.
    pub event_id: String,
    /// Semantic kind of the event, e.g. `task.created`.
    pub event_type: String,
    /// Entity this event concerns.
    pub aggregate_id: String,
    /// Tenant/partition identifier.
    pub workspace_id: String,
    /// Groups every event of one logical business operation.
    pub correlation_id: String,
    /// Event that directly caused this one, `None` for a root cause.
    pub causation_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Type-specific data, never inspected by the pipeline.
    pub payload: serde_json::Value,
}

impl DomainEvent {
    /// Creates an event with a fresh identifier, stamped with `clock`.
    #[must_use]
    pub fn new(payload: &dyn EventPayload, context: EventContext, clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: payload.event_type().to_owned(),
            aggregate_id: context.aggregate_id,
            workspace_id: context.workspace_id,
            correlation_id: context.correlation_id,
            causation_id: context.causation_id,
            timestamp: clock.now_millis(),
            payload: payload.to_payload(),
        }
    }

    /// Creates an event caused by `parent`.
    ///
    /// The parent's correlation and workspace are carried over unchanged.
    #[must_use]
    pub fn caused_by(
        parent: &DomainEvent,
        payload: &dyn EventPayload,
        aggregate_id: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        let context = EventContext {
            aggregate_id: aggregate_id.into(),
            workspace_id: parent.workspace_id.clone(),
            correlation_id: parent.correlation_id.clone(),
            causation_id: Some(parent.event_id.clone()),
        };
        Self::new(payload, context, clock)
    }

    /// True when this event is the first in its correlation group.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.causation_id.is_none()
    }

    /// Deserializes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match `T`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "payload deserialization failed for {}: {e}",
                self.event_type
            ))
        })
    }

    /// Checks the structural invariants of the envelope.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        require("event_id", &self.event_id)?;
        require("event_type", &self.event_type)?;
        require("aggregate_id", &self.aggregate_id)?;
        require("correlation_id", &self.correlation_id)?;
        if self.timestamp < 0 {
            return Err(DomainError::Validation(format!(
                "timestamp must be a non-negative epoch millisecond value, got {}",
                self.timestamp
            )));
        }
        if let Some(causation_id) = &self.causation_id {
            if causation_id.trim().is_empty() {
                return Err(DomainError::Validation(
                    "causation_id must be an event id or absent".to_owned(),
                ));
            }
            if *causation_id == self.event_id {
                return Err(DomainError::Validation(format!(
                    "event {} cannot be its own cause",
                    self.event_id
                )));
            }
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}
