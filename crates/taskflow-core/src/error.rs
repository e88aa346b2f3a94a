//! Domain error types.

use std::fmt;

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// No event with this identifier is known.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// An event failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An event with the same identifier was already appended.
    #[error("duplicate event id: {0}")]
    DuplicateEvent(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A handler rejected an event it was notified about.
    #[error("handler error: {0}")]
    Handler(String),

    /// A use case could not get its event through the publisher.
    #[error("publication failed: {0}")]
    PublicationFailed(String),
}

/// A single handler failure observed during a bus fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// The event being delivered.
    pub event_id: String,
    /// The type tag of the event being delivered.
    pub event_type: String,
    /// Diagnostic name of the failing handler.
    pub handler: String,
    /// The handler's error message.
    pub message: String,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed on {} ({}): {}",
            self.handler, self.event_type, self.event_id, self.message
        )
    }
}

/// Errors surfaced by an event bus fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// One or more handlers failed. Every other handler still ran.
    #[error("{} handler(s) failed: {}", .0.len(), join_failures(.0))]
    HandlerFailures(Vec<HandlerFailure>),
}

impl BusError {
    /// Returns the individual handler failures.
    #[must_use]
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            Self::HandlerFailures(failures) => failures,
        }
    }

    /// Consumes the error, returning the individual handler failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<HandlerFailure> {
        match self {
            Self::HandlerFailures(failures) => failures,
        }
    }
}

fn join_failures(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the publication orchestrator, one variant per stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The event was rejected before any I/O. Nothing was stored or published.
    #[error("invalid event: {0}")]
    Validation(DomainError),

    /// The store rejected the append. Nothing was published.
    #[error("store append failed: {0}")]
    Store(DomainError),

    /// The event is durably stored but some subscribers failed.
    #[error("published with handler errors: {0}")]
    Handlers(BusError),
}

impl PublishError {
    /// True when the event reached the store despite the failure.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Handlers(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(handler: &str) -> HandlerFailure {
        HandlerFailure {
            event_id: "e1".to_owned(),
            event_type: "task.created".to_owned(),
            handler: handler.to_owned(),
            message: "boom".to_owned(),
        }
    }

    #[test]
    fn test_bus_error_message_lists_every_failure() {
        let err = BusError::HandlerFailures(vec![failure("board"), failure("queue")]);

        let message = err.to_string();

        assert!(message.starts_with("2 handler(s) failed"));
        assert!(message.contains("board failed on task.created (e1): boom"));
        assert!(message.contains("queue failed on task.created (e1): boom"));
    }

    #[test]
    fn test_handler_publish_error_reads_as_published_with_handler_errors() {
        let err = PublishError::Handlers(BusError::HandlerFailures(vec![failure("board")]));

        assert!(err.to_string().starts_with("published with handler errors"));
        assert!(err.is_recorded());
    }

    #[test]
    fn test_store_and_validation_errors_are_not_recorded() {
        let store = PublishError::Store(DomainError::Infrastructure("down".into()));
        let invalid = PublishError::Validation(DomainError::Validation("event_id".into()));

        assert!(!store.is_recorded());
        assert!(!invalid.is_recorded());
    }
}
