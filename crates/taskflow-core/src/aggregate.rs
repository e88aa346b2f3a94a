//! Aggregate root abstraction.

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Trait for aggregates that reconstitute from their event history.
pub trait AggregateRoot: Sized {
    /// Creates the empty aggregate an event stream is replayed onto.
    fn empty(aggregate_id: &str) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &str;

    /// Returns the number of events applied.
    fn version(&self) -> usize;

    /// Apply one historical event. Events of foreign types should be ignored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be decoded.
    fn apply(&mut self, event: &DomainEvent) -> Result<(), DomainError>;
}

/// Replays `events` (in append order) onto an empty aggregate.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` when no event in `events`
/// belongs to `A`, or the first error raised by [`AggregateRoot::apply`].
pub fn reconstitute<A: AggregateRoot>(
    aggregate_id: &str,
    events: &[DomainEvent],
) -> Result<A, DomainError> {
    if events.is_empty() {
        return Err(DomainError::AggregateNotFound(aggregate_id.to_owned()));
    }
    let mut aggregate = A::empty(aggregate_id);
    for event in events {
        aggregate.apply(event)?;
    }
    // A stream holding only foreign event types is some other aggregate.
    if aggregate.version() == 0 {
        return Err(DomainError::AggregateNotFound(aggregate_id.to_owned()));
    }
    Ok(aggregate)
}
