//! Event store abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Append-only, queryable history of domain events.
///
/// Every query returns events in append order. Queries against an empty
/// store return an empty vector, never an error.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateEvent` if the event id was already
    /// appended, or `DomainError::Infrastructure` if the backing store is
    /// unavailable.
    async fn append(&self, event: &DomainEvent) -> Result<(), DomainError>;

    /// Append several events atomically: either all become visible or none.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`EventStore::append`]; on error no event of the
    /// batch is visible.
    async fn append_batch(&self, events: &[DomainEvent]) -> Result<(), DomainError>;

    /// Load every event recorded against an aggregate.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError>;

    /// Load events with `timestamp > since`.
    async fn get_events_since(&self, since: i64) -> Result<Vec<DomainEvent>, DomainError>;

    /// Load every event sharing a correlation id.
    async fn get_events_by_causality(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError>;

    /// Load every event of one type.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<DomainEvent>, DomainError>;

    /// Load events with `start <= timestamp <= end`.
    async fn get_events_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<DomainEvent>, DomainError>;
}
