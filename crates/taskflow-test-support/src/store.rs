//! Test stores — mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_core::store::EventStore;

/// An event store decorator that records every `append`/`append_batch` call
/// before delegating to the wrapped store.
#[derive(Debug)]
pub struct RecordingEventStore<S> {
    inner: S,
    appended: Mutex<Vec<Vec<DomainEvent>>>,
}

impl<S: EventStore> RecordingEventStore<S> {
    /// Wrap `inner`, recording append calls.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every append call; single appends are recorded
    /// as one-element batches.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn append_calls(&self) -> Vec<Vec<DomainEvent>> {
        self.appended.lock().unwrap().clone()
    }

    /// Number of append calls (single or batch) made so far.
    #[must_use]
    pub fn append_count(&self) -> usize {
        self.appended.lock().unwrap().len()
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: EventStore> EventStore for RecordingEventStore<S> {
    async fn append(&self, event: &DomainEvent) -> Result<(), DomainError> {
        self.appended.lock().unwrap().push(vec![event.clone()]);
        self.inner.append(event).await
    }

    async fn append_batch(&self, events: &[DomainEvent]) -> Result<(), DomainError> {
        self.appended.lock().unwrap().push(events.to_vec());
        self.inner.append_batch(events).await
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        self.inner.get_events_for_aggregate(aggregate_id).await
    }

    async fn get_events_since(&self, since: i64) -> Result<Vec<DomainEvent>, DomainError> {
        self.inner.get_events_since(since).await
    }

    async fn get_events_by_causality(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        self.inner.get_events_by_causality(correlation_id).await
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<DomainEvent>, DomainError> {
        self.inner.get_events_by_type(event_type).await
    }

    async fn get_events_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        self.inner.get_events_in_range(start, end).await
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing the "backing store unavailable" paths.
#[derive(Debug)]
pub struct FailingEventStore;

fn unavailable<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(&self, _event: &DomainEvent) -> Result<(), DomainError> {
        unavailable()
    }

    async fn append_batch(&self, _events: &[DomainEvent]) -> Result<(), DomainError> {
        unavailable()
    }

    async fn get_events_for_aggregate(
        &self,
        _aggregate_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        unavailable()
    }

    async fn get_events_since(&self, _since: i64) -> Result<Vec<DomainEvent>, DomainError> {
        unavailable()
    }

    async fn get_events_by_causality(
        &self,
        _correlation_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        unavailable()
    }

    async fn get_events_by_type(
        &self,
        _event_type: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        unavailable()
    }

    async fn get_events_in_range(
        &self,
        _start: i64,
        _end: i64,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        unavailable()
    }
}
