//! In-memory implementation of the `EventStore` trait.
//!
//! Events live in a single append-only vector. Secondary indices map event
//! id, aggregate, type, and correlation to positions in that vector, so
//! every query returns events in append order without rescanning the log.
//! Batch appends are checked in full under one write guard before anything
//! is written, which makes them atomic for readers.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, warn};

use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_core::store::EventStore;

#[derive(Debug, Default)]
struct StoreState {
    events: Vec<DomainEvent>,
    by_id: HashMap<String, usize>,
    by_aggregate: HashMap<String, Vec<usize>>,
    by_type: HashMap<String, Vec<usize>>,
    by_correlation: HashMap<String, Vec<usize>>,
}

impl StoreState {
    fn push(&mut self, event: DomainEvent) {
        let position = self.events.len();
        self.by_id.insert(event.event_id.clone(), position);
        self.by_aggregate
            .entry(event.aggregate_id.clone())
            .or_default()
            .push(position);
        self.by_type
            .entry(event.event_type.clone())
            .or_default()
            .push(position);
        self.by_correlation
            .entry(event.correlation_id.clone())
            .or_default()
            .push(position);
        self.events.push(event);
    }

    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<DomainEvent> {
        positions
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| self.events[position].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn filter(&self, predicate: impl Fn(&DomainEvent) -> bool) -> Vec<DomainEvent> {
        self.events
            .iter()
            .filter(|event| predicate(event))
            .cloned()
            .collect()
    }
}

/// Process-local event store. Cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<StoreState>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of appended events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    /// True when nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    /// Looks up a single event by id.
    #[must_use]
    pub fn get_event(&self, event_id: &str) -> Option<DomainEvent> {
        let state = self.read();
        state
            .by_id
            .get(event_id)
            .map(|&position| state.events[position].clone())
    }

    /// Every event of one workspace, in append order.
    #[must_use]
    pub fn get_events_for_workspace(&self, workspace_id: &str) -> Vec<DomainEvent> {
        self.read()
            .filter(|event| event.workspace_id == workspace_id)
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &DomainEvent) -> Result<(), DomainError> {
        let mut state = self.write();
        if state.by_id.contains_key(&event.event_id) {
            warn!(event_id = %event.event_id, "rejected duplicate event append");
            return Err(DomainError::DuplicateEvent(event.event_id.clone()));
        }
        state.push(event.clone());
        debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            position = state.events.len(),
            "event appended"
        );
        Ok(())
    }

    async fn append_batch(&self, events: &[DomainEvent]) -> Result<(), DomainError> {
        let mut state = self.write();

        let mut batch_ids = HashSet::with_capacity(events.len());
        for event in events {
            if state.by_id.contains_key(&event.event_id) || !batch_ids.insert(&event.event_id) {
                warn!(
                    event_id = %event.event_id,
                    batch_size = events.len(),
                    "rejected batch containing duplicate event id"
                );
                return Err(DomainError::DuplicateEvent(event.event_id.clone()));
            }
        }

        for event in events {
            state.push(event.clone());
        }
        debug!(batch_size = events.len(), "event batch appended");
        Ok(())
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        let state = self.read();
        Ok(state.collect(state.by_aggregate.get(aggregate_id)))
    }

    async fn get_events_since(&self, since: i64) -> Result<Vec<DomainEvent>, DomainError> {
        Ok(self.read().filter(|event| event.timestamp > since))
    }

    async fn get_events_by_causality(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        let state = self.read();
        Ok(state.collect(state.by_correlation.get(correlation_id)))
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<DomainEvent>, DomainError> {
        let state = self.read();
        Ok(state.collect(state.by_type.get(event_type)))
    }

    async fn get_events_in_range(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<DomainEvent>, DomainError> {
        Ok(self
            .read()
            .filter(|event| (start..=end).contains(&event.timestamp)))
    }
}
