//! Causality tracking.
//!
//! The tracker derives, per event, the ordered list of ancestors (most recent
//! first) and the set of known descendants, and groups event ids by
//! correlation. State is process-local and can be rebuilt from the event
//! store with [`CausalityTracker::rebuild_from_store`].
//!
//! Events are expected to be recorded in causal order. A child recorded
//! before its cause keeps a chain that stops at the cause; the tracker does
//! not backfill it later.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, warn};

use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;
use taskflow_core::store::EventStore;

/// The lineage facts the tracker needs about one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CausalityMetadata {
    /// The event being recorded.
    pub event_id: String,
    /// The event that directly caused it, if any.
    pub caused_by: Option<String>,
    /// The correlation group it belongs to.
    pub correlation_id: String,
    /// Epoch milliseconds of the event.
    pub timestamp: i64,
}

impl From<&DomainEvent> for CausalityMetadata {
    fn from(event: &DomainEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            caused_by: event.causation_id.clone(),
            correlation_id: event.correlation_id.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// Derived lineage of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventCausalityChain {
    /// Ancestor ids, most recent first.
    pub ancestors: Vec<String>,
    /// Direct and indirect descendant ids, in recording order.
    pub descendants: Vec<String>,
}

/// Summary counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CausalityStatistics {
    /// Number of tracked events.
    pub total_events: usize,
    /// Number of correlation groups.
    pub total_correlations: usize,
    /// Mean of `ancestors + 1` across tracked events, `0.0` when empty.
    pub average_chain_length: f64,
}

#[derive(Debug, Default)]
struct TrackerState {
    chains: HashMap<String, EventCausalityChain>,
    correlations: HashMap<String, Vec<String>>,
    timestamps: HashMap<String, i64>,
}

/// In-memory index of cause/effect chains and correlation groups.
#[derive(Debug, Default)]
pub struct CausalityTracker {
    state: RwLock<TrackerState>,
}

impl CausalityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event's lineage.
    ///
    /// Returns `false` without changing anything if the event id is already
    /// tracked, so replaying history into a live tracker is harmless.
    pub fn record_event(&self, metadata: CausalityMetadata) -> bool {
        let mut state = self.write();
        if state.chains.contains_key(&metadata.event_id) {
            debug!(event_id = %metadata.event_id, "event already tracked");
            return false;
        }

        let ancestors = match &metadata.caused_by {
            None => Vec::new(),
            Some(cause) => {
                let mut ancestors = vec![cause.clone()];
                if let Some(parent) = state.chains.get(cause) {
                    ancestors.extend(parent.ancestors.iter().cloned());
                } else {
                    warn!(
                        event_id = %metadata.event_id,
                        caused_by = %cause,
                        "cause not tracked yet; chain stops at the direct cause"
                    );
                }
                ancestors
            }
        };

        for ancestor in &ancestors {
            if let Some(chain) = state.chains.get_mut(ancestor) {
                chain.descendants.push(metadata.event_id.clone());
            }
        }

        state
            .correlations
            .entry(metadata.correlation_id)
            .or_default()
            .push(metadata.event_id.clone());
        state
            .timestamps
            .insert(metadata.event_id.clone(), metadata.timestamp);
        state.chains.insert(
            metadata.event_id,
            EventCausalityChain {
                ancestors,
                descendants: Vec::new(),
            },
        );
        true
    }

    /// The stored chain, or `None` if the event is unknown.
    #[must_use]
    pub fn get_event_chain(&self, event_id: &str) -> Option<EventCausalityChain> {
        self.read().chains.get(event_id).cloned()
    }

    /// Every known event id of a correlation group, in recording order.
    #[must_use]
    pub fn get_correlation_group(&self, correlation_id: &str) -> Vec<String> {
        self.read()
            .correlations
            .get(correlation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// A correlation group ordered by event timestamp; ties keep recording
    /// order.
    #[must_use]
    pub fn get_correlation_timeline(&self, correlation_id: &str) -> Vec<String> {
        let state = self.read();
        let mut group = state
            .correlations
            .get(correlation_id)
            .cloned()
            .unwrap_or_default();
        group.sort_by_key(|id| state.timestamps.get(id).copied().unwrap_or(i64::MAX));
        group
    }

    /// The oldest known ancestor, or `event_id` itself when it has none or
    /// is unknown.
    #[must_use]
    pub fn get_root_cause(&self, event_id: &str) -> String {
        self.read()
            .chains
            .get(event_id)
            .and_then(|chain| chain.ancestors.last().cloned())
            .unwrap_or_else(|| event_id.to_owned())
    }

    /// True iff `potential_cause` is a direct or indirect ancestor.
    #[must_use]
    pub fn is_caused_by(&self, event_id: &str, potential_cause: &str) -> bool {
        self.read()
            .chains
            .get(event_id)
            .is_some_and(|chain| chain.ancestors.iter().any(|a| a == potential_cause))
    }

    /// Ancestors oldest first, followed by the event itself.
    #[must_use]
    pub fn get_full_chain(&self, event_id: &str) -> Vec<String> {
        let mut chain: Vec<String> = self
            .read()
            .chains
            .get(event_id)
            .map(|chain| chain.ancestors.iter().rev().cloned().collect())
            .unwrap_or_default();
        chain.push(event_id.to_owned());
        chain
    }

    /// Drops all tracked state.
    pub fn clear(&self) {
        let mut state = self.write();
        state.chains.clear();
        state.correlations.clear();
        state.timestamps.clear();
        debug!("causality tracker cleared");
    }

    /// Summary counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_statistics(&self) -> CausalityStatistics {
        let state = self.read();
        let total_events = state.chains.len();
        let average_chain_length = if total_events == 0 {
            0.0
        } else {
            let total: usize = state.chains.values().map(|c| c.ancestors.len() + 1).sum();
            total as f64 / total_events as f64
        };
        CausalityStatistics {
            total_events,
            total_correlations: state.correlations.len(),
            average_chain_length,
        }
    }

    /// Replays one correlation group from the store, in append order.
    /// Returns how many events were newly recorded.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the query fails.
    pub async fn rebuild_from_store(
        &self,
        store: &dyn EventStore,
        correlation_id: &str,
    ) -> Result<usize, DomainError> {
        let events = store.get_events_by_causality(correlation_id).await?;
        let recorded = events
            .iter()
            .filter(|event| self.record_event(CausalityMetadata::from(*event)))
            .count();
        debug!(
            correlation_id,
            replayed = events.len(),
            recorded,
            "causality rebuilt from store"
        );
        Ok(recorded)
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
