//! Publication orchestrator.
//!
//! Every event reaches history and subscribers through [`EventPublisher`].
//! The sequence is validate, append, record lineage, publish. Each step
//! starts only after the previous one succeeded, so a subscriber that
//! queries the store while handling an event always finds that event.
//! A bus failure after a successful append is reported but never rolls the
//! append back: the store is the ledger, the bus is notification.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use taskflow_core::bus::EventBus;
use taskflow_core::error::{DomainError, PublishError};
use taskflow_core::event::DomainEvent;
use taskflow_core::store::EventStore;

use crate::causality::{CausalityMetadata, CausalityTracker};

/// Outcome handed back to use cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    /// Whether every stage succeeded.
    pub success: bool,
    /// Human-readable reason when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishResult {
    /// A successful outcome.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed outcome with a reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

impl From<Result<(), PublishError>> for PublishResult {
    fn from(result: Result<(), PublishError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// Validates, appends, and then publishes domain events.
#[derive(Clone)]
pub struct EventPublisher {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn EventBus>,
    tracker: Option<Arc<CausalityTracker>>,
}

impl EventPublisher {
    /// Creates a publisher over a store and a bus.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            bus,
            tracker: None,
        }
    }

    /// Records every stored event's lineage in `tracker` before publication.
    #[must_use]
    pub fn with_causality_tracker(mut self, tracker: Arc<CausalityTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// The store events are appended to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// The bus events are published on.
    #[must_use]
    pub fn bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// The attached causality tracker, if any.
    #[must_use]
    pub fn tracker(&self) -> Option<&Arc<CausalityTracker>> {
        self.tracker.as_ref()
    }

    /// Publishes one event, reporting the outcome as a [`PublishResult`].
    pub async fn publish(&self, event: &DomainEvent) -> PublishResult {
        self.try_publish(event).await.into()
    }

    /// Publishes several events, reporting the outcome as a [`PublishResult`].
    pub async fn publish_batch(&self, events: &[DomainEvent]) -> PublishResult {
        self.try_publish_batch(events).await.into()
    }

    /// Publishes one event.
    ///
    /// # Errors
    ///
    /// - `PublishError::Validation` if the envelope is malformed; nothing is
    ///   stored or published.
    /// - `PublishError::Store` if the append fails; nothing is published.
    /// - `PublishError::Handlers` if subscribers failed; the event stays stored.
    #[instrument(
        skip_all,
        fields(
            event_id = %event.event_id,
            event_type = %event.event_type,
            correlation_id = %event.correlation_id
        )
    )]
    pub async fn try_publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        event.validate().map_err(|err| {
            warn!(error = %err, "rejected invalid event");
            PublishError::Validation(err)
        })?;

        self.store.append(event).await.map_err(|err| {
            error!(error = %err, "event append failed; not publishing");
            PublishError::Store(err)
        })?;

        self.record_lineage(std::slice::from_ref(event));

        self.bus.publish(event).await.map_err(|err| {
            warn!(error = %err, "event stored but some handlers failed");
            PublishError::Handlers(err)
        })?;

        info!("event published");
        Ok(())
    }

    /// Publishes several events with one atomic append.
    ///
    /// # Errors
    ///
    /// Same stages as [`EventPublisher::try_publish`]. A single invalid event
    /// rejects the whole batch before the append.
    #[instrument(skip_all, fields(batch_size = events.len()))]
    pub async fn try_publish_batch(&self, events: &[DomainEvent]) -> Result<(), PublishError> {
        if events.is_empty() {
            return Ok(());
        }

        for event in events {
            event.validate().map_err(|err| {
                warn!(event_id = %event.event_id, error = %err, "rejected invalid event in batch");
                PublishError::Validation(err)
            })?;
        }

        self.store.append_batch(events).await.map_err(|err| {
            error!(error = %err, "batch append failed; not publishing");
            PublishError::Store(err)
        })?;

        self.record_lineage(events);

        self.bus.publish_batch(events).await.map_err(|err| {
            warn!(error = %err, "batch stored but some handlers failed");
            PublishError::Handlers(err)
        })?;

        info!("event batch published");
        Ok(())
    }

    fn record_lineage(&self, events: &[DomainEvent]) {
        if let Some(tracker) = &self.tracker {
            for event in events {
                tracker.record_event(CausalityMetadata::from(event));
            }
        }
    }
}

/// Maps a failed [`PublishResult`] to a domain error for use cases.
///
/// # Errors
///
/// Returns `DomainError::PublicationFailed` carrying the reason when
/// `result.success` is false.
pub fn ensure_published(result: PublishResult) -> Result<(), DomainError> {
    if result.success {
        Ok(())
    } else {
        Err(DomainError::PublicationFailed(
            result.error.unwrap_or_else(|| "unknown publication failure".to_owned()),
        ))
    }
}
