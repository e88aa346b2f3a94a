//! In-memory implementation of the `EventBus` trait.
//!
//! Handlers are kept in two registries: one keyed by event type and one for
//! global subscribers. A publish snapshots the matching handlers under a read
//! lock, releases it, and then drives every handler future to completion.
//! Because no lock is held while handlers run, a handler may publish further
//! events or change subscriptions without deadlocking.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use taskflow_core::bus::{EventBus, SharedHandler, Subscription, SubscriptionId, same_handler};
use taskflow_core::error::{BusError, HandlerFailure};
use taskflow_core::event::DomainEvent;

struct Registration {
    id: SubscriptionId,
    handler: SharedHandler,
}

#[derive(Default)]
struct Registry {
    by_type: HashMap<String, Vec<Registration>>,
    global: Vec<Registration>,
}

impl Registry {
    fn remove(&mut self, event_type: Option<&str>, id: SubscriptionId) {
        match event_type {
            Some(event_type) => {
                if let Some(registrations) = self.by_type.get_mut(event_type) {
                    registrations.retain(|r| r.id != id);
                    if registrations.is_empty() {
                        self.by_type.remove(event_type);
                    }
                }
            }
            None => self.global.retain(|r| r.id != id),
        }
    }
}

/// Process-local event bus. Clones share the same registry.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryEventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type handlers in registration order, then global handlers in
    /// registration order.
    fn handlers_for(&self, event_type: &str) -> Vec<SharedHandler> {
        let registry = self.read();
        registry
            .by_type
            .get(event_type)
            .into_iter()
            .flatten()
            .chain(registry.global.iter())
            .map(|r| Arc::clone(&r.handler))
            .collect()
    }

    fn register(&self, event_type: Option<&str>, handler: SharedHandler) -> Subscription {
        let id = SubscriptionId::next();
        debug!(
            subscription = %id,
            event_type = event_type.unwrap_or("*"),
            handler = handler.name(),
            "subscribing handler"
        );
        {
            let mut registry = self.write();
            let registration = Registration { id, handler };
            match event_type {
                Some(event_type) => registry
                    .by_type
                    .entry(event_type.to_owned())
                    .or_default()
                    .push(registration),
                None => registry.global.push(registration),
            }
        }

        let registry: Weak<RwLock<Registry>> = Arc::downgrade(&self.registry);
        let owned_type = event_type.map(str::to_owned);
        let cancel_type = owned_type.clone();
        Subscription::new(id, owned_type, move || {
            // The bus may already be gone; nothing to remove then.
            if let Some(registry) = registry.upgrade() {
                registry
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(cancel_type.as_deref(), id);
                debug!(subscription = %id, "subscription cancelled");
            }
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.read();
        f.debug_struct("InMemoryEventBus")
            .field("event_types", &registry.by_type.len())
            .field("global_subscribers", &registry.global.len())
            .finish()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: &DomainEvent) -> Result<(), BusError> {
        let handlers = self.handlers_for(&event.event_type);
        if handlers.is_empty() {
            debug!(event_id = %event.event_id, event_type = %event.event_type, "no subscribers");
            return Ok(());
        }

        let outcomes = join_all(handlers.iter().map(|handler| handler.handle(event))).await;

        let failures: Vec<HandlerFailure> = handlers
            .iter()
            .zip(outcomes)
            .filter_map(|(handler, outcome)| {
                outcome.err().map(|err| HandlerFailure {
                    event_id: event.event_id.clone(),
                    event_type: event.event_type.clone(),
                    handler: handler.name().to_owned(),
                    message: err.to_string(),
                })
            })
            .collect();

        if failures.is_empty() {
            debug!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                handlers = handlers.len(),
                "event delivered"
            );
            return Ok(());
        }

        for failure in &failures {
            warn!(
                event_id = %failure.event_id,
                event_type = %failure.event_type,
                handler = %failure.handler,
                error = %failure.message,
                "event handler failed"
            );
        }
        Err(BusError::HandlerFailures(failures))
    }

    async fn publish_batch(&self, events: &[DomainEvent]) -> Result<(), BusError> {
        let outcomes = join_all(events.iter().map(|event| self.publish(event))).await;

        let failures: Vec<HandlerFailure> = outcomes
            .into_iter()
            .filter_map(Result::err)
            .flat_map(BusError::into_failures)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::HandlerFailures(failures))
        }
    }

    fn subscribe(&self, event_type: &str, handler: SharedHandler) -> Subscription {
        self.register(Some(event_type), handler)
    }

    fn subscribe_all(&self, handler: SharedHandler) -> Subscription {
        self.register(None, handler)
    }

    fn unsubscribe(&self, event_type: &str, handler: &SharedHandler) {
        let mut registry = self.write();
        if let Some(registrations) = registry.by_type.get_mut(event_type) {
            registrations.retain(|r| !same_handler(&r.handler, handler));
            if registrations.is_empty() {
                registry.by_type.remove(event_type);
            }
        }
    }

    fn clear(&self) {
        let mut registry = self.write();
        registry.by_type.clear();
        registry.global.clear();
        debug!("event bus cleared");
    }

    fn subscriber_count(&self, event_type: &str) -> usize {
        self.read().by_type.get(event_type).map_or(0, Vec::len)
    }

    fn global_subscriber_count(&self) -> usize {
        self.read().global.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use taskflow_core::bus::handler_fn;
    use taskflow_core::error::DomainError;
    use taskflow_test_support::{CallLog, FailingHandler, RecordingHandler};

    use super::*;

    fn event(event_id: &str, event_type: &str) -> DomainEvent {
        DomainEvent {
            event_id: event_id.to_owned(),
            event_type: event_type.to_owned(),
            aggregate_id: "t1".to_owned(),
            workspace_id: "ws-1".to_owned(),
            correlation_id: "c1".to_owned(),
            causation_id: None,
            timestamp: 0,
            payload: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_publish_invokes_type_and_global_handlers_exactly_once() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let typed: Vec<_> = (0..3)
            .map(|i| RecordingHandler::shared(&format!("typed-{i}")))
            .collect();
        let global: Vec<_> = (0..2)
            .map(|i| RecordingHandler::shared(&format!("global-{i}")))
            .collect();
        for handler in &typed {
            bus.subscribe("task.created", handler.clone());
        }
        for handler in &global {
            bus.subscribe_all(handler.clone());
        }

        // Act
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Assert
        for handler in typed.iter().chain(global.iter()) {
            assert_eq!(handler.event_ids(), vec!["e1".to_owned()]);
        }
    }

    #[tokio::test]
    async fn test_publish_skips_handlers_of_other_types() {
        let bus = InMemoryEventBus::new();
        let created = RecordingHandler::shared("created");
        let submitted = RecordingHandler::shared("submitted");
        bus.subscribe("task.created", created.clone());
        bus.subscribe("task.submitted_for_qc", submitted.clone());

        bus.publish(&event("e1", "task.created")).await.unwrap();

        assert_eq!(created.count(), 1);
        assert_eq!(submitted.count(), 0);
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_succeeds() {
        let bus = InMemoryEventBus::new();

        assert!(bus.publish(&event("e1", "task.created")).await.is_ok());
    }

    #[tokio::test]
    async fn test_handlers_start_in_registration_order_types_before_globals() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let log = CallLog::default();
        bus.subscribe_all(RecordingHandler::with_call_log("global", &log));
        bus.subscribe("task.created", RecordingHandler::with_call_log("first", &log));
        bus.subscribe("task.created", RecordingHandler::with_call_log("second", &log));

        // Act
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Assert
        assert_eq!(
            log.entries(),
            vec!["first:e1", "second:e1", "global:e1"]
        );
    }

    #[tokio::test]
    async fn test_publish_awaits_slow_handlers_before_resolving() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let done = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&done);
        bus.subscribe(
            "task.created",
            handler_fn("slow", move |_event: DomainEvent| {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    *flag.lock().unwrap() = true;
                    Ok::<(), DomainError>(())
                }
            }),
        );

        // Act
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Assert
        assert!(*done.lock().unwrap());
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others_and_is_reported() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let before = RecordingHandler::shared("before");
        let after = RecordingHandler::shared("after");
        let global = RecordingHandler::shared("global");
        bus.subscribe("task.created", before.clone());
        bus.subscribe("task.created", FailingHandler::shared("broken", "disk full"));
        bus.subscribe("task.created", after.clone());
        bus.subscribe_all(global.clone());

        // Act
        let result = bus.publish(&event("e1", "task.created")).await;

        // Assert
        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 1);
        assert_eq!(global.count(), 1);
        let err = result.unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].handler, "broken");
        assert_eq!(failures[0].event_id, "e1");
        assert!(failures[0].message.contains("disk full"));
    }

    #[tokio::test]
    async fn test_subscription_unsubscribe_removes_only_that_handler() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let removed = RecordingHandler::shared("removed");
        let kept = RecordingHandler::shared("kept");
        let subscription = bus.subscribe("task.created", removed.clone());
        bus.subscribe("task.created", kept.clone());
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Act
        subscription.unsubscribe();
        bus.publish(&event("e2", "task.created")).await.unwrap();

        // Assert
        assert_eq!(removed.event_ids(), vec!["e1".to_owned()]);
        assert_eq!(kept.event_ids(), vec!["e1".to_owned(), "e2".to_owned()]);
        assert_eq!(bus.subscriber_count("task.created"), 1);
    }

    #[tokio::test]
    async fn test_global_subscription_can_be_cancelled() {
        let bus = InMemoryEventBus::new();
        let global = RecordingHandler::shared("global");
        let subscription = bus.subscribe_all(global.clone());
        assert_eq!(subscription.event_type(), None);

        subscription.unsubscribe();
        bus.publish(&event("e1", "task.created")).await.unwrap();

        assert_eq!(global.count(), 0);
        assert_eq!(bus.global_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_by_handler_identity() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let recorder = RecordingHandler::shared("recorder");
        let other = RecordingHandler::shared("other");
        let handle: SharedHandler = recorder.clone();
        bus.subscribe("task.created", handle.clone());
        bus.subscribe("task.accepted", handle.clone());
        bus.subscribe("task.created", other.clone());

        // Act
        bus.unsubscribe("task.created", &handle);
        bus.publish(&event("e1", "task.created")).await.unwrap();
        bus.publish(&event("e2", "task.accepted")).await.unwrap();

        // Assert
        assert_eq!(recorder.event_ids(), vec!["e2".to_owned()]);
        assert_eq!(other.event_ids(), vec!["e1".to_owned()]);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_handler_is_noop() {
        let bus = InMemoryEventBus::new();
        let registered = RecordingHandler::shared("registered");
        bus.subscribe("task.created", registered.clone());
        let stranger: SharedHandler = RecordingHandler::shared("stranger");

        bus.unsubscribe("task.created", &stranger);
        bus.unsubscribe("never.subscribed", &stranger);

        assert_eq!(bus.subscriber_count("task.created"), 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_removes_everything() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let typed = RecordingHandler::shared("typed");
        let global = RecordingHandler::shared("global");
        bus.subscribe("task.created", typed.clone());
        bus.subscribe_all(global.clone());

        // Act
        bus.clear();
        bus.clear();
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Assert
        assert_eq!(typed.count(), 0);
        assert_eq!(global.count(), 0);
        assert_eq!(bus.subscriber_count("task.created"), 0);
        assert_eq!(bus.global_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_after_bus_dropped_is_harmless() {
        let bus = InMemoryEventBus::new();
        let subscription = bus.subscribe("task.created", RecordingHandler::shared("r"));
        drop(bus);

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_handler_may_publish_reentrantly() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let downstream = RecordingHandler::shared("downstream");
        bus.subscribe("task.accepted", downstream.clone());
        let inner = bus.clone();
        bus.subscribe(
            "task.created",
            handler_fn("cascade", move |parent: DomainEvent| {
                let inner = inner.clone();
                async move {
                    let mut child = event("e2", "task.accepted");
                    child.causation_id = Some(parent.event_id);
                    inner
                        .publish(&child)
                        .await
                        .map_err(|e| DomainError::Handler(e.to_string()))
                }
            }),
        );

        // Act
        bus.publish(&event("e1", "task.created")).await.unwrap();

        // Assert
        assert_eq!(downstream.event_ids(), vec!["e2".to_owned()]);
    }

    #[tokio::test]
    async fn test_publish_batch_delivers_every_event_and_aggregates_failures() {
        // Arrange
        let bus = InMemoryEventBus::new();
        let created = RecordingHandler::shared("created");
        bus.subscribe("task.created", created.clone());
        bus.subscribe("task.accepted", FailingHandler::shared("broken", "nope"));
        let batch = vec![
            event("e1", "task.created"),
            event("e2", "task.accepted"),
            event("e3", "task.created"),
            event("e4", "task.accepted"),
        ];

        // Act
        let result = bus.publish_batch(&batch).await;

        // Assert
        let mut seen = created.event_ids();
        seen.sort();
        assert_eq!(seen, vec!["e1".to_owned(), "e3".to_owned()]);
        let mut failed: Vec<String> = result
            .unwrap_err()
            .into_failures()
            .into_iter()
            .map(|f| f.event_id)
            .collect();
        failed.sort();
        assert_eq!(failed, vec!["e2".to_owned(), "e4".to_owned()]);
    }

    #[tokio::test]
    async fn test_publish_batch_empty_is_ok() {
        let bus = InMemoryEventBus::new();

        assert!(bus.publish_batch(&[]).await.is_ok());
    }
}
