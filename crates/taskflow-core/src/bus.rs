//! Event bus abstraction.
//!
//! Subscribers register an [`EventHandler`] either for one event type or
//! globally. Registration hands back a [`Subscription`] capability that can
//! later remove exactly that registration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::{BusError, DomainError};
use crate::event::DomainEvent;

/// Reacts to published events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one delivered event.
    ///
    /// # Errors
    ///
    /// Any error is reported back to the publisher as a handler failure; it
    /// does not stop other handlers of the same fan-out.
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError>;

    /// Diagnostic name used in logs and failure reports.
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Shared handle to a registered handler.
pub type SharedHandler = Arc<dyn EventHandler>;

/// Returns true when both handles point at the same handler instance.
#[must_use]
pub fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(DomainEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), DomainError>> + Send,
{
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wraps an async closure as a shared handler.
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> SharedHandler
where
    F: Fn(DomainEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), DomainError>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}

/// Process-unique identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next identifier.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type CancelFn = Box<dyn FnOnce() + Send + Sync>;

/// Capability to remove one registration from the bus that issued it.
///
/// Dropping a `Subscription` leaves the handler registered.
pub struct Subscription {
    id: SubscriptionId,
    event_type: Option<String>,
    cancel: CancelFn,
}

impl Subscription {
    /// Creates a subscription whose `unsubscribe` runs `cancel`.
    #[must_use]
    pub fn new(
        id: SubscriptionId,
        event_type: Option<String>,
        cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            event_type,
            cancel: Box::new(cancel),
        }
    }

    /// The registration identifier.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The subscribed type, or `None` for a global subscription.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// Removes the registration. Other handlers are unaffected.
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// In-process publish/subscribe distribution of domain events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Deliver `event` to its type's handlers and every global handler,
    /// resolving once all of them have finished.
    ///
    /// # Errors
    ///
    /// Returns `BusError::HandlerFailures` if any handler failed.
    async fn publish(&self, event: &DomainEvent) -> Result<(), BusError>;

    /// Publish several events; resolves once every fan-out has finished.
    ///
    /// # Errors
    ///
    /// Returns `BusError::HandlerFailures` aggregating failures of all events.
    async fn publish_batch(&self, events: &[DomainEvent]) -> Result<(), BusError>;

    /// Register `handler` for one event type.
    fn subscribe(&self, event_type: &str, handler: SharedHandler) -> Subscription;

    /// Register `handler` for every event.
    fn subscribe_all(&self, handler: SharedHandler) -> Subscription;

    /// Remove `handler` from `event_type`'s subscribers; no-op if absent.
    fn unsubscribe(&self, event_type: &str, handler: &SharedHandler);

    /// Remove every subscription.
    fn clear(&self);

    /// Number of handlers registered for `event_type`.
    fn subscriber_count(&self, event_type: &str) -> usize;

    /// Number of global handlers.
    fn global_subscriber_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn event() -> DomainEvent {
        DomainEvent {
            event_id: "e1".into(),
            event_type: "task.created".into(),
            aggregate_id: "t1".into(),
            workspace_id: "ws".into(),
            correlation_id: "c1".into(),
            causation_id: None,
            timestamp: 0,
            payload: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_handler_fn_receives_event_and_reports_name() {
        // Arrange
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = handler_fn("collector", move |event: DomainEvent| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(event.event_id);
                Ok::<(), DomainError>(())
            }
        });

        // Act
        handler.handle(&event()).await.unwrap();

        // Assert
        assert_eq!(handler.name(), "collector");
        assert_eq!(*seen.lock().unwrap(), vec!["e1".to_owned()]);
    }

    #[test]
    fn test_same_handler_compares_instances_not_types() {
        let a = handler_fn("a", |_e: DomainEvent| async { Ok::<(), DomainError>(()) });
        let b = handler_fn("a", |_e: DomainEvent| async { Ok::<(), DomainError>(()) });
        let a2 = Arc::clone(&a);

        assert!(same_handler(&a, &a2));
        assert!(!same_handler(&a, &b));
    }

    #[test]
    fn test_subscription_unsubscribe_runs_cancel_once() {
        let fired = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&fired);
        let sub = Subscription::new(SubscriptionId::next(), Some("x".into()), move || {
            *counter.lock().unwrap() += 1;
        });

        assert_eq!(sub.event_type(), Some("x"));
        sub.unsubscribe();

        assert_eq!(*fired.lock().unwrap(), 1);
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        assert_ne!(SubscriptionId::next(), SubscriptionId::next());
    }
}
