//! Test handlers — mock `EventHandler` implementations for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskflow_core::bus::EventHandler;
use taskflow_core::error::DomainError;
use taskflow_core::event::DomainEvent;

/// Shared, ordered log of handler invocations as `"{handler}:{event_id}"`.
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Returns a snapshot of all entries in invocation order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }
}

/// A handler that records every event it receives and always succeeds.
#[derive(Debug)]
pub struct RecordingHandler {
    name: String,
    received: Mutex<Vec<DomainEvent>>,
    log: Option<CallLog>,
}

impl RecordingHandler {
    /// Create a shared recording handler.
    #[must_use]
    pub fn shared(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            received: Mutex::new(Vec::new()),
            log: None,
        })
    }

    /// Create a shared recording handler that also writes to `log` at the
    /// moment it is invoked.
    #[must_use]
    pub fn with_call_log(name: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            received: Mutex::new(Vec::new()),
            log: Some(log.clone()),
        })
    }

    /// Returns a snapshot of all received events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        self.received.lock().unwrap().clone()
    }

    /// Returns the ids of all received events, in delivery order.
    #[must_use]
    pub fn event_ids(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_id).collect()
    }

    /// Number of events received.
    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<(), DomainError> {
        if let Some(log) = &self.log {
            log.push(format!("{}:{}", self.name, event.event_id));
        }
        self.received.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A handler that always fails with a handler error. Useful for testing
/// partial fan-out failure paths.
#[derive(Debug)]
pub struct FailingHandler {
    name: String,
    message: String,
}

impl FailingHandler {
    /// Create a shared failing handler that reports `message`.
    #[must_use]
    pub fn shared(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            message: message.to_owned(),
        })
    }
}

#[async_trait]
impl EventHandler for FailingHandler {
    async fn handle(&self, _event: &DomainEvent) -> Result<(), DomainError> {
        Err(DomainError::Handler(self.message.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
