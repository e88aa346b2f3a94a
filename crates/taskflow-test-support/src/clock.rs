//! Test clocks — deterministic `Clock` implementations for tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use taskflow_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that advances by a fixed step every time it is read, so
/// successive events get strictly increasing timestamps.
#[derive(Debug)]
pub struct StepClock {
    start: DateTime<Utc>,
    step_millis: i64,
    reads: AtomicI64,
}

impl StepClock {
    /// Create a clock starting at `start` that advances `step_millis` per read.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step_millis: i64) -> Self {
        Self {
            start,
            step_millis,
            reads: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::milliseconds(n * self.step_millis)
    }
}
