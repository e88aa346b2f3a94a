//! Shared test doubles and utilities for the Taskflow domain event pipeline.

mod clock;
mod handler;
mod store;

pub use clock::{FixedClock, StepClock};
pub use handler::{CallLog, FailingHandler, RecordingHandler};
pub use store::{FailingEventStore, RecordingEventStore};
