//! Taskflow Pipeline — the single path from a use case to history and
//! subscribers.
//!
//! [`EventPublisher`] validates an event, appends it to the store, records its
//! lineage, and only then publishes it on the bus. [`CausalityTracker`] keeps
//! an in-memory index of cause/effect chains and correlation groups.

pub mod causality;
pub mod publisher;

pub use causality::{
    CausalityMetadata, CausalityStatistics, CausalityTracker, EventCausalityChain,
};
pub use publisher::{EventPublisher, PublishResult, ensure_published};
