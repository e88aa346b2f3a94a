//! Taskflow Event Store — append-only history of domain events.

pub mod in_memory_event_store;

pub use in_memory_event_store::InMemoryEventStore;
