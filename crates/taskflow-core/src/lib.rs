//! Taskflow Core — the domain event model and pipeline capabilities.
//!
//! This crate defines the event envelope, its validation rules, the error
//! taxonomy, and the `EventStore` / `EventBus` traits that every workflow
//! context depends on. It contains no infrastructure code.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod store;
