//! Domain layer for the task lifecycle context.

pub mod aggregates;
pub mod commands;
pub mod events;
