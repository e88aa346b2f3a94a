//! Domain layer for the issue tracking context.

pub mod aggregates;
pub mod commands;
pub mod events;
