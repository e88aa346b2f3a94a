//! Domain layer for the quality control context.

pub mod commands;
pub mod events;
