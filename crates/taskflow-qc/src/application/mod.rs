//! Application layer for the quality control context.

pub mod command_handlers;
pub mod queue;
pub mod verdict;
