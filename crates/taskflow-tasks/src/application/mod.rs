//! Application layer for the task lifecycle context.

pub mod board;
pub mod command_handlers;
pub mod query_handlers;
