//! Application layer for the issue tracking context.

pub mod command_handlers;
pub mod query_handlers;
pub mod tracker;
