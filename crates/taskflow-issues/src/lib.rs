//! Taskflow — issue tracking workflow context.
//!
//! Opens an issue for every failed QC review and lets users resolve it.

pub mod application;
pub mod domain;
