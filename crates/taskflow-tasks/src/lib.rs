//! Taskflow — task lifecycle workflow context.
//!
//! Responsible for creating tasks, submitting them for QC, and recording
//! whether the QC verdict accepted them or sent them back for rework.

pub mod application;
pub mod domain;
