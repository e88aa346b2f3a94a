//! Taskflow — quality control workflow context.
//!
//! Records QC verdicts on submitted tasks, keeps the queue of submissions
//! awaiting review, and turns each verdict into the matching task outcome.

pub mod application;
pub mod domain;
