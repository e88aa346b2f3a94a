//! Domain events for the quality control context.

use serde::{Deserialize, Serialize};
use taskflow_core::event::EventPayload;

/// Emitted when a submitted task passes QC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcPassed {
    /// The reviewed task.
    pub task_id: String,
    /// Which submission attempt was reviewed.
    pub attempt: u32,
    /// Reviewer notes.
    pub notes: String,
}

/// Emitted when a submitted task fails QC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcFailed {
    /// The reviewed task.
    pub task_id: String,
    /// Which submission attempt was reviewed.
    pub attempt: u32,
    /// What was wrong.
    pub notes: String,
}

/// Event type identifier for [`QcPassed`].
pub const QC_PASSED_EVENT_TYPE: &str = "qc.passed";

/// Event type identifier for [`QcFailed`].
pub const QC_FAILED_EVENT_TYPE: &str = "qc.failed";

/// Event payload variants for the quality control context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QcEventKind {
    /// QC passed.
    Passed(QcPassed),
    /// QC failed.
    Failed(QcFailed),
}

impl QcEventKind {
    /// True when `event_type` is a QC verdict.
    #[must_use]
    pub fn is_verdict(event_type: &str) -> bool {
        event_type == QC_PASSED_EVENT_TYPE || event_type == QC_FAILED_EVENT_TYPE
    }
}

impl EventPayload for QcEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Passed(_) => QC_PASSED_EVENT_TYPE,
            Self::Failed(_) => QC_FAILED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
