//! Domain events for the issue tracking context.

use serde::{Deserialize, Serialize};
use taskflow_core::event::EventPayload;

/// Emitted when an issue is opened against a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOpened {
    /// The issue identifier.
    pub issue_id: String,
    /// The task the issue was raised against.
    pub task_id: String,
    /// What needs fixing.
    pub description: String,
}

/// Emitted when an issue is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueResolved {
    /// The issue identifier.
    pub issue_id: String,
    /// How it was resolved.
    pub resolution: String,
}

/// Event type identifier for [`IssueOpened`].
pub const ISSUE_OPENED_EVENT_TYPE: &str = "issue.opened";

/// Event type identifier for [`IssueResolved`].
pub const ISSUE_RESOLVED_EVENT_TYPE: &str = "issue.resolved";

/// Event payload variants for the issue tracking context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueEventKind {
    /// An issue has been opened.
    Opened(IssueOpened),
    /// An issue has been resolved.
    Resolved(IssueResolved),
}

impl IssueEventKind {
    /// True when `event_type` belongs to this context.
    #[must_use]
    pub fn is_issue_event(event_type: &str) -> bool {
        event_type == ISSUE_OPENED_EVENT_TYPE || event_type == ISSUE_RESOLVED_EVENT_TYPE
    }
}

impl EventPayload for IssueEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Opened(_) => ISSUE_OPENED_EVENT_TYPE,
            Self::Resolved(_) => ISSUE_RESOLVED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
