//! Commands for the issue tracking context.

use taskflow_core::command::Command;

/// Command to resolve an open issue.
#[derive(Debug, Clone)]
pub struct ResolveIssue {
    /// The correlation ID for tracing.
    pub correlation_id: String,
    /// The event that prompted the resolution, if any.
    pub causation_id: Option<String>,
    /// The issue identifier.
    pub issue_id: String,
    /// How it was resolved.
    pub resolution: String,
}

impl Command for ResolveIssue {
    fn command_type(&self) -> &'static str {
        "issue.resolve_issue"
    }

    fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}
