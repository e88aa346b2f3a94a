//! Command abstractions.

/// Trait that all use-case commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID grouping every event this command causes.
    fn correlation_id(&self) -> &str;
}
