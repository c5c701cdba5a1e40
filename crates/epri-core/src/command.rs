//! Command abstractions.

use uuid::Uuid;

/// Trait implemented by every state-changing request the service handles.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable command name used in logs.
    fn command_type(&self) -> &'static str;

    /// Correlation ID that ties the command to its log lines.
    fn correlation_id(&self) -> Uuid;
}
