//! Commands for the Visitor Statistics context.

use epri_core::command::Command;
use uuid::Uuid;

/// Command to record a page visit for a session.
///
/// Fields hold the raw client input; the handler validates them.
#[derive(Debug, Clone)]
pub struct TrackVisit {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The client's session identifier. Required.
    pub session_id: Option<String>,
    /// The visited page. Defaults to `/`.
    pub page_path: Option<String>,
}

impl Command for TrackVisit {
    fn command_type(&self) -> &'static str {
        "visitor_stats.track_visit"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to clear the visit log and zero the counters.
#[derive(Debug, Clone)]
pub struct ResetCounters {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for ResetCounters {
    fn command_type(&self) -> &'static str {
        "visitor_stats.reset_counters"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to recompute the counters from the visit log.
#[derive(Debug, Clone)]
pub struct ReconcileCounters {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl Command for ReconcileCounters {
    fn command_type(&self) -> &'static str {
        "visitor_stats.reconcile_counters"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
