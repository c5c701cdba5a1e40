//! Visit repository abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::stats::SiteStats;

/// A visit that has passed validation and is ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    /// Identifier assigned to the visit event if it gets inserted.
    pub visit_id: Uuid,
    /// Opaque client session identifier.
    pub session_id: String,
    /// Normalized page path; never empty.
    pub page_path: String,
    /// Time of the visit.
    pub visited_at: DateTime<Utc>,
}

/// What happened when a visit was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// A new visit event was inserted and the aggregate was updated.
    Tracked {
        /// Whether this was the session's first tracked visit.
        first_for_session: bool,
    },
    /// The `(session_id, page_path)` pair was already known; nothing changed.
    AlreadyRecorded,
}

impl VisitOutcome {
    /// Returns `true` if a new visit event was inserted.
    #[must_use]
    pub fn is_tracked(self) -> bool {
        matches!(self, Self::Tracked { .. })
    }
}

/// Storage for the visit log and the site statistics aggregate.
///
/// Every method is atomic: implementations must never leave a visit event
/// without its aggregate update, or an aggregate change without its events.
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Insert the visit unless its `(session_id, page_path)` pair is already
    /// recorded, and move the aggregate by
    /// [`CounterIncrement::for_visit`](crate::stats::CounterIncrement::for_visit).
    async fn record_visit(&self, visit: &NewVisit) -> Result<VisitOutcome, DomainError>;

    /// Load the aggregate row, if one exists. Never creates it.
    async fn load_stats(&self) -> Result<Option<SiteStats>, DomainError>;

    /// Delete every visit event and zero the aggregate, creating it if absent.
    async fn reset(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError>;

    /// Recompute both counters from the visit log and store them.
    async fn reconcile(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError>;
}
