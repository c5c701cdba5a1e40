//! The site-wide visit aggregate and the rule that moves it.

use chrono::{DateTime, Utc};

/// Snapshot of the single site statistics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteStats {
    /// Number of tracked (deduplicated) visits.
    pub total_visits: i64,
    /// Number of distinct sessions with at least one tracked visit.
    pub unique_sessions: i64,
    /// When the aggregate row was first created.
    pub created_at: DateTime<Utc>,
    /// When either counter last changed.
    pub updated_at: DateTime<Utc>,
}

impl SiteStats {
    /// Zero-valued stats stamped with `now`. Used when no row exists yet and
    /// when counters are reset.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_visits: 0,
            unique_sessions: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Amount by which a tracked visit moves each counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterIncrement {
    /// Added to `total_visits`.
    pub total_visits: i64,
    /// Added to `unique_sessions`.
    pub unique_sessions: i64,
}

impl CounterIncrement {
    /// Values for the aggregate row created by the very first tracked visit.
    pub const BOOTSTRAP: Self = Self {
        total_visits: 1,
        unique_sessions: 1,
    };

    /// Increment for a newly tracked visit. `first_for_session` must reflect
    /// the store before this visit was inserted.
    #[must_use]
    pub fn for_visit(first_for_session: bool) -> Self {
        Self {
            total_visits: 1,
            unique_sessions: i64::from(first_for_session),
        }
    }

    /// Applies the increment to an existing aggregate, or bootstraps a new one
    /// when `current` is `None`.
    #[must_use]
    pub fn apply(self, current: Option<SiteStats>, now: DateTime<Utc>) -> SiteStats {
        match current {
            Some(stats) => SiteStats {
                total_visits: stats.total_visits + self.total_visits,
                unique_sessions: stats.unique_sessions + self.unique_sessions,
                created_at: stats.created_at,
                updated_at: now,
            },
            None => SiteStats {
                total_visits: Self::BOOTSTRAP.total_visits,
                unique_sessions: Self::BOOTSTRAP.unique_sessions,
                created_at: now,
                updated_at: now,
            },
        }
    }
}
