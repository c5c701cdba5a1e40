//! Query handlers for the Visitor Statistics context.

use chrono::{DateTime, Utc};
use epri_core::clock::Clock;
use epri_core::error::DomainError;
use epri_core::repository::VisitRepository;
use epri_core::stats::SiteStats;
use serde::Serialize;

/// Read-only view of the site statistics aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatsView {
    /// Number of tracked visits.
    pub total_visits: i64,
    /// Number of distinct sessions with at least one tracked visit.
    pub unique_sessions: i64,
    /// When counting started.
    pub since: DateTime<Utc>,
    /// When the counters last changed.
    pub last_updated: DateTime<Utc>,
}

impl From<SiteStats> for SiteStatsView {
    fn from(stats: SiteStats) -> Self {
        Self {
            total_visits: stats.total_visits,
            unique_sessions: stats.unique_sessions,
            since: stats.created_at,
            last_updated: stats.updated_at,
        }
    }
}

/// Retrieves the current site statistics. When no aggregate row exists yet,
/// returns zero counters stamped with the current time; the row is not
/// created.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository is unavailable.
pub async fn get_site_stats(
    clock: &dyn Clock,
    repo: &dyn VisitRepository,
) -> Result<SiteStatsView, DomainError> {
    let stats = repo
        .load_stats()
        .await?
        .unwrap_or_else(|| SiteStats::empty(clock.now()));
    Ok(stats.into())
}
