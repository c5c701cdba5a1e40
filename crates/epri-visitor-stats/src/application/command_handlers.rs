//! Command handlers for the Visitor Statistics context.
//!
//! This module contains application-level command handler functions that
//! validate input, stamp it with the clock, and hand it to the repository,
//! which applies the change atomically.

use epri_core::clock::Clock;
use epri_core::command::Command;
use epri_core::error::DomainError;
use epri_core::repository::{NewVisit, VisitOutcome, VisitRepository};
use epri_core::stats::SiteStats;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::commands::{ReconcileCounters, ResetCounters, TrackVisit};
use crate::domain::visit::{normalize_page_path, normalize_session_id};

/// Result of a handled `TrackVisit` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackVisitResult {
    /// Whether a new visit event was inserted.
    pub tracked: bool,
    /// Whether the visit was the session's first tracked visit.
    pub first_for_session: bool,
}

impl From<VisitOutcome> for TrackVisitResult {
    fn from(outcome: VisitOutcome) -> Self {
        match outcome {
            VisitOutcome::Tracked { first_for_session } => Self {
                tracked: true,
                first_for_session,
            },
            VisitOutcome::AlreadyRecorded => Self {
                tracked: false,
                first_for_session: false,
            },
        }
    }
}

/// Handles the `TrackVisit` command: validates the session id, defaults the
/// page path, and records the visit.
///
/// # Errors
///
/// Returns `DomainError::Validation` without touching the repository if the
/// session id is missing or either field is too long. Returns the
/// repository's error if recording fails.
pub async fn handle_track_visit(
    command: &TrackVisit,
    clock: &dyn Clock,
    repo: &dyn VisitRepository,
) -> Result<TrackVisitResult, DomainError> {
    let session_id = normalize_session_id(command.session_id.as_deref())?;
    let page_path = normalize_page_path(command.page_path.as_deref())?;

    let visit = NewVisit {
        visit_id: Uuid::new_v4(),
        session_id,
        page_path,
        visited_at: clock.now(),
    };

    let outcome = repo.record_visit(&visit).await?;

    debug!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        page_path = %visit.page_path,
        ?outcome,
        "visit recorded"
    );

    Ok(outcome.into())
}

/// Handles the `ResetCounters` command: clears the visit log and zeroes the
/// aggregate.
///
/// # Errors
///
/// Returns `DomainError` if the repository fails.
pub async fn handle_reset_counters(
    command: &ResetCounters,
    clock: &dyn Clock,
    repo: &dyn VisitRepository,
) -> Result<SiteStats, DomainError> {
    let stats = repo.reset(clock.now()).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        "visitor counters reset"
    );

    Ok(stats)
}

/// Handles the `ReconcileCounters` command: recomputes both counters from the
/// visit log.
///
/// # Errors
///
/// Returns `DomainError` if the repository fails.
pub async fn handle_reconcile_counters(
    command: &ReconcileCounters,
    clock: &dyn Clock,
    repo: &dyn VisitRepository,
) -> Result<SiteStats, DomainError> {
    let before = repo.load_stats().await?;
    let after = repo.reconcile(clock.now()).await?;

    if let Some(before) = before
        && (before.total_visits != after.total_visits
            || before.unique_sessions != after.unique_sessions)
    {
        info!(
            correlation_id = %command.correlation_id(),
            old_total_visits = before.total_visits,
            old_unique_sessions = before.unique_sessions,
            total_visits = after.total_visits,
            unique_sessions = after.unique_sessions,
            "visitor counters drifted; repaired from visit log"
        );
    }

    Ok(after)
}
