//! In-memory and failing `VisitRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use epri_core::error::DomainError;
use epri_core::repository::{NewVisit, VisitOutcome, VisitRepository};
use epri_core::stats::{CounterIncrement, SiteStats};

#[derive(Debug, Default)]
struct State {
    visits: Vec<NewVisit>,
    stats: Option<SiteStats>,
    calls: usize,
}

/// A visit repository held in memory behind a single mutex, which makes every
/// operation atomic. Follows the same dedup and counter rules as the
/// PostgreSQL repository.
#[derive(Debug, Default)]
pub struct InMemoryVisitRepository {
    state: Mutex<State>,
}

impl InMemoryVisitRepository {
    /// Create an empty repository: no visits and no aggregate row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose aggregate row starts at `stats` with an empty
    /// visit log. Useful for simulating drifted counters.
    #[must_use]
    pub fn with_stats(stats: SiteStats) -> Self {
        Self {
            state: Mutex::new(State {
                stats: Some(stats),
                ..State::default()
            }),
        }
    }

    /// Returns a snapshot of all recorded visits in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn visits(&self) -> Vec<NewVisit> {
        self.state.lock().unwrap().visits.clone()
    }

    /// Returns the current aggregate row without counting as a call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stats(&self) -> Option<SiteStats> {
        self.state.lock().unwrap().stats
    }

    /// Returns how many repository methods have been invoked.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn record_visit(&self, visit: &NewVisit) -> Result<VisitOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if state
            .visits
            .iter()
            .any(|v| v.session_id == visit.session_id && v.page_path == visit.page_path)
        {
            return Ok(VisitOutcome::AlreadyRecorded);
        }

        let first_for_session = !state
            .visits
            .iter()
            .any(|v| v.session_id == visit.session_id);

        state.visits.push(visit.clone());
        let current = state.stats;
        state.stats =
            Some(CounterIncrement::for_visit(first_for_session).apply(current, visit.visited_at));

        Ok(VisitOutcome::Tracked { first_for_session })
    }

    async fn load_stats(&self) -> Result<Option<SiteStats>, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.stats)
    }

    async fn reset(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        state.visits.clear();
        let zeroed = match state.stats {
            Some(stats) => SiteStats {
                total_visits: 0,
                unique_sessions: 0,
                created_at: stats.created_at,
                updated_at: now,
            },
            None => SiteStats::empty(now),
        };
        state.stats = Some(zeroed);

        Ok(zeroed)
    }

    async fn reconcile(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let mut sessions: Vec<&str> = state.visits.iter().map(|v| v.session_id.as_str()).collect();
        sessions.sort_unstable();
        sessions.dedup();

        let recounted = SiteStats {
            total_visits: i64::try_from(state.visits.len()).unwrap(),
            unique_sessions: i64::try_from(sessions.len()).unwrap(),
            created_at: state.stats.map_or(now, |s| s.created_at),
            updated_at: now,
        };
        state.stats = Some(recounted);

        Ok(recounted)
    }
}

/// A visit repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingVisitRepository;

#[async_trait]
impl VisitRepository for FailingVisitRepository {
    async fn record_visit(&self, _visit: &NewVisit) -> Result<VisitOutcome, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_stats(&self) -> Result<Option<SiteStats>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn reset(&self, _now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn reconcile(&self, _now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
