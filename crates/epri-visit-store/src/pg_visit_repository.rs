//! `PostgreSQL` implementation of the `VisitRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};

use epri_core::error::DomainError;
use epri_core::repository::{NewVisit, VisitOutcome, VisitRepository};
use epri_core::stats::{CounterIncrement, SiteStats};

/// Advisory lock class for per-session serialization of `record_visit`.
const SESSION_LOCK_CLASS: i32 = 0x5649_5354;

/// Waits out an in-flight reset or reconcile before the returning-session
/// check reads the log. Does not conflict with other visit transactions.
const LOCK_VISIT_LOG_FOR_INSERT: &str = "LOCK TABLE visit_events IN ROW EXCLUSIVE MODE";

const LOCK_SESSION: &str = "SELECT pg_advisory_xact_lock($1, hashtext($2))";

const SESSION_HAS_VISITS: &str =
    "SELECT EXISTS (SELECT 1 FROM visit_events WHERE session_id = $1)";

const INSERT_VISIT: &str = r"
INSERT INTO visit_events (id, session_id, page_path, visited_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (session_id, page_path) DO NOTHING
";

const INCREMENT_STATS: &str = r"
INSERT INTO site_stats (id, total_visits, unique_sessions, created_at, updated_at)
VALUES (1, $1, $2, $5, $5)
ON CONFLICT (id) DO UPDATE SET
    total_visits    = site_stats.total_visits + $3,
    unique_sessions = site_stats.unique_sessions + $4,
    updated_at      = EXCLUDED.updated_at
";

const SELECT_STATS: &str = r"
SELECT total_visits, unique_sessions, created_at, updated_at
FROM site_stats
WHERE id = 1
";

/// Blocks concurrent `record_visit` transactions until the holder commits.
const LOCK_VISIT_LOG: &str = "LOCK TABLE visit_events IN SHARE ROW EXCLUSIVE MODE";

const DELETE_VISITS: &str = "DELETE FROM visit_events";

const ZERO_STATS: &str = r"
INSERT INTO site_stats (id, total_visits, unique_sessions, created_at, updated_at)
VALUES (1, 0, 0, $1, $1)
ON CONFLICT (id) DO UPDATE SET
    total_visits    = 0,
    unique_sessions = 0,
    updated_at      = EXCLUDED.updated_at
RETURNING total_visits, unique_sessions, created_at, updated_at
";

const RECOUNT_STATS: &str = r"
INSERT INTO site_stats (id, total_visits, unique_sessions, created_at, updated_at)
SELECT 1, COUNT(*), COUNT(DISTINCT session_id), $1, $1
FROM visit_events
ON CONFLICT (id) DO UPDATE SET
    total_visits    = EXCLUDED.total_visits,
    unique_sessions = EXCLUDED.unique_sessions,
    updated_at      = EXCLUDED.updated_at
RETURNING total_visits, unique_sessions, created_at, updated_at
";

#[derive(Debug, FromRow)]
struct SiteStatsRow {
    total_visits: i64,
    unique_sessions: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SiteStatsRow> for SiteStats {
    fn from(row: SiteStatsRow) -> Self {
        Self {
            total_visits: row.total_visits,
            unique_sessions: row.unique_sessions,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Maps driver errors onto the domain taxonomy. Constraint violations mean
/// the schema invariants were broken and are reported separately from
/// ordinary connectivity failures.
fn map_sqlx_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() || db_err.is_check_violation() =>
        {
            warn!(constraint = ?db_err.constraint(), "site statistics constraint violated");
            DomainError::Integrity(db_err.message().to_owned())
        }
        _ => DomainError::Infrastructure(err.to_string()),
    }
}

/// PostgreSQL-backed visit repository.
#[derive(Debug, Clone)]
pub struct PgVisitRepository {
    pool: PgPool,
}

impl PgVisitRepository {
    /// Creates a new `PgVisitRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record_visit(&self, visit: &NewVisit) -> Result<VisitOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(LOCK_VISIT_LOG_FOR_INSERT)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(LOCK_SESSION)
            .bind(SESSION_LOCK_CLASS)
            .bind(&visit.session_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Evaluated before the insert so the new row cannot count itself.
        let returning_session: bool = sqlx::query_scalar(SESSION_HAS_VISITS)
            .bind(&visit.session_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let inserted = sqlx::query(INSERT_VISIT)
            .bind(visit.visit_id)
            .bind(&visit.session_id)
            .bind(&visit.page_path)
            .bind(visit.visited_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if inserted == 0 {
            tx.commit().await.map_err(map_sqlx_error)?;
            debug!(page_path = %visit.page_path, "visit already recorded");
            return Ok(VisitOutcome::AlreadyRecorded);
        }

        let first_for_session = !returning_session;
        let increment = CounterIncrement::for_visit(first_for_session);

        sqlx::query(INCREMENT_STATS)
            .bind(CounterIncrement::BOOTSTRAP.total_visits)
            .bind(CounterIncrement::BOOTSTRAP.unique_sessions)
            .bind(increment.total_visits)
            .bind(increment.unique_sessions)
            .bind(visit.visited_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(VisitOutcome::Tracked { first_for_session })
    }

    async fn load_stats(&self) -> Result<Option<SiteStats>, DomainError> {
        let row: Option<SiteStatsRow> = sqlx::query_as(SELECT_STATS)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SiteStats::from))
    }

    async fn reset(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(LOCK_VISIT_LOG)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let deleted = sqlx::query(DELETE_VISITS)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let row: SiteStatsRow = sqlx::query_as(ZERO_STATS)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(deleted, "visit log cleared");
        Ok(row.into())
    }

    async fn reconcile(&self, now: DateTime<Utc>) -> Result<SiteStats, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(LOCK_VISIT_LOG)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let row: SiteStatsRow = sqlx::query_as(RECOUNT_STATS)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
