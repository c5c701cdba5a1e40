//! Integration tests for `PgVisitRepository`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use epri_core::repository::{NewVisit, VisitOutcome, VisitRepository};
use epri_visit_store::pg_visit_repository::PgVisitRepository;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Helper to build a `NewVisit` stamped at the fixed test time.
fn make_visit(session_id: &str, page_path: &str) -> NewVisit {
    NewVisit {
        visit_id: Uuid::new_v4(),
        session_id: session_id.to_owned(),
        page_path: page_path.to_owned(),
        visited_at: fixed_now(),
    }
}

async fn count_visit_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM visit_events")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count_stats_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM site_stats")
        .fetch_one(pool)
        .await
        .unwrap()
}

// --- load_stats ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_load_stats_returns_none_on_empty_store(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());

    let stats = repo.load_stats().await.unwrap();

    assert!(stats.is_none());
    assert_eq!(count_stats_rows(&pool).await, 0);
}

// --- record_visit ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_first_visit_bootstraps_aggregate(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());

    let outcome = repo
        .record_visit(&make_visit("new-session", "/home"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        VisitOutcome::Tracked {
            first_for_session: true
        }
    );
    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 1);
    assert_eq!(stats.unique_sessions, 1);
    assert_eq!(stats.created_at, fixed_now());
    assert_eq!(stats.updated_at, fixed_now());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_repeat_visit_is_not_tracked_twice(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());

    repo.record_visit(&make_visit("abc", "/x")).await.unwrap();
    let outcome = repo.record_visit(&make_visit("abc", "/x")).await.unwrap();

    assert_eq!(outcome, VisitOutcome::AlreadyRecorded);
    assert_eq!(count_visit_rows(&pool).await, 1);
    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 1);
    assert_eq!(stats.unique_sessions, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_returning_session_new_page_counts_total_only(pool: PgPool) {
    let repo = PgVisitRepository::new(pool);

    repo.record_visit(&make_visit("s1", "/a")).await.unwrap();
    let outcome = repo.record_visit(&make_visit("s1", "/b")).await.unwrap();

    assert_eq!(
        outcome,
        VisitOutcome::Tracked {
            first_for_session: false
        }
    );
    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 2);
    assert_eq!(stats.unique_sessions, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_new_session_on_existing_aggregate_counts_unique(pool: PgPool) {
    let repo = PgVisitRepository::new(pool);
    let later = fixed_now() + Duration::minutes(3);

    repo.record_visit(&make_visit("s1", "/a")).await.unwrap();
    let mut second = make_visit("s2", "/a");
    second.visited_at = later;
    repo.record_visit(&second).await.unwrap();

    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 2);
    assert_eq!(stats.unique_sessions, 2);
    assert_eq!(stats.created_at, fixed_now());
    assert_eq!(stats.updated_at, later);
}

// --- reset ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_reset_clears_log_and_zeroes_aggregate(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());
    repo.record_visit(&make_visit("s1", "/a")).await.unwrap();
    repo.record_visit(&make_visit("s2", "/b")).await.unwrap();
    let later = fixed_now() + Duration::hours(1);

    let stats = repo.reset(later).await.unwrap();

    assert_eq!(stats.total_visits, 0);
    assert_eq!(stats.unique_sessions, 0);
    assert_eq!(stats.created_at, fixed_now());
    assert_eq!(stats.updated_at, later);
    assert_eq!(count_visit_rows(&pool).await, 0);
    assert_eq!(count_stats_rows(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reset_on_empty_store_creates_zeroed_row(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());

    let stats = repo.reset(fixed_now()).await.unwrap();

    assert_eq!(stats.total_visits, 0);
    assert_eq!(stats.unique_sessions, 0);
    assert_eq!(count_stats_rows(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_visit_after_reset_counts_session_as_new_again(pool: PgPool) {
    let repo = PgVisitRepository::new(pool);
    repo.record_visit(&make_visit("s1", "/a")).await.unwrap();
    repo.reset(fixed_now()).await.unwrap();

    let outcome = repo.record_visit(&make_visit("s1", "/a")).await.unwrap();

    assert_eq!(
        outcome,
        VisitOutcome::Tracked {
            first_for_session: true
        }
    );
    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 1);
    assert_eq!(stats.unique_sessions, 1);
}

// --- reconcile ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_reconcile_repairs_drifted_counters(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());
    repo.record_visit(&make_visit("s1", "/a")).await.unwrap();
    repo.record_visit(&make_visit("s1", "/b")).await.unwrap();
    repo.record_visit(&make_visit("s2", "/a")).await.unwrap();
    sqlx::query("UPDATE site_stats SET total_visits = 40, unique_sessions = 17")
        .execute(&pool)
        .await
        .unwrap();

    let stats = repo.reconcile(fixed_now()).await.unwrap();

    assert_eq!(stats.total_visits, 3);
    assert_eq!(stats.unique_sessions, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reconcile_on_empty_store_creates_zeroed_row(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());

    let stats = repo.reconcile(fixed_now()).await.unwrap();

    assert_eq!(stats.total_visits, 0);
    assert_eq!(stats.unique_sessions, 0);
    assert_eq!(count_stats_rows(&pool).await, 1);
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_distinct_sessions_are_all_counted(pool: PgPool) {
    const N: i64 = 32;
    let repo = PgVisitRepository::new(pool.clone());
    let mut tasks = JoinSet::new();

    for i in 0..N {
        let repo = repo.clone();
        tasks.spawn(async move {
            repo.record_visit(&make_visit(&format!("session-{i}"), "/home"))
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().unwrap().is_tracked());
    }

    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, N);
    assert_eq!(stats.unique_sessions, N);
    assert_eq!(count_visit_rows(&pool).await, N);
    assert_eq!(count_stats_rows(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_duplicate_visits_are_counted_once(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());
    let mut tasks = JoinSet::new();

    for _ in 0..16 {
        let repo = repo.clone();
        tasks.spawn(async move { repo.record_visit(&make_visit("same", "/x")).await });
    }
    let mut tracked = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap().unwrap().is_tracked() {
            tracked += 1;
        }
    }

    assert_eq!(tracked, 1);
    assert_eq!(count_visit_rows(&pool).await, 1);
    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, 1);
    assert_eq!(stats.unique_sessions, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_pages_for_one_session_count_session_once(pool: PgPool) {
    const PAGES: i64 = 12;
    let repo = PgVisitRepository::new(pool);
    let mut tasks = JoinSet::new();

    for i in 0..PAGES {
        let repo = repo.clone();
        tasks.spawn(async move {
            repo.record_visit(&make_visit("one-session", &format!("/page/{i}")))
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let stats = repo.load_stats().await.unwrap().unwrap();
    assert_eq!(stats.total_visits, PAGES);
    assert_eq!(stats.unique_sessions, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_reset_interleaved_with_visits_keeps_aggregate_equal_to_log(pool: PgPool) {
    const VISITS: usize = 48;
    let repo = PgVisitRepository::new(pool.clone());
    let mut tasks = JoinSet::new();

    for i in 0..VISITS {
        let visit_repo = repo.clone();
        tasks.spawn(async move {
            visit_repo.record_visit(&make_visit(&format!("session-{}", i % 7), &format!("/page/{i}")))
                .await
                .map(|_| ())
        });
        if i % 8 == 3 {
            let repo = repo.clone();
            tasks.spawn(async move { repo.reset(fixed_now()).await.map(|_| ()) });
        }
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let stats = repo.load_stats().await.unwrap().unwrap();
    let (log_total, log_sessions): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COUNT(DISTINCT session_id) FROM visit_events")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stats.total_visits, log_total);
    assert_eq!(stats.unique_sessions, log_sessions);

    let recounted = repo.reconcile(fixed_now()).await.unwrap();
    assert_eq!(recounted.total_visits, stats.total_visits);
    assert_eq!(recounted.unique_sessions, stats.unique_sessions);
    assert_eq!(count_stats_rows(&pool).await, 1);
}

// --- input limits ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_longest_multibyte_session_and_path_fit_unique_index(pool: PgPool) {
    let repo = PgVisitRepository::new(pool.clone());
    // 128 four-byte chars and a 2047-byte path of three-byte chars.
    let session_id = "😀".repeat(128);
    let page_path = format!("/{}", "界".repeat(682));
    assert!(page_path.len() <= 2048);

    let outcome = repo
        .record_visit(&make_visit(&session_id, &page_path))
        .await
        .unwrap();

    assert!(outcome.is_tracked());
    assert_eq!(count_visit_rows(&pool).await, 1);
}

// --- schema invariants ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_schema_rejects_second_aggregate_row(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO site_stats (id, total_visits, unique_sessions) VALUES (2, 0, 0)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err());
}
