//! PostgreSQL persistence for visit events and the site statistics row.

pub mod pg_visit_repository;

use sqlx::migrate::Migrator;

/// Embedded schema migrations, shared with `#[sqlx::test]` fixtures.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
