//! # Schema Migrations
//!
//! `migrations/sqlite/` at the workspace root is compiled into the binary:
//!
//! | File | Tables |
//! |------|--------|
//! | `001_initial_schema.sql` | clients, robot_pricing, lease_pricing, settings, classification sets |
//! | `002_offers_contracts.sql` | offers, offer lines, contracts, contract_versions |
//! | `003_tracking.sql` | revenue_tracking, delivery_tracking |
//!
//! Applied files are never edited; schema changes get a new numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever is pending. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    debug!(total, applied, "Migration status");

    MIGRATOR.run(pool).await?;

    if applied < total {
        info!(applied = total - applied, "Schema migrated");
    }
    Ok(())
}

/// `(known, applied)` migration counts. A fresh database has applied 0.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = MIGRATOR.migrations.len();

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if table_exists == 0 {
        return Ok((known, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((known, usize::try_from(applied).unwrap_or_default()))
}
