//! Database operations for `reconcile_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `reconcile_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReconcileRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: i32,
    pub items_resolved: i32,
    pub clamp_events: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters recorded when a run completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub items_processed: i32,
    pub items_resolved: i32,
    pub clamp_events: i32,
}

/// Creates a new reconcile run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or fetch fails.
pub async fn create_reconcile_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<ReconcileRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ReconcileRunRow>(
        "INSERT INTO reconcile_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING id, public_id, trigger_source, status, started_at, completed_at, \
                   items_processed, items_resolved, clamp_events, error_message, created_at",
    )
    .bind(public_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_reconcile_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconcile_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded`, sets `completed_at = NOW()` and the totals.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_reconcile_run(
    pool: &PgPool,
    id: i64,
    totals: RunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconcile_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             items_processed = $1, items_resolved = $2, clamp_events = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(totals.items_processed)
    .bind(totals.items_resolved)
    .bind(totals.clamp_events)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, sets `completed_at = NOW()` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_reconcile_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconcile_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_reconcile_run(pool: &PgPool, id: i64) -> Result<ReconcileRunRow, DbError> {
    let row = sqlx::query_as::<_, ReconcileRunRow>(
        "SELECT id, public_id, trigger_source, status, started_at, completed_at, \
                items_processed, items_resolved, clamp_events, error_message, created_at \
         FROM reconcile_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reconcile_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ReconcileRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ReconcileRunRow>(
        "SELECT id, public_id, trigger_source, status, started_at, completed_at, \
                items_processed, items_resolved, clamp_events, error_message, created_at \
         FROM reconcile_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
