//! Durable, idempotent stock delta application.
//!
//! Mirrors the semantics of `chanrec_core::ledger::InventoryLedger`: the
//! unique `idempotency_key` on `applied_deltas` is the atomic
//! check-and-record, and `SELECT ... FOR UPDATE` on the product row
//! serializes concurrent decrements of the same code.

use chanrec_core::ledger::ApplyOutcome;
use chanrec_core::StockDelta;
use sqlx::PgPool;

use crate::DbError;

/// Applies one stock delta exactly once.
///
/// The insert into `applied_deltas` and the stock update commit together;
/// a re-delivered key hits the `ON CONFLICT DO NOTHING` and the transaction
/// rolls back having changed nothing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls back.
pub async fn apply_stock_delta(
    pool: &PgPool,
    delta: &StockDelta,
    floor: i64,
) -> Result<ApplyOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO applied_deltas (idempotency_key, canonical_code, delta) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (idempotency_key) DO NOTHING",
    )
    .bind(&delta.idempotency_key)
    .bind(&delta.canonical_code)
    .bind(delta.delta)
    .execute(&mut *tx)
    .await;

    // A foreign-key violation here means the canonical code has no product
    // row; report it without recording anything.
    let inserted = match inserted {
        Ok(result) => result,
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_foreign_key_violation() => {
            tx.rollback().await?;
            return Ok(ApplyOutcome::UnknownCode);
        }
        Err(e) => return Err(e.into()),
    };

    if inserted.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(ApplyOutcome::AlreadyApplied);
    }

    let current_stock: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT current_stock FROM canonical_products WHERE canonical_code = $1 FOR UPDATE",
    )
    .bind(&delta.canonical_code)
    .fetch_one(&mut *tx)
    .await?;

    let target = current_stock - delta.delta;
    let clamped = target < floor;
    let new_stock = target.max(floor);

    sqlx::query(
        "UPDATE canonical_products \
         SET current_stock = $1, updated_at = NOW() \
         WHERE canonical_code = $2",
    )
    .bind(new_stock)
    .bind(&delta.canonical_code)
    .execute(&mut *tx)
    .await?;

    if clamped {
        sqlx::query("UPDATE applied_deltas SET clamped = TRUE WHERE idempotency_key = $1")
            .bind(&delta.idempotency_key)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(ApplyOutcome::Applied { new_stock, clamped })
}

/// Number of deltas recorded so far, optionally scoped to one code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_applied(pool: &PgPool, canonical_code: Option<&str>) -> Result<i64, DbError> {
    let count: i64 = match canonical_code {
        Some(code) => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM applied_deltas WHERE canonical_code = $1",
            )
            .bind(code)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applied_deltas")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}
