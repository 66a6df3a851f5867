//! Database operations for `daily_aggregates`.

use chrono::{DateTime, NaiveDate, Utc};
use chanrec_core::{DailyAggregate, Platform};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `daily_aggregates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyAggregateRow {
    pub id: i64,
    pub date: NaiveDate,
    pub platform: String,
    pub canonical_code: String,
    pub units: i64,
    pub gross_amount: Decimal,
    pub computed_at: DateTime<Utc>,
}

impl TryFrom<DailyAggregateRow> for DailyAggregate {
    type Error = DbError;

    fn try_from(row: DailyAggregateRow) -> Result<Self, DbError> {
        Ok(DailyAggregate {
            date: row.date,
            platform: Platform::parse(&row.platform)?,
            canonical_code: row.canonical_code,
            units: row.units,
            gross_amount: row.gross_amount,
        })
    }
}

/// Replaces aggregate rows for the touched `(date, platform)` buckets.
///
/// Deletes every existing row in the given buckets, then inserts the freshly
/// recomputed rows, all in one transaction. A bucket with no new rows is
/// simply emptied; totals are never incremented in place, so recomputing
/// after a correction converges to the same state as a clean run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction rolls back.
pub async fn replace_daily_aggregates(
    pool: &PgPool,
    buckets: &[(NaiveDate, Platform)],
    rows: &[DailyAggregate],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for (date, platform) in buckets {
        sqlx::query("DELETE FROM daily_aggregates WHERE date = $1 AND platform = $2")
            .bind(date)
            .bind(platform.as_str())
            .execute(&mut *tx)
            .await?;
    }

    for row in rows {
        sqlx::query(
            "INSERT INTO daily_aggregates (date, platform, canonical_code, units, gross_amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.date)
        .bind(row.platform.as_str())
        .bind(&row.canonical_code)
        .bind(row.units)
        .bind(row.gross_amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len())
}

/// Fetches aggregate rows for a date range, ordered by `(date, platform, code)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// stored platform value no longer parses.
pub async fn fetch_daily_aggregates(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyAggregate>, DbError> {
    let rows = sqlx::query_as::<_, DailyAggregateRow>(
        "SELECT id, date, platform, canonical_code, units, gross_amount, computed_at \
         FROM daily_aggregates \
         WHERE date >= $1 AND date < $2 \
         ORDER BY date, platform, canonical_code",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DailyAggregate::try_from).collect()
}
