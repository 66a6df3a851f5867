//! Database operations for `order_line_items`.

use chrono::{DateTime, Utc};
use chanrec_core::{OrderLineItem, Platform};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `order_line_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineItemRow {
    pub id: i64,
    pub platform: String,
    pub external_order_id: String,
    pub line_item_id: String,
    pub raw_sku: String,
    pub raw_option_text: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LineItemRow> for OrderLineItem {
    type Error = DbError;

    fn try_from(row: LineItemRow) -> Result<Self, DbError> {
        Ok(OrderLineItem {
            platform: Platform::parse(&row.platform)?,
            external_order_id: row.external_order_id,
            line_item_id: row.line_item_id,
            raw_sku: row.raw_sku,
            raw_option_text: row.raw_option_text,
            quantity: row.quantity,
            unit_price: row.unit_price,
            observed_at: row.observed_at,
        })
    }
}

/// Upserts one raw line item.
///
/// Re-delivery of the same `(platform, external_order_id, line_item_id)`
/// updates the payload fields in place; line identity never changes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_line_item(pool: &PgPool, item: &OrderLineItem) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_line_items \
             (platform, external_order_id, line_item_id, raw_sku, raw_option_text, \
              quantity, unit_price, observed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (platform, external_order_id, line_item_id) DO UPDATE SET \
             raw_sku         = EXCLUDED.raw_sku, \
             raw_option_text = EXCLUDED.raw_option_text, \
             quantity        = EXCLUDED.quantity, \
             unit_price      = EXCLUDED.unit_price, \
             observed_at     = EXCLUDED.observed_at \
         RETURNING id",
    )
    .bind(item.platform.as_str())
    .bind(&item.external_order_id)
    .bind(&item.line_item_id)
    .bind(&item.raw_sku)
    .bind(&item.raw_option_text)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.observed_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Upserts a batch of line items inside one transaction. Returns how many
/// rows were written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails; the whole batch rolls back.
pub async fn upsert_line_items(pool: &PgPool, items: &[OrderLineItem]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_line_items \
                 (platform, external_order_id, line_item_id, raw_sku, raw_option_text, \
                  quantity, unit_price, observed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (platform, external_order_id, line_item_id) DO UPDATE SET \
                 raw_sku         = EXCLUDED.raw_sku, \
                 raw_option_text = EXCLUDED.raw_option_text, \
                 quantity        = EXCLUDED.quantity, \
                 unit_price      = EXCLUDED.unit_price, \
                 observed_at     = EXCLUDED.observed_at",
        )
        .bind(item.platform.as_str())
        .bind(&item.external_order_id)
        .bind(&item.line_item_id)
        .bind(&item.raw_sku)
        .bind(&item.raw_option_text)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.observed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(items.len())
}

/// Fetches line items with `observed_at` in `[from, to)`, ordered by
/// `observed_at` then id so resolution input order is stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// stored platform value no longer parses.
pub async fn fetch_line_items_between(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<OrderLineItem>, DbError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
        "SELECT id, platform, external_order_id, line_item_id, raw_sku, raw_option_text, \
                quantity, unit_price, observed_at, created_at \
         FROM order_line_items \
         WHERE observed_at >= $1 AND observed_at < $2 \
         ORDER BY observed_at, id",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(OrderLineItem::try_from).collect()
}
