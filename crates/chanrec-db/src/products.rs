//! Database operations for `canonical_products`.

use chanrec_core::CanonicalProduct;
use sqlx::PgPool;

use crate::DbError;

/// Upserts a canonical product row.
///
/// Conflicts on `canonical_code` update the display name and minimum stock
/// but deliberately leave `current_stock` alone: stock is owned by the
/// applied-deltas path, not by catalog refreshes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, product: &CanonicalProduct) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO canonical_products \
             (canonical_code, display_name, current_stock, minimum_stock) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (canonical_code) DO UPDATE SET \
             display_name  = EXCLUDED.display_name, \
             minimum_stock = EXCLUDED.minimum_stock, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(&product.canonical_code)
    .bind(&product.display_name)
    .bind(product.current_stock)
    .bind(product.minimum_stock)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetches `(canonical_code, current_stock)` pairs for ledger construction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_stock_levels(pool: &PgPool) -> Result<Vec<(String, i64)>, DbError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT canonical_code, current_stock FROM canonical_products ORDER BY canonical_code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
