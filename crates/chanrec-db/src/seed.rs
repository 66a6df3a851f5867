use chanrec_core::MappingsFile;
use sqlx::PgPool;

use crate::DbError;

/// Upsert the curated catalog (products then mappings) from the mappings file.
///
/// Returns the number of rows processed (inserted or updated). All upserts
/// run inside a single transaction; if any operation fails the entire batch
/// is rolled back. Products are written before mappings so mapping rows can
/// satisfy their foreign key on first seed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, file: &MappingsFile) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for product in file.canonical_products() {
        sqlx::query(
            "INSERT INTO canonical_products \
                 (canonical_code, display_name, current_stock, minimum_stock) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (canonical_code) DO UPDATE SET \
                 display_name  = EXCLUDED.display_name, \
                 minimum_stock = EXCLUDED.minimum_stock, \
                 updated_at    = NOW()",
        )
        .bind(&product.canonical_code)
        .bind(&product.display_name)
        .bind(product.current_stock)
        .bind(product.minimum_stock)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    for mapping in file.identifier_mappings() {
        sqlx::query(
            "INSERT INTO identifier_mappings \
                 (source_type, source_value, canonical_code, display_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (source_type, source_value, canonical_code) DO UPDATE SET \
                 display_name = EXCLUDED.display_name, \
                 updated_at   = NOW()",
        )
        .bind(mapping.source_type.as_str())
        .bind(&mapping.source_value)
        .bind(&mapping.canonical_code)
        .bind(&mapping.display_name)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
