//! Database operations for `identifier_mappings`.

use chrono::{DateTime, Utc};
use chanrec_core::{IdentifierMapping, SourceType};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `identifier_mappings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MappingRow {
    pub id: i64,
    pub source_type: String,
    pub source_value: String,
    pub canonical_code: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MappingRow> for IdentifierMapping {
    type Error = DbError;

    fn try_from(row: MappingRow) -> Result<Self, DbError> {
        Ok(IdentifierMapping {
            source_type: SourceType::parse(&row.source_type)?,
            source_value: row.source_value,
            canonical_code: row.canonical_code,
            display_name: row.display_name,
        })
    }
}

/// Upserts one mapping row.
///
/// Conflicts on the full `(source_type, source_value, canonical_code)` triple
/// refresh `display_name`; a new triple with an already-seen key inserts a
/// second row and the key becomes conflicted at snapshot build time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_mapping(pool: &PgPool, mapping: &IdentifierMapping) -> Result<(), DbError> {
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
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetches every mapping row for snapshot construction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// stored source type no longer parses.
pub async fn fetch_all_mappings(pool: &PgPool) -> Result<Vec<IdentifierMapping>, DbError> {
    let rows = sqlx::query_as::<_, MappingRow>(
        "SELECT id, source_type, source_value, canonical_code, display_name, \
                created_at, updated_at \
         FROM identifier_mappings \
         ORDER BY source_type, source_value, canonical_code",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(IdentifierMapping::try_from).collect()
}
