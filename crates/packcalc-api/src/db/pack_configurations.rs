//! Pack configuration persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `pack_configurations`
//! table. Rows are unique by signature, so resubmitting a known set reuses
//! its row (and its memoized calculations).

use chrono::{DateTime, Utc};
use packcalc_core::{PackError, PackSizeSet};
use sqlx::PgPool;

use super::order_calculations::to_bigint;

/// A stored configuration as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredConfiguration {
    pub id: i64,
    pub pack_sizes: Vec<i64>,
    pub signature: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl StoredConfiguration {
    /// Re-validate the stored sizes; limits may have changed since they
    /// were written.
    pub fn into_sizes(self) -> (i64, Result<PackSizeSet, PackError>) {
        (self.id, PackSizeSet::normalize(self.pack_sizes))
    }
}

/// Make `sizes` the single active configuration, returning its row id.
///
/// Deactivation and upsert run in one transaction, so readers never see zero
/// or two active rows.
pub async fn activate(pool: &PgPool, sizes: &PackSizeSet) -> Result<i64, sqlx::Error> {
    let pack_sizes = to_bigints(sizes)?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE pack_configurations SET active = FALSE, updated_at = now() WHERE active")
        .execute(&mut *tx)
        .await?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO pack_configurations (pack_sizes, signature, active)
         VALUES ($1, $2, TRUE)
         ON CONFLICT (signature)
         DO UPDATE SET active = TRUE, updated_at = now()
         RETURNING id",
    )
    .bind(&pack_sizes)
    .bind(sizes.signature())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Sizes as stored in the `BIGINT[]` column, largest first.
fn to_bigints(sizes: &PackSizeSet) -> Result<Vec<i64>, sqlx::Error> {
    sizes.iter().map(|s| to_bigint(s.get())).collect()
}

/// Fetch the active configuration, if one has been stored.
pub async fn get_active(pool: &PgPool) -> Result<Option<StoredConfiguration>, sqlx::Error> {
    let row = sqlx::query_as::<_, PackConfigurationRow>(
        "SELECT id, pack_sizes, signature, active, updated_at
         FROM pack_configurations WHERE active
         ORDER BY updated_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(PackConfigurationRow::into_record))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct PackConfigurationRow {
    id: i64,
    pack_sizes: Vec<i64>,
    signature: String,
    active: bool,
    updated_at: DateTime<Utc>,
}

impl PackConfigurationRow {
    fn into_record(self) -> StoredConfiguration {
        StoredConfiguration {
            id: self.id,
            pack_sizes: self.pack_sizes,
            signature: self.signature,
            active: self.active,
            updated_at: self.updated_at,
        }
    }
}
