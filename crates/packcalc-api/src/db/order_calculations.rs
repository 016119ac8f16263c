//! Calculation memo persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `order_calculations`
//! table, keyed by `(configuration_id, order_quantity)`. The allocations are
//! stored as JSONB.

use chrono::{DateTime, Utc};
use packcalc_core::{Decomposition, OrderQuantity, PackAllocation};
use sqlx::PgPool;

/// Look up a memoized result for an order under a configuration.
pub async fn find(
    pool: &PgPool,
    configuration_id: i64,
    order_quantity: i64,
) -> Result<Option<Decomposition>, sqlx::Error> {
    let row = sqlx::query_as::<_, OrderCalculationRow>(
        "SELECT order_quantity, result, created_at
         FROM order_calculations
         WHERE configuration_id = $1 AND order_quantity = $2",
    )
    .bind(configuration_id)
    .bind(order_quantity)
    .fetch_optional(pool)
    .await?;

    row.map(OrderCalculationRow::into_decomposition).transpose()
}

/// Store a solved order. An existing row for the same key is left untouched.
pub async fn insert(
    pool: &PgPool,
    configuration_id: i64,
    decomposition: &Decomposition,
) -> Result<(), sqlx::Error> {
    let order_quantity = to_bigint(decomposition.order_quantity().get())?;
    let total_items = to_bigint(decomposition.total_items())?;
    let total_packs = to_bigint(decomposition.total_packs())?;
    let result = serde_json::to_value(decomposition.allocations())
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        "INSERT INTO order_calculations
         (configuration_id, order_quantity, result, total_items, total_packs)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (configuration_id, order_quantity) DO NOTHING",
    )
    .bind(configuration_id)
    .bind(order_quantity)
    .bind(result)
    .bind(total_items)
    .bind(total_packs)
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) fn to_bigint(value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct OrderCalculationRow {
    order_quantity: i64,
    result: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl OrderCalculationRow {
    fn into_decomposition(self) -> Result<Decomposition, sqlx::Error> {
        let order = u64::try_from(self.order_quantity)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let allocations: Vec<PackAllocation> = serde_json::from_value(self.result)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        tracing::trace!(order, created_at = %self.created_at, "memoized calculation found");
        Ok(Decomposition::new(OrderQuantity::new(order), allocations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(order_quantity: i64, result: serde_json::Value) -> OrderCalculationRow {
        OrderCalculationRow {
            order_quantity,
            result,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_decodes_allocations() {
        let d = row(501, json!([{"size": 500, "quantity": 1}, {"size": 250, "quantity": 1}]))
            .into_decomposition()
            .unwrap();
        assert_eq!(d.order_quantity().get(), 501);
        assert_eq!(d.total_items(), 750);
        assert_eq!(d.total_packs(), 2);
    }

    #[test]
    fn corrupt_rows_are_decode_errors() {
        assert!(matches!(
            row(1, json!({"size": 1})).into_decomposition(),
            Err(sqlx::Error::Decode(_))
        ));
        assert!(matches!(
            row(-1, json!([])).into_decomposition(),
            Err(sqlx::Error::Decode(_))
        ));
    }

    #[test]
    fn oversized_values_are_encode_errors() {
        assert!(matches!(to_bigint(u64::MAX), Err(sqlx::Error::Encode(_))));
        assert_eq!(to_bigint(42).unwrap(), 42);
    }
}
