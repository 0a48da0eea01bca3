//! # Stock Ledger
//!
//! One quantity row per (product, location). The row is the single source of
//! truth for how many units exist there.
//!
//! ## Decrement Without a Read-Modify-Write Race
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE stock_records                                                   │
//! │     SET quantity = quantity - :qty                                      │
//! │   WHERE product_id = :p AND location_id = :l AND quantity >= :qty       │
//! │  RETURNING quantity                                                     │
//! │                                                                         │
//! │  row returned  → new quantity                                          │
//! │  no row        → read what is there (0 if nothing) → InsufficientStock │
//! │                                                                         │
//! │  The check and the write are one statement under the write lock, so   │
//! │  two sales of 3 against a stock of 5 cannot both pass.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing row is never created with a negative quantity, and the schema's
//! `CHECK (quantity >= 0)` backs the rule up.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbResult, EngineResult};
use storefront_core::{CoreError, StockRecord, ValidationError};

pub struct StockLedger;

fn ensure_positive(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

impl StockLedger {
    /// Adds `quantity` units, creating the row at 0 first if needed.
    /// Returns the new quantity.
    pub async fn increment(
        conn: &mut SqliteConnection,
        product_id: i64,
        location_id: i64,
        quantity: i64,
    ) -> EngineResult<i64> {
        ensure_positive(quantity)?;
        debug!(product_id, location_id, quantity, "Incrementing stock");

        let new_quantity: i64 = sqlx::query_scalar(
            "INSERT INTO stock_records (product_id, location_id, quantity, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (product_id, location_id)
             DO UPDATE SET quantity = quantity + excluded.quantity,
                           updated_at = excluded.updated_at
             RETURNING quantity",
        )
        .bind(product_id)
        .bind(location_id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(new_quantity)
    }

    /// Removes `quantity` units if at least that many are on hand.
    /// Returns the new quantity or `InsufficientStock`.
    pub async fn decrement(
        conn: &mut SqliteConnection,
        product_id: i64,
        location_id: i64,
        quantity: i64,
    ) -> EngineResult<i64> {
        ensure_positive(quantity)?;
        debug!(product_id, location_id, quantity, "Decrementing stock");

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE stock_records
             SET quantity = quantity - ?1, updated_at = ?2
             WHERE product_id = ?3 AND location_id = ?4 AND quantity >= ?1
             RETURNING quantity",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(new_quantity) => Ok(new_quantity),
            None => {
                let available = Self::quantity_at(conn, product_id, location_id).await?;
                warn!(
                    product_id,
                    location_id,
                    available,
                    requested = quantity,
                    "Rejected stock decrement"
                );
                Err(CoreError::InsufficientStock {
                    product_id,
                    available,
                    requested: quantity,
                }
                .into())
            }
        }
    }

    /// Total units across all locations (0 if the product has no rows).
    pub async fn quantity_of(conn: &mut SqliteConnection, product_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_records WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(total)
    }

    /// Units at one location (0 if there is no row).
    pub async fn quantity_at(
        conn: &mut SqliteConnection,
        product_id: i64,
        location_id: i64,
    ) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_records WHERE product_id = ?1 AND location_id = ?2",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Every ledger row, ordered by product then location.
    pub async fn snapshot(conn: &mut SqliteConnection) -> DbResult<Vec<StockRecord>> {
        let rows = sqlx::query_as::<_, StockRecord>(
            "SELECT product_id, location_id, quantity, updated_at
             FROM stock_records
             ORDER BY product_id, location_id",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::repository::catalog::CatalogRepository;
    use crate::testing::{count, memory_db, product};
    use storefront_core::DEFAULT_LOCATION_ID;

    #[tokio::test]
    async fn test_increment_creates_row_then_adds() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;

        assert_eq!(StockLedger::quantity_at(&mut conn, id, DEFAULT_LOCATION_ID).await.unwrap(), 0);
        assert_eq!(StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 5).await.unwrap(), 5);
        assert_eq!(StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 3).await.unwrap(), 8);
        assert_eq!(count(&mut conn, "stock_records").await, 1);
    }

    #[tokio::test]
    async fn test_decrement_within_stock() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;
        StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 5).await.unwrap();

        assert_eq!(StockLedger::decrement(&mut conn, id, DEFAULT_LOCATION_ID, 5).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_decrement_below_zero_is_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;
        StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 3).await.unwrap();

        let err = StockLedger::decrement(&mut conn, id, DEFAULT_LOCATION_ID, 5)
            .await
            .unwrap_err();
        let domain = err.as_domain().unwrap();
        assert_eq!(
            domain,
            &CoreError::InsufficientStock {
                product_id: id,
                available: 3,
                requested: 5
            }
        );
        assert_eq!(domain.shortfall(), Some(2));
        assert_eq!(StockLedger::quantity_at(&mut conn, id, DEFAULT_LOCATION_ID).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_decrement_without_row_never_goes_negative() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;

        let err = StockLedger::decrement(&mut conn, id, DEFAULT_LOCATION_ID, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert_eq!(count(&mut conn, "stock_records").await, 0);
    }

    #[tokio::test]
    async fn test_non_positive_quantities_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;

        assert!(StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 0).await.is_err());
        assert!(StockLedger::decrement(&mut conn, id, DEFAULT_LOCATION_ID, -2).await.is_err());
    }

    #[tokio::test]
    async fn test_quantity_of_sums_locations() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "S-1").await;
        let backroom = CatalogRepository::create_location(&mut conn, "Back Room")
            .await
            .unwrap()
            .id;

        StockLedger::increment(&mut conn, id, DEFAULT_LOCATION_ID, 4).await.unwrap();
        StockLedger::increment(&mut conn, id, backroom, 6).await.unwrap();

        assert_eq!(StockLedger::quantity_of(&mut conn, id).await.unwrap(), 10);
        assert_eq!(StockLedger::quantity_of(&mut conn, 12_345).await.unwrap(), 0);

        let rows = StockLedger::snapshot(&mut conn).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location_id, DEFAULT_LOCATION_ID);
        assert_eq!(rows[1].quantity, 6);
    }
}
