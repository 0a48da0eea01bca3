//! # Pricing Resolver
//!
//! Prices are an append-only log per product. The current price is the most
//! recently created snapshot; older rows are history.
//!
//! ```text
//! price_snapshots (product 7)
//!   id 12  4500  2026-01-02   ← history
//!   id 31  5000  2026-03-15   ← current_price(7) = $50.00
//! ```
//!
//! Orders copy the resolved price into their lines, so a new snapshot never
//! changes an order that already exists.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbResult, EngineResult};
use crate::repository::catalog::CatalogRepository;
use storefront_core::validation::validate_price_cents;
use storefront_core::{CoreError, Money, PriceSnapshot};

pub struct PricingResolver;

impl PricingResolver {
    /// Current selling price of a product.
    ///
    /// Fails with `NoPriceConfigured` if the product has no snapshot. There is
    /// no zero fallback.
    pub async fn current_price(conn: &mut SqliteConnection, product_id: i64) -> EngineResult<Money> {
        let amount: Option<i64> = sqlx::query_scalar(
            "SELECT amount_cents FROM price_snapshots
             WHERE product_id = ?1
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        match amount {
            Some(cents) => Ok(Money::from_cents(cents)),
            None => Err(CoreError::NoPriceConfigured { product_id }.into()),
        }
    }

    /// Appends a new price for a product. Negative amounts are rejected.
    pub async fn record_price(
        conn: &mut SqliteConnection,
        product_id: i64,
        amount: Money,
    ) -> EngineResult<PriceSnapshot> {
        validate_price_cents(amount.cents())?;
        if !CatalogRepository::product_exists(conn, product_id).await? {
            return Err(CoreError::ProductNotFound(product_id).into());
        }

        debug!(product_id, amount_cents = amount.cents(), "Recording price snapshot");

        let snapshot = sqlx::query_as::<_, PriceSnapshot>(
            "INSERT INTO price_snapshots (product_id, amount_cents, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, product_id, amount_cents, created_at",
        )
        .bind(product_id)
        .bind(amount.cents())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(snapshot)
    }

    /// All snapshots of a product, newest first.
    pub async fn history(conn: &mut SqliteConnection, product_id: i64) -> DbResult<Vec<PriceSnapshot>> {
        let rows = sqlx::query_as::<_, PriceSnapshot>(
            "SELECT id, product_id, amount_cents, created_at
             FROM price_snapshots
             WHERE product_id = ?1
             ORDER BY id DESC",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, EngineError};
    use crate::testing::{memory_db, product};

    #[tokio::test]
    async fn test_missing_price_is_an_error_not_zero() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "P-1").await;

        let err = PricingResolver::current_price(&mut conn, id).await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&CoreError::NoPriceConfigured { product_id: id })
        );
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "P-1").await;

        PricingResolver::record_price(&mut conn, id, Money::from_cents(4_500)).await.unwrap();
        PricingResolver::record_price(&mut conn, id, Money::from_cents(5_000)).await.unwrap();

        let price = PricingResolver::current_price(&mut conn, id).await.unwrap();
        assert_eq!(price.cents(), 5_000);

        let history = PricingResolver::history(&mut conn, id).await.unwrap();
        let amounts: Vec<i64> = history.iter().map(|s| s.amount_cents).collect();
        assert_eq!(amounts, vec![5_000, 4_500]);
    }

    #[tokio::test]
    async fn test_record_price_validation() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "P-1").await;

        let negative = PricingResolver::record_price(&mut conn, id, Money::from_cents(-1)).await;
        assert!(matches!(negative, Err(EngineError::Domain(CoreError::Validation(_)))));

        let unknown = PricingResolver::record_price(&mut conn, 404, Money::from_cents(100)).await;
        assert!(matches!(unknown, Err(EngineError::Domain(CoreError::ProductNotFound(404)))));

        // zero is a legitimate price
        PricingResolver::record_price(&mut conn, id, Money::zero()).await.unwrap();
        assert!(PricingResolver::current_price(&mut conn, id).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_snapshots_cannot_be_rewritten() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let id = product(&mut conn, "P-1").await;
        PricingResolver::record_price(&mut conn, id, Money::from_cents(100)).await.unwrap();

        let update = sqlx::query("UPDATE price_snapshots SET amount_cents = 1")
            .execute(&mut *conn)
            .await
            .map_err(DbError::from);
        assert!(matches!(update, Err(DbError::QueryFailed(_))));

        let delete = sqlx::query("DELETE FROM price_snapshots")
            .execute(&mut *conn)
            .await;
        assert!(delete.is_err());
    }
}
