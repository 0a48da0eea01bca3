//! # Transaction Coordinator
//!
//! Turns a cart (sale) or a delivery (purchase) into one atomic unit of work:
//! header, lines, stock deltas and the final status commit together or not
//! at all.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(customer, cart)                                            │
//! │       │                                                                 │
//! │       ├── merge + validate lines ............ EmptyCart / Validation   │
//! │       │                                                                 │
//! │       │   ── reads, no transaction ──                                   │
//! │       ├── customer tier ..................... CustomerNotFound         │
//! │       ├── product exists .................... ProductNotFound          │
//! │       ├── current price per line ............ NoPriceConfigured        │
//! │       ├── subtotal, discount, total (storefront-core)                   │
//! │       │                                                                 │
//! │       │   ── BEGIN ──                                                   │
//! │       ├── insert header (pending)   ← first statement is a write, so    │
//! │       │                               the write lock is taken here      │
//! │       ├── insert lines (frozen unit prices)                             │
//! │       ├── decrement stock per line ......... InsufficientStock         │
//! │       ├── pending → completed                                           │
//! │       │   ── COMMIT ── (any error above: ROLLBACK)                      │
//! │       ▼                                                                 │
//! │  OrderReceipt                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Purchases follow the same shape with supplier checks, caller-supplied
//! costs, no discount, stock increments and a final `received` status.
//!
//! ## Lock Conflicts
//! Competing writers wait on SQLite's busy timeout. If the database still
//! reports busy, the whole unit of work (reads included) runs once more;
//! after `max_attempts` the caller gets `ConcurrencyConflict`.

use chrono::Utc;
use sqlx::{Connection, Sqlite, SqliteConnection, Transaction};
use std::future::Future;
use tracing::{info, instrument, warn};

use crate::error::EngineResult;
use crate::pool::Database;
use crate::repository::catalog::CatalogRepository;
use crate::repository::orders::{NewOrder, OrderRepository};
use crate::repository::party::PartyRepository;
use crate::repository::pricing::PricingResolver;
use crate::repository::stock::StockLedger;
use storefront_core::order::{merge_sale_lines, validate_purchase_lines};
use storefront_core::{
    CoreError, CustomerTier, DiscountPolicy, OrderKind, OrderReceipt, OrderStatus, OrderTotals,
    PricedLine, PurchaseLine, SaleLine, DEFAULT_LOCATION_ID, DEFAULT_VIP_DISCOUNT_BPS,
};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Location whose ledger rows sales and purchases move.
    pub location_id: i64,
    /// VIP discount in basis points.
    pub vip_discount_bps: u32,
    /// Attempts per unit of work when the database reports a lock conflict.
    pub max_attempts: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            location_id: DEFAULT_LOCATION_ID,
            vip_discount_bps: DEFAULT_VIP_DISCOUNT_BPS,
            max_attempts: 2,
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Stateless apart from its configuration; share one per process or build
/// one per request.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    config: CoordinatorConfig,
    policy: DiscountPolicy,
}

impl Default for TransactionCoordinator {
    fn default() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            policy: DiscountPolicy::default(),
        }
    }
}

impl TransactionCoordinator {
    pub fn new(config: CoordinatorConfig) -> EngineResult<Self> {
        let policy = DiscountPolicy::new(config.vip_discount_bps)?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Records a sale and removes the sold units from stock.
    ///
    /// `customer_id = None` is a walk-in sale (no discount).
    #[instrument(skip(self, db, lines), fields(lines = lines.len()))]
    pub async fn create_sale(
        &self,
        db: &Database,
        customer_id: Option<i64>,
        lines: &[SaleLine],
    ) -> EngineResult<OrderReceipt> {
        let lines = merge_sale_lines(lines)?;
        let lines = lines.as_slice();

        self.with_retry(OrderKind::Sale, move || self.try_sale(db, customer_id, lines))
            .await
    }

    /// Records a supplier delivery and adds the received units to stock.
    #[instrument(skip(self, db, lines), fields(lines = lines.len()))]
    pub async fn create_purchase(
        &self,
        db: &Database,
        supplier_id: i64,
        lines: &[PurchaseLine],
    ) -> EngineResult<OrderReceipt> {
        validate_purchase_lines(lines)?;

        self.with_retry(OrderKind::Purchase, move || {
            self.try_purchase(db, supplier_id, lines)
        })
        .await
    }

    // -------------------------------------------------------------------------
    // Attempts
    // -------------------------------------------------------------------------

    async fn try_sale(
        &self,
        db: &Database,
        customer_id: Option<i64>,
        lines: &[SaleLine],
    ) -> EngineResult<OrderReceipt> {
        let mut conn = db.acquire().await?;

        let tier = match customer_id {
            Some(id) => {
                PartyRepository::get_customer(&mut conn, id)
                    .await?
                    .ok_or(CoreError::CustomerNotFound(id))?
                    .tier
            }
            None => CustomerTier::Standard,
        };

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            if !CatalogRepository::product_exists(&mut conn, line.product_id).await? {
                return Err(CoreError::ProductNotFound(line.product_id).into());
            }
            let unit_price = PricingResolver::current_price(&mut conn, line.product_id).await?;
            priced.push(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            });
        }

        let order = NewOrder {
            kind: OrderKind::Sale,
            customer_id,
            supplier_id: None,
            location_id: self.config.location_id,
            totals: OrderTotals::for_sale(&priced, &self.policy, tier)?,
        };

        let mut tx = conn.begin().await?;
        let written = write_order(&mut tx, &order, &priced).await;
        finish(tx, written).await
    }

    async fn try_purchase(
        &self,
        db: &Database,
        supplier_id: i64,
        lines: &[PurchaseLine],
    ) -> EngineResult<OrderReceipt> {
        let mut conn = db.acquire().await?;

        if PartyRepository::get_supplier(&mut conn, supplier_id)
            .await?
            .is_none()
        {
            return Err(CoreError::SupplierNotFound(supplier_id).into());
        }
        for line in lines {
            if !CatalogRepository::product_exists(&mut conn, line.product_id).await? {
                return Err(CoreError::ProductNotFound(line.product_id).into());
            }
        }

        let priced: Vec<PricedLine> = lines.iter().copied().map(PricedLine::from).collect();
        let order = NewOrder {
            kind: OrderKind::Purchase,
            customer_id: None,
            supplier_id: Some(supplier_id),
            location_id: self.config.location_id,
            totals: OrderTotals::for_purchase(&priced)?,
        };

        let mut tx = conn.begin().await?;
        let written = write_order(&mut tx, &order, &priced).await;
        finish(tx, written).await
    }

    /// Runs `attempt` until it succeeds, fails for a non-lock reason, or
    /// `max_attempts` lock conflicts have been seen.
    async fn with_retry<F, Fut>(&self, kind: OrderKind, mut attempt: F) -> EngineResult<OrderReceipt>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<OrderReceipt>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut tries = 1;

        loop {
            match attempt().await {
                Err(err) if err.is_retryable() => {
                    if tries >= max_attempts {
                        warn!(kind = %kind, attempts = tries, error = %err, "Giving up after lock conflicts");
                        return Err(CoreError::ConcurrencyConflict { attempts: tries }.into());
                    }
                    warn!(kind = %kind, attempt = tries, error = %err, "Lock conflict, retrying");
                    tries += 1;
                }
                other => return other,
            }
        }
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Writes header, lines and stock deltas, then closes the header.
async fn write_order(
    conn: &mut SqliteConnection,
    order: &NewOrder,
    lines: &[PricedLine],
) -> EngineResult<OrderReceipt> {
    let header = OrderRepository::insert_header(conn, order).await?;

    for line in lines {
        OrderRepository::insert_line(conn, header.id, line).await?;
    }

    for line in lines {
        match order.kind {
            OrderKind::Sale => {
                StockLedger::decrement(conn, line.product_id, order.location_id, line.quantity)
                    .await?;
            }
            OrderKind::Purchase => {
                StockLedger::increment(conn, line.product_id, order.location_id, line.quantity)
                    .await?;
            }
        }
    }

    let status = order.kind.terminal_status();
    OrderRepository::update_status(conn, header.id, OrderStatus::Pending, status, Utc::now()).await?;

    Ok(OrderReceipt {
        order_id: header.id,
        reference: header.reference,
        kind: order.kind,
        status,
        subtotal_cents: order.totals.subtotal.cents(),
        discount_cents: order.totals.discount.cents(),
        total_cents: order.totals.total.cents(),
    })
}

/// Commits on success, rolls back on failure.
async fn finish(
    tx: Transaction<'_, Sqlite>,
    written: EngineResult<OrderReceipt>,
) -> EngineResult<OrderReceipt> {
    match written {
        Ok(receipt) => {
            tx.commit().await?;
            info!(
                order_id = receipt.order_id,
                reference = %receipt.reference,
                kind = %receipt.kind,
                total = %receipt.total(),
                "Order committed"
            );
            Ok(receipt)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, EngineError};
    use crate::testing::{
        count, file_db, file_db_with, memory_db, product, remove_db_files, stocked_product,
    };
    use std::cell::Cell;
    use std::time::Duration;
    use storefront_core::Money;

    async fn stock_of(db: &Database, product_id: i64) -> i64 {
        let mut conn = db.acquire().await.unwrap();
        StockLedger::quantity_of(&mut conn, product_id).await.unwrap()
    }

    async fn row_counts(db: &Database) -> (i64, i64) {
        let mut conn = db.acquire().await.unwrap();
        (count(&mut conn, "orders").await, count(&mut conn, "order_lines").await)
    }

    fn line(product_id: i64, quantity: i64) -> SaleLine {
        SaleLine {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_sale_of_two_units_at_fifty() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            for n in 1..=6 {
                product(&mut conn, &format!("FILL-{n}")).await;
            }
            stocked_product(&mut conn, "P-7", 5_000, 10).await
        };
        assert_eq!(product_id, 7);

        let receipt = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(7, 2)])
            .await
            .unwrap();

        assert_eq!(receipt.total(), Money::from_cents(10_000));
        assert_eq!(receipt.discount_cents, 0);
        assert_eq!(receipt.status, OrderStatus::Completed);
        assert_eq!(stock_of(&db, 7).await, 8);
        assert_eq!(row_counts(&db).await, (1, 1));
    }

    #[tokio::test]
    async fn test_vip_discount_applied() {
        let db = memory_db().await;
        let (product_id, vip, standard) = {
            let mut conn = db.acquire().await.unwrap();
            let product_id = stocked_product(&mut conn, "P-1", 2_500, 100).await;
            let vip = PartyRepository::create_customer(&mut conn, "Vera", CustomerTier::Vip)
                .await
                .unwrap();
            let standard = PartyRepository::create_customer(&mut conn, "Sam", CustomerTier::Standard)
                .await
                .unwrap();
            (product_id, vip.id, standard.id)
        };
        let coordinator = TransactionCoordinator::default();

        let vip_receipt = coordinator
            .create_sale(&db, Some(vip), &[line(product_id, 4)])
            .await
            .unwrap();
        assert_eq!(vip_receipt.subtotal_cents, 10_000);
        assert_eq!(vip_receipt.discount_cents, 1_000);
        assert_eq!(vip_receipt.total_cents, 9_000);

        let standard_receipt = coordinator
            .create_sale(&db, Some(standard), &[line(product_id, 4)])
            .await
            .unwrap();
        assert_eq!(standard_receipt.total_cents, 10_000);
    }

    #[tokio::test]
    async fn test_total_equals_lines_minus_discount() {
        let db = memory_db().await;
        let (a, b, vip) = {
            let mut conn = db.acquire().await.unwrap();
            let a = stocked_product(&mut conn, "A", 1_999, 50).await;
            let b = stocked_product(&mut conn, "B", 333, 50).await;
            let vip = PartyRepository::create_customer(&mut conn, "Vera", CustomerTier::Vip)
                .await
                .unwrap();
            (a, b, vip.id)
        };

        let receipt = TransactionCoordinator::default()
            .create_sale(&db, Some(vip), &[line(a, 3), line(b, 7), line(a, 1)])
            .await
            .unwrap();

        let details = crate::reader::TransactionReader::new(db.clone())
            .get_transaction(receipt.order_id)
            .await
            .unwrap();
        let line_sum: i64 = details
            .lines
            .iter()
            .map(|l| l.quantity * l.unit_price_cents)
            .sum();

        assert_eq!(details.lines.len(), 2, "duplicate product lines are merged");
        assert_eq!(details.header.subtotal_cents, line_sum);
        assert_eq!(
            details.header.total_cents,
            line_sum - details.header.discount_cents
        );
        assert_eq!(details.header.discount_cents, (line_sum * 1_000 + 5_000) / 10_000);
    }

    #[tokio::test]
    async fn test_empty_cart_has_no_side_effects() {
        let db = memory_db().await;
        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::EmptyCart)));
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_missing_price_aborts_before_any_write() {
        let db = memory_db().await;
        let (priced, unpriced) = {
            let mut conn = db.acquire().await.unwrap();
            let priced = stocked_product(&mut conn, "A", 100, 5).await;
            let unpriced = product(&mut conn, "B").await;
            StockLedger::increment(&mut conn, unpriced, DEFAULT_LOCATION_ID, 5)
                .await
                .unwrap();
            (priced, unpriced)
        };

        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(priced, 1), line(unpriced, 1)])
            .await
            .unwrap_err();

        assert_eq!(
            err.as_domain(),
            Some(&CoreError::NoPriceConfigured {
                product_id: unpriced
            })
        );
        assert_eq!(row_counts(&db).await, (0, 0));
        assert_eq!(stock_of(&db, priced).await, 5);
        assert_eq!(stock_of(&db, unpriced).await, 5);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = memory_db().await;
        let (plenty, scarce) = {
            let mut conn = db.acquire().await.unwrap();
            let plenty = stocked_product(&mut conn, "A", 100, 10).await;
            let scarce = stocked_product(&mut conn, "B", 100, 1).await;
            (plenty, scarce)
        };

        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(plenty, 4), line(scarce, 3)])
            .await
            .unwrap_err();

        let domain = err.as_domain().unwrap();
        assert_eq!(
            domain,
            &CoreError::InsufficientStock {
                product_id: scarce,
                available: 1,
                requested: 3
            }
        );
        assert_eq!(domain.shortfall(), Some(2));

        // the decrement of `plenty` ran inside the transaction and was undone
        assert_eq!(stock_of(&db, plenty).await, 10);
        assert_eq!(stock_of(&db, scarce).await, 1);
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_forced_write_failure_rolls_back() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            let id = stocked_product(&mut conn, "A", 100, 10).await;
            sqlx::query(
                "CREATE TRIGGER fail_lines BEFORE INSERT ON order_lines
                 BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
            )
            .execute(&mut *conn)
            .await
            .unwrap();
            id
        };

        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(product_id, 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Database(DbError::QueryFailed(_))));
        assert!(!err.is_retryable());
        assert_eq!(row_counts(&db).await, (0, 0));
        assert_eq!(stock_of(&db, product_id).await, 10);
    }

    #[tokio::test]
    async fn test_sequential_sales_conserve_stock() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            stocked_product(&mut conn, "A", 150, 40).await
        };
        let coordinator = TransactionCoordinator::default();

        let before = stock_of(&db, product_id).await;
        let quantities = [1, 5, 2, 9, 3];
        for qty in quantities {
            coordinator
                .create_sale(&db, None, &[line(product_id, qty)])
                .await
                .unwrap();
        }

        let sold: i64 = quantities.iter().sum();
        assert_eq!(stock_of(&db, product_id).await, before - sold);
    }

    #[tokio::test]
    async fn test_later_price_change_does_not_touch_old_orders() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            stocked_product(&mut conn, "A", 5_000, 10).await
        };

        let receipt = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(product_id, 2)])
            .await
            .unwrap();

        {
            let mut conn = db.acquire().await.unwrap();
            PricingResolver::record_price(&mut conn, product_id, Money::from_cents(7_500))
                .await
                .unwrap();
        }

        let details = crate::reader::TransactionReader::new(db.clone())
            .get_transaction(receipt.order_id)
            .await
            .unwrap();
        assert_eq!(details.lines[0].unit_price_cents, 5_000);
        assert_eq!(details.header.total_cents, 10_000);
    }

    #[tokio::test]
    async fn test_unknown_parties_and_products() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            stocked_product(&mut conn, "A", 100, 10).await
        };
        let coordinator = TransactionCoordinator::default();

        let err = coordinator
            .create_sale(&db, Some(404), &[line(product_id, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::CustomerNotFound(404))));

        let err = coordinator
            .create_sale(&db, None, &[line(9_999, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::ProductNotFound(9_999))));

        let err = coordinator
            .create_purchase(
                &db,
                404,
                &[PurchaseLine {
                    product_id,
                    quantity: 1,
                    unit_cost_cents: 10,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(CoreError::SupplierNotFound(404))));
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_purchase_receives_stock_at_cost() {
        let db = memory_db().await;
        let (product_id, supplier_id) = {
            let mut conn = db.acquire().await.unwrap();
            // purchasing does not need a selling price
            let product_id = product(&mut conn, "A").await;
            let supplier = PartyRepository::create_supplier(&mut conn, "Metro", Some("042-111"))
                .await
                .unwrap();
            (product_id, supplier.id)
        };

        let receipt = TransactionCoordinator::default()
            .create_purchase(
                &db,
                supplier_id,
                &[
                    PurchaseLine {
                        product_id,
                        quantity: 12,
                        unit_cost_cents: 275,
                    },
                    PurchaseLine {
                        product_id,
                        quantity: 3,
                        unit_cost_cents: 0,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(receipt.kind, OrderKind::Purchase);
        assert_eq!(receipt.status, OrderStatus::Received);
        assert_eq!(receipt.subtotal_cents, 3_300);
        assert_eq!(receipt.discount_cents, 0);
        assert_eq!(receipt.total_cents, 3_300);
        assert_eq!(stock_of(&db, product_id).await, 15);
        assert_eq!(row_counts(&db).await, (1, 2));
    }

    #[tokio::test]
    async fn test_negative_cost_rejected() {
        let db = memory_db().await;
        let err = TransactionCoordinator::default()
            .create_purchase(
                &db,
                1,
                &[PurchaseLine {
                    product_id: 1,
                    quantity: 1,
                    unit_cost_cents: -50,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidCost { product_id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_cost_too_large_for_totals_rejected() {
        let db = memory_db().await;
        let (product_id, supplier_id) = {
            let mut conn = db.acquire().await.unwrap();
            let product_id = product(&mut conn, "A").await;
            let supplier = PartyRepository::create_supplier(&mut conn, "Metro", None)
                .await
                .unwrap();
            (product_id, supplier.id)
        };
        let cost: Money = "92233720368547758.07".parse().unwrap();

        let err = TransactionCoordinator::default()
            .create_purchase(
                &db,
                supplier_id,
                &[PurchaseLine {
                    product_id,
                    quantity: 2,
                    unit_cost_cents: cost.cents(),
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidCost { .. })
        ));
        assert_eq!(row_counts(&db).await, (0, 0));
        assert_eq!(stock_of(&db, product_id).await, 0);
    }

    #[tokio::test]
    async fn test_sale_total_overflow_is_an_error() {
        let db = memory_db().await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            let id = stocked_product(&mut conn, "A", 100, 10).await;
            // record_price refuses this amount, so write the row directly
            sqlx::query(
                "INSERT INTO price_snapshots (product_id, amount_cents, created_at)
                 VALUES (?1, ?2, datetime('now', '+1 minute'))",
            )
            .bind(id)
            .bind(i64::MAX / 2)
            .execute(&mut *conn)
            .await
            .unwrap();
            assert!(
                PricingResolver::record_price(&mut conn, id, Money::from_cents(i64::MAX / 2))
                    .await
                    .is_err()
            );
            id
        };

        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(product_id, 3)])
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Domain(CoreError::Validation(_))), "got {err:?}");
        assert_eq!(row_counts(&db).await, (0, 0));
        assert_eq!(stock_of(&db, product_id).await, 10);
    }

    #[tokio::test]
    async fn test_configured_location_is_used() {
        let db = memory_db().await;
        let (product_id, backroom) = {
            let mut conn = db.acquire().await.unwrap();
            let product_id = stocked_product(&mut conn, "A", 100, 0).await;
            let backroom = CatalogRepository::create_location(&mut conn, "Back Room")
                .await
                .unwrap()
                .id;
            StockLedger::increment(&mut conn, product_id, backroom, 3)
                .await
                .unwrap();
            (product_id, backroom)
        };

        let coordinator = TransactionCoordinator::new(CoordinatorConfig {
            location_id: backroom,
            ..CoordinatorConfig::default()
        })
        .unwrap();
        coordinator
            .create_sale(&db, None, &[line(product_id, 2)])
            .await
            .unwrap();

        let mut conn = db.acquire().await.unwrap();
        assert_eq!(
            StockLedger::quantity_at(&mut conn, product_id, backroom).await.unwrap(),
            1
        );
    }

    #[test]
    fn test_rejects_discount_above_hundred_percent() {
        let result = TransactionCoordinator::new(CoordinatorConfig {
            vip_discount_bps: 10_001,
            ..CoordinatorConfig::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lock_conflict_retried_then_surfaced() {
        let coordinator = TransactionCoordinator::default();
        let calls = Cell::new(0);

        let result = coordinator
            .with_retry(OrderKind::Sale, || {
                calls.set(calls.get() + 1);
                async {
                    Err::<OrderReceipt, _>(EngineError::Database(DbError::Busy(
                        "database is locked".to_string(),
                    )))
                }
            })
            .await;

        assert_eq!(calls.get(), 2);
        assert!(matches!(
            result,
            Err(EngineError::Domain(CoreError::ConcurrencyConflict { attempts: 2 }))
        ));
    }

    #[tokio::test]
    async fn test_lock_conflict_then_success() {
        let coordinator = TransactionCoordinator::default();
        let calls = Cell::new(0);

        let result = coordinator
            .with_retry(OrderKind::Purchase, || {
                calls.set(calls.get() + 1);
                let first = calls.get() == 1;
                async move {
                    if first {
                        Err(EngineError::Database(DbError::Busy("busy".to_string())))
                    } else {
                        Ok(OrderReceipt {
                            order_id: 1,
                            reference: "ref".to_string(),
                            kind: OrderKind::Purchase,
                            status: OrderStatus::Received,
                            subtotal_cents: 0,
                            discount_cents: 0,
                            total_cents: 0,
                        })
                    }
                }
            })
            .await;

        assert_eq!(calls.get(), 2);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_held_write_lock_surfaces_conflict_after_retry() {
        let (db, path) = file_db_with(|config| {
            config
                .max_connections(2)
                .busy_timeout(Duration::from_millis(100))
        })
        .await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            stocked_product(&mut conn, "A", 500, 10).await
        };

        let mut holder = db.acquire().await.unwrap();
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *holder).await.unwrap();

        let err = TransactionCoordinator::default()
            .create_sale(&db, None, &[line(product_id, 2)])
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Domain(CoreError::ConcurrencyConflict { attempts: 2 })
            ),
            "got {err:?}"
        );

        sqlx::query("ROLLBACK").execute(&mut *holder).await.unwrap();
        drop(holder);

        assert_eq!(row_counts(&db).await, (0, 0));
        assert_eq!(stock_of(&db, product_id).await, 10);

        db.close().await;
        remove_db_files(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let (db, path) = file_db(4).await;
        let product_id = {
            let mut conn = db.acquire().await.unwrap();
            stocked_product(&mut conn, "HOT", 1_000, 5).await
        };
        let coordinator = TransactionCoordinator::default();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let db = db.clone();
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .create_sale(&db, None, &[SaleLine { product_id, quantity: 3 }])
                    .await
            }));
        }

        let mut successes = 0;
        let mut shortages = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(EngineError::Domain(CoreError::InsufficientStock {
                    available: 2,
                    requested: 3,
                    ..
                })) => shortages += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!((successes, shortages), (1, 1));
        assert_eq!(stock_of(&db, product_id).await, 2);
        assert_eq!(row_counts(&db).await, (1, 1));

        db.close().await;
        remove_db_files(&path);
    }
}
