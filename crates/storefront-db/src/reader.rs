//! # Transaction Reader
//!
//! Read-only views for reporting and UI collaborators. Nothing here takes a
//! write lock, and pending orders are never visible. A listing reads headers
//! and lines inside one deferred transaction, so both come from the same
//! WAL snapshot.

use sqlx::Connection;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbResult, EngineResult};
use crate::pool::Database;
use crate::repository::catalog::CatalogRepository;
use crate::repository::orders::OrderRepository;
use crate::repository::pricing::PricingResolver;
use crate::repository::stock::StockLedger;
use storefront_core::{
    CatalogEntry, CoreError, LineItem, OrderDetails, OrderKind, OrderStatus, PriceSnapshot,
    StockRecord,
};

/// Upper bound on `list_transactions` page size.
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Clone)]
pub struct TransactionReader {
    db: Database,
}

impl TransactionReader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Units on hand across all locations.
    pub async fn stock_snapshot(&self, product_id: i64) -> EngineResult<i64> {
        let mut conn = self.db.acquire().await?;
        if !CatalogRepository::product_exists(&mut conn, product_id).await? {
            return Err(CoreError::ProductNotFound(product_id).into());
        }
        Ok(StockLedger::quantity_of(&mut conn, product_id).await?)
    }

    /// Every product with classification names, current price and total
    /// stock.
    pub async fn list_catalog(&self) -> DbResult<Vec<CatalogEntry>> {
        let mut conn = self.db.acquire().await?;
        let entries = sqlx::query_as::<_, CatalogEntry>(
            "SELECT
                p.id AS product_id,
                p.sku,
                p.name,
                c.name AS category,
                b.name AS brand,
                p.unit,
                (SELECT ps.amount_cents FROM price_snapshots ps
                  WHERE ps.product_id = p.id
                  ORDER BY ps.id DESC LIMIT 1) AS price_cents,
                COALESCE((SELECT SUM(s.quantity) FROM stock_records s
                           WHERE s.product_id = p.id), 0) AS quantity_on_hand
             FROM products p
             LEFT JOIN categories c ON c.id = p.category_id
             LEFT JOIN brands b ON b.id = p.brand_id
             ORDER BY p.name, p.id",
        )
        .fetch_all(&mut *conn)
        .await?;

        debug!(count = entries.len(), "Listed catalog");
        Ok(entries)
    }

    /// Every ledger row (product, location, quantity).
    pub async fn list_stock_snapshot(&self) -> DbResult<Vec<StockRecord>> {
        let mut conn = self.db.acquire().await?;
        StockLedger::snapshot(&mut conn).await
    }

    /// Committed orders with their lines, newest first.
    ///
    /// `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub async fn list_transactions(
        &self,
        kind: Option<OrderKind>,
        limit: i64,
    ) -> DbResult<Vec<OrderDetails>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let mut conn = self.db.acquire().await?;
        let mut tx = conn.begin().await?;

        let headers = OrderRepository::list_headers(&mut tx, kind, limit).await?;
        let mut lines_by_order: HashMap<i64, Vec<LineItem>> = HashMap::new();
        for line in OrderRepository::lines_for_listing(&mut tx, kind, limit).await? {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }
        tx.commit().await?;

        let details: Vec<OrderDetails> = headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_order.remove(&header.id).unwrap_or_default();
                OrderDetails { header, lines }
            })
            .collect();

        debug!(count = details.len(), "Listed transactions");
        Ok(details)
    }

    /// One committed order with its lines.
    pub async fn get_transaction(&self, order_id: i64) -> EngineResult<OrderDetails> {
        let mut conn = self.db.acquire().await?;

        let header = OrderRepository::get_header(&mut conn, order_id)
            .await?
            .filter(|h| h.status != OrderStatus::Pending)
            .ok_or(CoreError::OrderNotFound(order_id))?;
        let lines = OrderRepository::lines_for(&mut conn, order_id).await?;

        Ok(OrderDetails { header, lines })
    }

    /// Price history of a product, newest first.
    pub async fn price_history(&self, product_id: i64) -> EngineResult<Vec<PriceSnapshot>> {
        let mut conn = self.db.acquire().await?;
        if !CatalogRepository::product_exists(&mut conn, product_id).await? {
            return Err(CoreError::ProductNotFound(product_id).into());
        }
        Ok(PricingResolver::history(&mut conn, product_id).await?)
    }
}
