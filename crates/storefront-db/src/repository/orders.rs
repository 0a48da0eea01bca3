//! # Order Repository
//!
//! Order headers and their lines. Only the coordinator writes here, always
//! inside a transaction:
//!
//! ```text
//! insert_header (pending) ──► insert_line × N ──► [stock deltas] ──► update_status
//!                                                                  (completed / received)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, EngineResult};
use storefront_core::{
    CoreError, LineItem, OrderHeader, OrderKind, OrderStatus, OrderTotals, PricedLine,
};

const HEADER_COLUMNS: &str = "id, reference, kind, status, customer_id, supplier_id, location_id, \
     subtotal_cents, discount_cents, total_cents, created_at, completed_at";

const LINE_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, line_total_cents";

/// Everything needed to write a header row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub kind: OrderKind,
    pub customer_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub location_id: i64,
    pub totals: OrderTotals,
}

pub struct OrderRepository;

impl OrderRepository {
    /// Inserts a `pending` header with a fresh UUID reference.
    pub async fn insert_header(conn: &mut SqliteConnection, order: &NewOrder) -> DbResult<OrderHeader> {
        let reference = Uuid::new_v4().to_string();
        debug!(kind = %order.kind, reference = %reference, "Inserting order header");

        let header = sqlx::query_as::<_, OrderHeader>(&format!(
            "INSERT INTO orders (
                reference, kind, status, customer_id, supplier_id, location_id,
                subtotal_cents, discount_cents, total_cents, created_at, completed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL)
             RETURNING {HEADER_COLUMNS}"
        ))
        .bind(&reference)
        .bind(order.kind)
        .bind(OrderStatus::Pending)
        .bind(order.customer_id)
        .bind(order.supplier_id)
        .bind(order.location_id)
        .bind(order.totals.subtotal.cents())
        .bind(order.totals.discount.cents())
        .bind(order.totals.total.cents())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(header)
    }

    /// Inserts one line with its frozen unit price.
    pub async fn insert_line(
        conn: &mut SqliteConnection,
        order_id: i64,
        line: &PricedLine,
    ) -> DbResult<LineItem> {
        debug!(
            order_id,
            product_id = line.product_id,
            quantity = line.quantity,
            "Inserting order line"
        );

        let item = sqlx::query_as::<_, LineItem>(&format!(
            "INSERT INTO order_lines (order_id, product_id, quantity, unit_price_cents, line_total_cents)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {LINE_COLUMNS}"
        ))
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.line_total().cents())
        .fetch_one(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Moves a header along the status machine.
    ///
    /// The update only matches a row still in `from`, so an illegal or stale
    /// transition changes nothing and reports `InvalidOrderStatus`.
    pub async fn update_status(
        conn: &mut SqliteConnection,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        let to = from.transition(to)?;
        let completed_at = to.is_terminal().then_some(at);

        let result = sqlx::query(
            "UPDATE orders SET status = ?1, completed_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(to)
        .bind(completed_at)
        .bind(order_id)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return match Self::get_header(conn, order_id).await? {
                Some(header) => Err(CoreError::InvalidOrderStatus {
                    from: header.status.to_string(),
                    to: to.to_string(),
                }
                .into()),
                None => Err(CoreError::OrderNotFound(order_id).into()),
            };
        }

        debug!(order_id, status = %to, "Order status updated");
        Ok(())
    }

    pub async fn get_header(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<OrderHeader>> {
        let header = sqlx::query_as::<_, OrderHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(header)
    }

    pub async fn lines_for(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Vec<LineItem>> {
        let lines = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(lines)
    }

    /// Lines of every order that [`OrderRepository::list_headers`] returns for
    /// the same `kind` and `limit`, in one query, ordered by order then line.
    pub async fn lines_for_listing(
        conn: &mut SqliteConnection,
        kind: Option<OrderKind>,
        limit: i64,
    ) -> DbResult<Vec<LineItem>> {
        let lines = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines
             WHERE order_id IN (
                 SELECT id FROM orders
                 WHERE (?1 IS NULL OR kind = ?1) AND status != 'pending'
                 ORDER BY id DESC
                 LIMIT ?2
             )
             ORDER BY order_id, id"
        ))
        .bind(kind)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        Ok(lines)
    }

    /// Committed headers, newest first, optionally filtered by kind.
    pub async fn list_headers(
        conn: &mut SqliteConnection,
        kind: Option<OrderKind>,
        limit: i64,
    ) -> DbResult<Vec<OrderHeader>> {
        let headers = sqlx::query_as::<_, OrderHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM orders
             WHERE (?1 IS NULL OR kind = ?1) AND status != 'pending'
             ORDER BY id DESC
             LIMIT ?2"
        ))
        .bind(kind)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        Ok(headers)
    }
}
