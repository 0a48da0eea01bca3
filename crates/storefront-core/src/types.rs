//! # Domain Types
//!
//! Core domain types shared by the database layer and the CLI.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                 Parties                Ledgers                 │
//! │  ───────                 ───────                ───────                 │
//! │  Product ──┬─► Category  Customer (tier)        PriceSnapshot (append)  │
//! │            └─► Brand     Supplier               StockRecord (product,   │
//! │  Location                                                   location)  │
//! │                                                                         │
//! │  Orders                                                                 │
//! │  ──────                                                                 │
//! │  OrderHeader (kind, status, totals) 1──* LineItem (qty × unit price)   │
//! │                                                                         │
//! │  Requests / responses                                                   │
//! │  ────────────────────                                                   │
//! │  SaleLine, PurchaseLine ──► TransactionCoordinator ──► OrderReceipt    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row identifiers are SQLite integer keys. Orders additionally carry a
//! UUID `reference` printed on receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// Unit a product is sold and stocked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    Each,
    Kg,
    Litre,
    Box,
    Pack,
}

impl Default for UnitOfMeasure {
    fn default() -> Self {
        UnitOfMeasure::Each
    }
}

/// Customer classification driving the discount rule.
///
/// A closed set stored on the customer row. Walk-in sales have no customer
/// and are treated like `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    Standard,
    Vip,
}

impl Default for CustomerTier {
    fn default() -> Self {
        CustomerTier::Standard
    }
}

/// Direction of an order: goods out (sale) or goods in (purchase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Sale,
    Purchase,
}

impl OrderKind {
    /// Status an order of this kind ends in once its unit of work commits.
    pub const fn terminal_status(&self) -> OrderStatus {
        match self {
            OrderKind::Sale => OrderStatus::Completed,
            OrderKind::Purchase => OrderStatus::Received,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Sale => "sale",
            OrderKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(OrderKind::Sale),
            "purchase" => Ok(OrderKind::Purchase),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["sale".to_string(), "purchase".to_string()],
            }),
        }
    }
}

/// Lifecycle of an order header.
///
/// ## State Machine
/// ```text
///              ┌──────────► Completed   (sale)
///   Pending ───┤
///              └──────────► Received    (purchase)
/// ```
///
/// `Pending` exists only inside the creating transaction. Committed rows are
/// always in a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Received,
}

impl OrderStatus {
    /// Whether `self → next` is a legal edge.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (*self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Received)
        )
    }

    /// Returns `next` if the edge is legal, `InvalidOrderStatus` otherwise.
    pub fn transition(self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidOrderStatus {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Received => "received",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// A physical place where stock is held (shop floor, back room, warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

/// A sellable and purchasable item.
///
/// Price and stock are deliberately not columns here: price lives in the
/// append-only snapshot log and quantity in the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Stock Keeping Unit, unique across the catalog.
    pub sku: String,

    /// Display name shown at the till and on receipts.
    pub name: String,

    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub unit: UnitOfMeasure,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub unit: UnitOfMeasure,
}

// =============================================================================
// Parties
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub tier: CustomerTier,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    /// Free-form contact line (phone, email, rep name).
    pub contact: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledgers
// =============================================================================

/// One entry in a product's price history. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PriceSnapshot {
    pub id: i64,
    pub product_id: i64,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PriceSnapshot {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Quantity on hand for one (product, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockRecord {
    pub product_id: i64,
    pub location_id: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// Header row of a sale or purchase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderHeader {
    pub id: i64,
    /// Public UUID printed on receipts.
    pub reference: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    /// Sales only; `None` for walk-in customers.
    pub customer_id: Option<i64>,
    /// Purchases only.
    pub supplier_id: Option<i64>,
    pub location_id: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl OrderHeader {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of an order. The unit price is frozen when the order is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl LineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// An order header together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub header: OrderHeader,
    pub lines: Vec<LineItem>,
}

// =============================================================================
// Read Models
// =============================================================================

/// Catalog row with its current price and total stock across locations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogEntry {
    pub product_id: i64,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub unit: UnitOfMeasure,
    /// `None` when the product has never been priced.
    pub price_cents: Option<i64>,
    pub quantity_on_hand: i64,
}

// =============================================================================
// Requests and Responses
// =============================================================================

/// One cart entry of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// One delivered entry of a purchase. The cost comes from the supplier
/// invoice, not from the price log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// What the caller gets back after a committed sale or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub reference: String,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl OrderReceipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
