//! # storefront-core: Pure Business Logic for Storefront
//!
//! Everything the transaction engine decides without touching storage lives
//! here: money arithmetic, order totals, the customer discount rule and input
//! validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (POS UI, purchasing, CLI)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ create_sale / create_purchase          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        storefront-db: TransactionCoordinator + repositories     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ storefront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   order   │  │ discount  │  │   │
//! │  │   │  Product  │  │   Money   │  │  Totals   │  │  VIP 10%  │  │   │
//! │  │   │  Order    │  │  parsing  │  │ Line merge│  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, OrderHeader, LineItem, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`order`] - Cart normalization and invoice totals
//! - [`discount`] - Customer tier discount policy
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::discount::DiscountPolicy;
//! use storefront_core::money::Money;
//! use storefront_core::types::CustomerTier;
//!
//! let policy = DiscountPolicy::default();
//! let subtotal = Money::from_cents(10_000); // $100.00
//!
//! assert_eq!(policy.discount_for(CustomerTier::Vip, subtotal).cents(), 1_000);
//! assert_eq!(policy.discount_for(CustomerTier::Standard, subtotal).cents(), 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::DiscountPolicy;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{OrderTotals, PricedLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Location used for stock movements when none is configured.
///
/// The initial migration creates this row ("Main Store").
pub const DEFAULT_LOCATION_ID: i64 = 1;

/// Maximum distinct product lines in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single product line.
///
/// Guards against typos at the till (1000 instead of 10) while still leaving
/// room for pallet-sized deliveries.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest unit price or unit cost accepted, in cents ($1,000,000,000.00).
///
/// `MAX_PRICE_CENTS × MAX_ITEM_QUANTITY × MAX_ORDER_LINES` stays well inside
/// `i64`, so no valid order can overflow its totals.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// VIP discount in basis points (1000 = 10%).
pub const DEFAULT_VIP_DISCOUNT_BPS: u32 = 1_000;
