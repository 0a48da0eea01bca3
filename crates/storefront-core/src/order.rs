//! # Order Math
//!
//! Cart normalization and invoice totals. Everything the coordinator does
//! between "caller handed us lines" and "open a transaction" that needs no
//! database.
//!
//! ## Sale Pipeline
//! ```text
//! [SaleLine]  ──► merge_sale_lines ──► [SaleLine] (unique products, valid qty)
//!                                          │
//!                       price lookup (db)  ▼
//!                                      [PricedLine]
//!                                          │
//!                      OrderTotals::for_sale(lines, policy, tier)
//!                                          │
//!                                          ▼
//!                         subtotal − discount = total
//! ```

use serde::{Deserialize, Serialize};

use crate::discount::DiscountPolicy;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CustomerTier, PurchaseLine, SaleLine};
use crate::validation::{validate_price_cents, validate_quantity};
use crate::{MAX_ORDER_LINES, MAX_PRICE_CENTS};

// =============================================================================
// Priced Line
// =============================================================================

/// A line whose unit price has been fixed for this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

impl From<PurchaseLine> for PricedLine {
    fn from(line: PurchaseLine) -> Self {
        PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: Money::from_cents(line.unit_cost_cents),
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Header amounts derived from the priced lines.
///
/// Invariant: `total == subtotal - discount` and `subtotal == Σ line_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Totals for a sale: the discount depends on the customer tier.
    pub fn for_sale(
        lines: &[PricedLine],
        policy: &DiscountPolicy,
        tier: CustomerTier,
    ) -> CoreResult<Self> {
        let subtotal = checked_subtotal(lines)?;
        let discount = policy.discount_for(tier, subtotal);
        Ok(OrderTotals {
            subtotal,
            discount,
            total: subtotal - discount,
        })
    }

    /// Totals for a purchase: suppliers invoice at cost, no discount.
    pub fn for_purchase(lines: &[PricedLine]) -> CoreResult<Self> {
        let subtotal = checked_subtotal(lines)?;
        Ok(OrderTotals {
            subtotal,
            discount: Money::zero(),
            total: subtotal,
        })
    }
}

/// Σ line totals, rejecting any order whose amounts do not fit in `i64` cents.
fn checked_subtotal(lines: &[PricedLine]) -> CoreResult<Money> {
    lines
        .iter()
        .try_fold(Money::zero(), |acc, line| {
            line.unit_price
                .checked_multiply_quantity(line.quantity)
                .and_then(|total| acc.checked_add(total))
        })
        .ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "order total".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into()
        })
}

// =============================================================================
// Line Normalization
// =============================================================================

/// Validates a cart and merges duplicate product lines.
///
/// - empty cart → `EmptyCart`
/// - every quantity must pass [`validate_quantity`], before and after merging
/// - more than `MAX_ORDER_LINES` distinct products → `CartTooLarge`
///
/// First-seen order of products is preserved.
pub fn merge_sale_lines(lines: &[SaleLine]) -> CoreResult<Vec<SaleLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<SaleLine> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity += line.quantity;
                validate_quantity(existing.quantity)?;
            }
            None => merged.push(*line),
        }
    }

    if merged.len() > MAX_ORDER_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_ORDER_LINES,
        });
    }

    Ok(merged)
}

/// Validates the lines of a supplier delivery.
///
/// Lines are kept as given (two lines for the same product at different
/// costs are legitimate on a supplier invoice).
pub fn validate_purchase_lines(lines: &[PurchaseLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(CoreError::CartTooLarge {
            max: MAX_ORDER_LINES,
        });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_cost_cents).map_err(|_| CoreError::InvalidCost {
            product_id: line.product_id,
            reason: format!("unit cost must be between 0 and {} cents", MAX_PRICE_CENTS),
        })?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
