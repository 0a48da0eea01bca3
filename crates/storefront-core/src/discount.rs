//! # Discount Policy
//!
//! One discounted tier: VIP customers get a flat percentage off the subtotal.
//! Standard customers and walk-in sales pay the subtotal.
//!
//! ```text
//! subtotal $100.00
//!     │
//!     ├── Vip      → discount $10.00 → total $90.00
//!     └── Standard → discount  $0.00 → total $100.00
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::CustomerTier;
use crate::validation::{validate_discount_bps, ValidationResult};
use crate::DEFAULT_VIP_DISCOUNT_BPS;

/// Pure discount rule. The rate is configurable, the tier structure is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountPolicy {
    vip_discount_bps: u32,
}

impl DiscountPolicy {
    /// Builds a policy with the given VIP rate (0 to 10000 basis points).
    pub fn new(vip_discount_bps: u32) -> ValidationResult<Self> {
        validate_discount_bps(vip_discount_bps)?;
        Ok(Self { vip_discount_bps })
    }

    pub fn vip_discount_bps(&self) -> u32 {
        self.vip_discount_bps
    }

    /// Discount owed on `subtotal` for a customer of `tier`.
    ///
    /// Rounded half-up to the cent and never larger than the subtotal.
    pub fn discount_for(&self, tier: CustomerTier, subtotal: Money) -> Money {
        match tier {
            CustomerTier::Vip if subtotal.is_positive() => {
                subtotal.percentage_of(self.vip_discount_bps).min(subtotal)
            }
            _ => Money::zero(),
        }
    }
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            vip_discount_bps: DEFAULT_VIP_DISCOUNT_BPS,
        }
    }
}
