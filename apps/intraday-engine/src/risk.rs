//! Fixed-budget position sizing.
//!
//! The only gate between "direction chosen" and "capital committed":
//! a zero quantity forces the plan to abstain instead of arming.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Converts a fixed per-trade risk budget and a per-share stop distance
/// into an integer share quantity.
#[derive(Debug, Clone, Copy)]
pub struct RiskSizer {
    budget_rs: Decimal,
}

impl RiskSizer {
    /// Create a sizer with the session risk budget (currency units).
    #[must_use]
    pub const fn new(budget_rs: Decimal) -> Self {
        Self { budget_rs }
    }

    /// The configured budget.
    #[must_use]
    pub const fn budget_rs(&self) -> Decimal {
        self.budget_rs
    }

    /// `floor(budget / risk_per_share)`, clamped to zero.
    ///
    /// A non-positive stop distance sizes to zero - never a division.
    #[must_use]
    pub fn size(&self, risk_per_share: Decimal) -> u64 {
        if risk_per_share <= Decimal::ZERO || self.budget_rs <= Decimal::ZERO {
            return 0;
        }
        (self.budget_rs / risk_per_share)
            .floor()
            .to_u64()
            .unwrap_or(0)
    }
}
