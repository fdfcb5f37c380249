//! Per-symbol trade plan and its lifecycle enums.
//!
//! The enumerated wire values (`BULL`, `ORDER_SENT`, `L3`, ...) are part of
//! the external snapshot contract and must not change.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Long bias.
    Bull,
    /// Short bias.
    Bear,
    /// No direction (abstain).
    None,
}

impl Direction {
    /// Returns true for `Bull`/`Bear`, false for `None`.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::None)
    }

    /// +1 for `Bull`, -1 for `Bear`, 0 for `None`. Used for PnL signs.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Bull => 1,
            Self::Bear => -1,
            Self::None => 0,
        }
    }
}

/// Pattern-match specificity tier, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Full tag signature match.
    L3,
    /// Coarser two-tag match.
    L2,
    /// Single-tag match.
    L1,
    /// Unconditional base rate.
    L0,
    /// No tier qualified.
    Na,
}

impl Tier {
    /// Tiers in fallback order, most specific first.
    pub const FALLBACK: [Self; 4] = [Self::L3, Self::L2, Self::L1, Self::L0];

    /// Index into per-tier configuration arrays. `Na` has no slot.
    #[must_use]
    pub const fn slot(self) -> Option<usize> {
        match self {
            Self::L3 => Some(0),
            Self::L2 => Some(1),
            Self::L1 => Some(2),
            Self::L0 => Some(3),
            Self::Na => None,
        }
    }

    /// Wire name, used as the frequency-book key prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L3 => "L3",
            Self::L2 => "L2",
            Self::L1 => "L1",
            Self::L0 => "L0",
            Self::Na => "NA",
        }
    }
}

/// Plan state machine states.
///
/// `IDLE → ARMED → ORDER_SENT → LIVE → FLAT`, with `ABSTAINED` for plans
/// that never qualified and `MISSED` for armed plans whose trigger never
/// produced a fill by end of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// Waiting for tags/pick/arm.
    Idle,
    /// Levels computed, qty sized, watching the trigger.
    Armed,
    /// Trigger crossed, paper order placed, not yet filled.
    OrderSent,
    /// Order filled, position open.
    Live,
    /// Position closed (stop, target-2, or forced exit).
    Flat,
    /// No qualifying pick, zero qty, or insufficient data.
    Abstained,
    /// Day ended without the plan ever producing a fill.
    Missed,
}

impl PlanStatus {
    /// Terminal states never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Flat | Self::Abstained | Self::Missed)
    }

    /// States in which a paper order record exists.
    #[must_use]
    pub const fn has_order(self) -> bool {
        matches!(self, Self::OrderSent | Self::Live)
    }
}

/// Per-symbol trade intent, owned by the decision manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Entry mode identifier, copied from session configuration.
    pub mode: String,
    /// Chosen direction.
    pub direction: Direction,
    /// Pick confidence, percent in `[0, 100]`.
    pub confidence: u8,
    /// Tier the pick came from.
    pub level: Tier,
    /// Opening-range boundary the entry is referenced to.
    pub entry_ref: Option<Decimal>,
    /// Price whose crossing converts the armed plan into a sent order.
    pub trigger: Option<Decimal>,
    /// Protective stop.
    pub stop: Option<Decimal>,
    /// First R-multiple target (informational).
    pub t1: Option<Decimal>,
    /// Second R-multiple target (terminal).
    pub t2: Option<Decimal>,
    /// Position size in shares.
    pub qty: u64,
    /// State machine state.
    pub status: PlanStatus,
}

impl Plan {
    /// Fresh idle plan for the given entry mode.
    #[must_use]
    pub fn idle(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            direction: Direction::None,
            confidence: 0,
            level: Tier::Na,
            entry_ref: None,
            trigger: None,
            stop: None,
            t1: None,
            t2: None,
            qty: 0,
            status: PlanStatus::Idle,
        }
    }
}
