//! Per-symbol state snapshot - the contract consumed by the (external)
//! persistence and UI layers.
//!
//! Field names and enumerated values are wire-stable; downstream consumers
//! match on them verbatim.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, PlanStatus, Tier};
use crate::tags::{FirstCandleType, OpenLocation, OpeningTrend, PrevDayContext, RangeStatus};

/// Locked tag values; `null` until the tag locks (or when it locked empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsSnapshot {
    /// Previous-day context.
    pub pdc: Option<PrevDayContext>,
    /// Open location.
    pub ol: Option<OpenLocation>,
    /// Opening trend.
    pub ot: Option<OpeningTrend>,
    /// First candle type.
    pub first_candle_type: Option<FirstCandleType>,
    /// Range status.
    pub range_status: Option<RangeStatus>,
}

/// The plan as exposed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Chosen direction.
    pub direction: Direction,
    /// Pick confidence percent.
    pub confidence: u8,
    /// Tier the pick came from.
    pub level: Tier,
    /// Entry reference level.
    pub entry_ref: Option<Decimal>,
    /// Trigger price.
    pub trigger: Option<Decimal>,
    /// Protective stop.
    pub stop: Option<Decimal>,
    /// 1R target.
    pub t1: Option<Decimal>,
    /// 2R target.
    pub t2: Option<Decimal>,
    /// Share quantity.
    pub qty: u64,
    /// State machine state.
    pub status: PlanStatus,
}

/// Complete externally visible state for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    /// Ticker symbol.
    pub symbol: String,
    /// Last traded price.
    pub ltp: Option<Decimal>,
    /// Locked context tags.
    pub tags: TagsSnapshot,
    /// Current plan.
    pub plan: PlanSnapshot,
    /// Open-position PnL at the last price.
    pub unrealized_pnl: Decimal,
    /// Realized PnL for the session.
    pub realized_pnl: Decimal,
    /// Whether a filled position is open.
    pub has_position: bool,
}
