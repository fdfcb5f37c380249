//! Opening-range-breakout level computation.
//!
//! Levels are built once, at arming time, from the first five session bars
//! plus the previous-day context. Construction is checked: anything that
//! would make the plan unsizeable (too few bars, zero risk, a broken
//! risk:reward floor) comes back as an [`ArmError`] the caller consumes as
//! an abstain - never a panic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bars::Bar;
use crate::models::Direction;
use crate::tags::OpeningTrend;

/// Number of session bars that define the opening range.
pub const OPENING_BARS: usize = 5;

/// Stop tie-break: fraction of the entry reference price.
const TIE_BREAK_PRICE_FRACTION: Decimal = dec!(0.0025);

/// Stop tie-break: fraction of the opening range.
const TIE_BREAK_RANGE_FRACTION: Decimal = dec!(0.2);

/// Required target-2 distance as a multiple of risk-per-share.
const RR_FLOOR_MULTIPLE: Decimal = dec!(2);

/// Previous-day OHLC for one symbol, supplied by the (external) backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayContext {
    /// Previous-day open.
    pub open: Decimal,
    /// Previous-day high.
    pub high: Decimal,
    /// Previous-day low.
    pub low: Decimal,
    /// Previous-day close.
    pub close: Decimal,
}

/// High/low of the first [`OPENING_BARS`] session bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningRange {
    /// Opening-range high.
    pub high: Decimal,
    /// Opening-range low.
    pub low: Decimal,
}

impl OpeningRange {
    /// Build from the session's closed bars; `None` with fewer than
    /// [`OPENING_BARS`] of them.
    #[must_use]
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        if bars.len() < OPENING_BARS {
            return None;
        }
        let opening = &bars[..OPENING_BARS];
        let high = opening.iter().map(|b| b.high).max()?;
        let low = opening.iter().map(|b| b.low).min()?;
        Some(Self { high, low })
    }

    /// High minus low.
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Upper double-range boundary.
    #[must_use]
    pub fn double_high(&self) -> Decimal {
        self.high + self.range()
    }

    /// Lower double-range boundary.
    #[must_use]
    pub fn double_low(&self) -> Decimal {
        self.low - self.range()
    }
}

/// Why a plan could not be armed. Every variant is consumed as an abstain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArmError {
    /// Fewer than [`OPENING_BARS`] closed bars at arming time.
    #[error("only {have} of {OPENING_BARS} opening bars present")]
    InsufficientBars {
        /// Closed bars available.
        have: usize,
    },

    /// No direction was chosen.
    #[error("no direction chosen")]
    NoDirection,

    /// Entry and stop coincide; the plan cannot be sized.
    #[error("risk per share is zero")]
    ZeroRisk,

    /// The constructed plan broke the 2R floor. A programming defect, not
    /// a market condition; the attempt degrades to an abstain.
    #[error("risk:reward floor violated")]
    RiskRewardFloor,
}

/// The committed price levels of an armed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLevels {
    /// Opening-range boundary the entry references.
    pub entry_ref: Decimal,
    /// Trigger price (equals `entry_ref`).
    pub trigger: Decimal,
    /// Protective stop.
    pub stop: Decimal,
    /// 1R target (informational).
    pub t1: Decimal,
    /// 2R target (terminal).
    pub t2: Decimal,
    /// Absolute entry-to-stop distance.
    pub risk_per_share: Decimal,
}

/// Builds entry/stop/target levels from the opening range.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelEngine;

impl LevelEngine {
    /// Compute the plan levels for a chosen direction.
    ///
    /// Stop selection: a pick aligned with the opening trend stops at the
    /// opposite opening-range boundary, nudged out to the previous-day
    /// extreme when the two nearly coincide; a counter-trend (or
    /// range-day) pick stops at the double-range boundary instead.
    pub fn build(
        self,
        direction: Direction,
        opening_trend: Option<OpeningTrend>,
        bars: &[Bar],
        prev_day: Option<&DayContext>,
    ) -> Result<PlanLevels, ArmError> {
        if !direction.is_directional() {
            return Err(ArmError::NoDirection);
        }
        let orb =
            OpeningRange::from_bars(bars).ok_or(ArmError::InsufficientBars { have: bars.len() })?;

        let entry_ref = if direction == Direction::Bull {
            orb.high
        } else {
            orb.low
        };

        let aligned = opening_trend.and_then(OpeningTrend::as_direction) == Some(direction);
        let stop = if aligned {
            self.aligned_stop(direction, &orb, entry_ref, prev_day)
        } else {
            match direction {
                Direction::Bull => orb.double_low(),
                _ => orb.double_high(),
            }
        };

        let risk_per_share = (entry_ref - stop).abs();
        if risk_per_share <= Decimal::ZERO {
            return Err(ArmError::ZeroRisk);
        }

        let (t1, t2) = match direction {
            Direction::Bull => (entry_ref + risk_per_share, entry_ref + risk_per_share * dec!(2)),
            _ => (entry_ref - risk_per_share, entry_ref - risk_per_share * dec!(2)),
        };

        if (t2 - entry_ref).abs() < RR_FLOOR_MULTIPLE * risk_per_share {
            return Err(ArmError::RiskRewardFloor);
        }

        Ok(PlanLevels {
            entry_ref,
            trigger: entry_ref,
            stop,
            t1,
            t2,
            risk_per_share,
        })
    }

    /// Trend-aligned stop: the opposite opening-range boundary, replaced by
    /// the previous-day same-side extreme when the boundary sits within the
    /// tie-break threshold of it.
    fn aligned_stop(
        self,
        direction: Direction,
        orb: &OpeningRange,
        entry_ref: Decimal,
        prev_day: Option<&DayContext>,
    ) -> Decimal {
        let boundary = match direction {
            Direction::Bull => orb.low,
            _ => orb.high,
        };

        let Some(day) = prev_day else {
            return boundary;
        };
        let extreme = match direction {
            Direction::Bull => day.low,
            _ => day.high,
        };

        let threshold = (entry_ref * TIE_BREAK_PRICE_FRACTION)
            .min(orb.range() * TIE_BREAK_RANGE_FRACTION);
        if (boundary - extreme).abs() <= threshold {
            extreme
        } else {
            boundary
        }
    }
}
