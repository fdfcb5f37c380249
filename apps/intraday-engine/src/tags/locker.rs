//! Tag computation and checkpoint locking.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{FirstCandleType, OpenLocation, OpeningTrend, PrevDayContext, RangeStatus, TagSet};
use crate::bars::Bar;
use crate::levels::DayContext;

/// Minimum net drift, as a fraction of the opening range, to call the
/// opening trend directional.
const OT_DRIFT_FRACTION: Decimal = dec!(0.4);

/// First-bar body below this fraction of its range reads as a doji.
const DOJI_BODY_FRACTION: Decimal = dec!(0.3);

/// Opening range above this fraction of the previous-day range is wide.
const RS_WIDE_FRACTION: Decimal = dec!(0.5);

/// Opening range below this fraction of the previous-day range is narrow.
const RS_NARROW_FRACTION: Decimal = dec!(0.2);

/// Computes the five context tags and locks them into a [`TagSet`].
///
/// All lock methods are idempotent: calling them again after the checkpoint,
/// even with different (later) bar data, cannot change an already-locked
/// value.
#[derive(Debug, Clone)]
pub struct TagLocker {
    prev_day: Option<DayContext>,
}

impl TagLocker {
    /// Create a locker with the previous-day context, when backfill
    /// provided one.
    #[must_use]
    pub const fn new(prev_day: Option<DayContext>) -> Self {
        Self { prev_day }
    }

    /// Previous-day close location within the previous-day range.
    #[must_use]
    pub fn compute_pdc(&self) -> Option<PrevDayContext> {
        let day = self.prev_day.as_ref()?;
        let range = day.high - day.low;
        if range <= Decimal::ZERO {
            return Some(PrevDayContext::Neutral);
        }
        let location = (day.close - day.low) / range;
        if location >= dec!(0.6667) {
            Some(PrevDayContext::Bullish)
        } else if location <= dec!(0.3333) {
            Some(PrevDayContext::Bearish)
        } else {
            Some(PrevDayContext::Neutral)
        }
    }

    /// Session open relative to the previous-day range.
    #[must_use]
    pub fn compute_ol(&self, session_open: Decimal) -> Option<OpenLocation> {
        let day = self.prev_day.as_ref()?;
        if session_open > day.high {
            Some(OpenLocation::AboveHigh)
        } else if session_open < day.low {
            Some(OpenLocation::BelowLow)
        } else {
            let mid = (day.high + day.low) / dec!(2);
            if session_open >= mid {
                Some(OpenLocation::UpperHalf)
            } else {
                Some(OpenLocation::LowerHalf)
            }
        }
    }

    /// Net drift over the opening bars relative to their range.
    #[must_use]
    pub fn compute_ot(&self, opening_bars: &[Bar]) -> Option<OpeningTrend> {
        let first = opening_bars.first()?;
        let last = opening_bars.last()?;

        let high = opening_bars.iter().map(|b| b.high).max()?;
        let low = opening_bars.iter().map(|b| b.low).min()?;
        let range = high - low;
        if range <= Decimal::ZERO {
            return Some(OpeningTrend::Range);
        }

        let drift = last.close - first.open;
        let threshold = range * OT_DRIFT_FRACTION;
        if drift >= threshold {
            Some(OpeningTrend::Bull)
        } else if drift <= -threshold {
            Some(OpeningTrend::Bear)
        } else {
            Some(OpeningTrend::Range)
        }
    }

    /// First-bar body classification.
    #[must_use]
    pub fn compute_fct(&self, first_bar: &Bar) -> Option<FirstCandleType> {
        let range = first_bar.range();
        if range <= Decimal::ZERO {
            return Some(FirstCandleType::Doji);
        }
        let body = (first_bar.close - first_bar.open).abs();
        if body < range * DOJI_BODY_FRACTION {
            return Some(FirstCandleType::Doji);
        }
        if first_bar.close > first_bar.open {
            Some(FirstCandleType::Bullish)
        } else {
            Some(FirstCandleType::Bearish)
        }
    }

    /// Opening-range width relative to the previous-day range.
    #[must_use]
    pub fn compute_rs(&self, orb_range: Decimal) -> Option<RangeStatus> {
        let day = self.prev_day.as_ref()?;
        let prev_range = day.high - day.low;
        if prev_range <= Decimal::ZERO {
            return Some(RangeStatus::Normal);
        }
        let ratio = orb_range / prev_range;
        if ratio > RS_WIDE_FRACTION {
            Some(RangeStatus::Wide)
        } else if ratio < RS_NARROW_FRACTION {
            Some(RangeStatus::Narrow)
        } else {
            Some(RangeStatus::Normal)
        }
    }

    /// Lock the previous-day context tag (first checkpoint).
    pub fn lock_pdc(&self, tags: &mut TagSet) {
        if tags.pdc.lock(self.compute_pdc()) {
            tracing::debug!(pdc = ?tags.pdc.get(), "locked previous-day context");
        }
    }

    /// Lock the open-location tag (second checkpoint).
    pub fn lock_ol(&self, tags: &mut TagSet, session_open: Option<Decimal>) {
        if tags.ol.lock(session_open.and_then(|open| self.compute_ol(open))) {
            tracing::debug!(ol = ?tags.ol.get(), "locked open location");
        }
    }

    /// Lock the opening-trend, first-candle and range-status tags together
    /// (third checkpoint, once the opening bars are expected to exist).
    pub fn lock_open_set(&self, tags: &mut TagSet, opening_bars: &[Bar]) {
        let ot = self.compute_ot(opening_bars);
        let fct = opening_bars.first().and_then(|b| self.compute_fct(b));
        let rs = opening_range(opening_bars).and_then(|range| self.compute_rs(range));

        let locked_now = tags.ot.lock(ot);
        tags.first_candle_type.lock(fct);
        tags.range_status.lock(rs);
        if locked_now {
            tracing::debug!(
                ot = ?tags.ot.get(),
                fct = ?tags.first_candle_type.get(),
                rs = ?tags.range_status.get(),
                "locked opening tags"
            );
        }
    }
}

/// High-minus-low over a slice of bars, `None` when empty.
fn opening_range(bars: &[Bar]) -> Option<Decimal> {
    let high = bars.iter().map(|b| b.high).max()?;
    let low = bars.iter().map(|b| b.low).min()?;
    Some(high - low)
}
