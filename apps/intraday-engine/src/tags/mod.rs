//! Time-locked categorical context tags.
//!
//! Each tag is computed from the bar history available "so far" and locked
//! exactly once at a fixed session-clock checkpoint. Locking, not
//! computation timing, is the source of truth: a plan built after the lock
//! checkpoints can never reflect bar data the live system would not yet
//! have observed.

mod locker;

pub use locker::TagLocker;

use serde::{Deserialize, Serialize};

use crate::models::Direction;

/// Previous-day close location within the previous-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrevDayContext {
    /// Closed in the upper third.
    Bullish,
    /// Closed in the lower third.
    Bearish,
    /// Closed in the middle third.
    Neutral,
}

/// Session open location relative to the previous-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpenLocation {
    /// Gap above the previous-day high.
    AboveHigh,
    /// Gap below the previous-day low.
    BelowLow,
    /// Inside the range, at or above its midpoint.
    UpperHalf,
    /// Inside the range, below its midpoint.
    LowerHalf,
}

/// Net drift over the opening bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpeningTrend {
    /// Drifting up.
    Bull,
    /// Drifting down.
    Bear,
    /// No meaningful drift (trading range).
    Range,
}

impl OpeningTrend {
    /// Directional equivalent, used by the picker's alignment filter.
    /// `Range` has none.
    #[must_use]
    pub const fn as_direction(self) -> Option<Direction> {
        match self {
            Self::Bull => Some(Direction::Bull),
            Self::Bear => Some(Direction::Bear),
            Self::Range => None,
        }
    }
}

/// Shape of the first session bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstCandleType {
    /// Body up, body-dominant.
    Bullish,
    /// Body down, body-dominant.
    Bearish,
    /// Body too small to matter.
    Doji,
}

/// Opening-range width relative to the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeStatus {
    /// Opening range wider than half the previous-day range.
    Wide,
    /// In between.
    Normal,
    /// Opening range narrower than a fifth of the previous-day range.
    Narrow,
}

macro_rules! tag_as_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Wire name, used in snapshots and frequency-book keys.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

tag_as_str!(PrevDayContext { Bullish => "BULLISH", Bearish => "BEARISH", Neutral => "NEUTRAL" });
tag_as_str!(OpenLocation {
    AboveHigh => "ABOVE_HIGH",
    BelowLow => "BELOW_LOW",
    UpperHalf => "UPPER_HALF",
    LowerHalf => "LOWER_HALF",
});
tag_as_str!(OpeningTrend { Bull => "BULL", Bear => "BEAR", Range => "RANGE" });
tag_as_str!(FirstCandleType { Bullish => "BULLISH", Bearish => "BEARISH", Doji => "DOJI" });
tag_as_str!(RangeStatus { Wide => "WIDE", Normal => "NORMAL", Narrow => "NARROW" });

/// A value that can be written exactly once.
///
/// Further lock attempts are silently ignored; this is what makes the
/// checkpoint logic idempotent.
#[derive(Debug, Clone, Copy)]
pub struct Locked<T> {
    value: Option<T>,
    locked: bool,
}

impl<T> Default for Locked<T> {
    fn default() -> Self {
        Self {
            value: None,
            locked: false,
        }
    }
}

impl<T: Copy> Locked<T> {
    /// Lock the cell with a value (possibly `None` when the tag could not
    /// be computed). Returns true if this call performed the lock.
    pub fn lock(&mut self, value: Option<T>) -> bool {
        if self.locked {
            return false;
        }
        self.value = value;
        self.locked = true;
        true
    }

    /// The locked value, if locked with one.
    #[must_use]
    pub const fn get(&self) -> Option<T> {
        if self.locked { self.value } else { None }
    }

    /// Whether the cell has been locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }
}

/// The five context tags for one symbol-session.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagSet {
    /// Previous-day context, locks at the first checkpoint.
    pub pdc: Locked<PrevDayContext>,
    /// Open location, locks at the second checkpoint.
    pub ol: Locked<OpenLocation>,
    /// Opening trend, locks at the third checkpoint.
    pub ot: Locked<OpeningTrend>,
    /// First candle type, locks with the opening trend.
    pub first_candle_type: Locked<FirstCandleType>,
    /// Range status, locks with the opening trend.
    pub range_status: Locked<RangeStatus>,
}

impl TagSet {
    /// True once all five tags are locked.
    #[must_use]
    pub const fn fully_locked(&self) -> bool {
        self.pdc.is_locked()
            && self.ol.is_locked()
            && self.ot.is_locked()
            && self.first_candle_type.is_locked()
            && self.range_status.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_cell_writes_once() {
        let mut cell = Locked::default();
        assert!(cell.lock(Some(OpeningTrend::Bull)));
        assert_eq!(cell.get(), Some(OpeningTrend::Bull));

        // A second lock with different data must not change the value.
        assert!(!cell.lock(Some(OpeningTrend::Bear)));
        assert_eq!(cell.get(), Some(OpeningTrend::Bull));
    }

    #[test]
    fn unlocked_cell_reads_none() {
        let cell: Locked<OpeningTrend> = Locked::default();
        assert!(!cell.is_locked());
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn locking_with_none_still_locks() {
        let mut cell: Locked<OpeningTrend> = Locked::default();
        assert!(cell.lock(None));
        assert!(cell.is_locked());
        assert_eq!(cell.get(), None);
        assert!(!cell.lock(Some(OpeningTrend::Bull)));
        assert_eq!(cell.get(), None);
    }

    #[test]
    fn fully_locked_requires_all_five() {
        let mut tags = TagSet::default();
        assert!(!tags.fully_locked());
        tags.pdc.lock(Some(PrevDayContext::Neutral));
        tags.ol.lock(Some(OpenLocation::UpperHalf));
        tags.ot.lock(Some(OpeningTrend::Range));
        tags.first_candle_type.lock(Some(FirstCandleType::Doji));
        assert!(!tags.fully_locked());
        tags.range_status.lock(Some(RangeStatus::Normal));
        assert!(tags.fully_locked());
    }
}
