//! Fixed-width OHLC bar aggregation from price ticks.
//!
//! The aggregator is width-agnostic: production runs 300 s bars, accelerated
//! simulations can run much narrower ones. Input noise never reaches this
//! module - ticks are sanitized at the ingestion boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed (or in-progress) OHLC bar for one bucket.
///
/// Immutable once emitted by [`BarAggregator::on_tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start, epoch seconds, aligned to the bar width.
    pub bucket_start: i64,
    /// First traded price in the bucket.
    pub open: Decimal,
    /// Highest traded price in the bucket.
    pub high: Decimal,
    /// Lowest traded price in the bucket.
    pub low: Decimal,
    /// Last traded price in the bucket.
    pub close: Decimal,
    /// Tick count for the bucket.
    pub volume: u64,
}

impl Bar {
    fn seed(bucket_start: i64, price: Decimal) -> Self {
        Self {
            bucket_start,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1,
        }
    }

    fn absorb(&mut self, price: Decimal) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
        self.volume += 1;
    }

    /// High minus low.
    #[must_use]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

/// Turns a sanitized tick stream into fixed-width OHLC bars.
///
/// A bar is emitted only when a tick arrives in a *later* bucket; the final
/// bar of a session therefore stays open until the caller decides the
/// session is over.
#[derive(Debug)]
pub struct BarAggregator {
    width_secs: i64,
    current: Option<Bar>,
}

impl BarAggregator {
    /// Create an aggregator for the given bar width in seconds.
    ///
    /// Widths below one second are clamped to one.
    #[must_use]
    pub fn new(width_secs: i64) -> Self {
        Self {
            width_secs: width_secs.max(1),
            current: None,
        }
    }

    /// Bucket start for a timestamp.
    #[must_use]
    pub const fn bucket_of(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.width_secs) * self.width_secs
    }

    /// Feed one tick; returns the previous bar when this tick opens a new
    /// bucket.
    ///
    /// Ticks landing in the current bucket are merged regardless of intra-
    /// bucket arrival order. Ticks for an already-closed bucket are dropped.
    pub fn on_tick(&mut self, timestamp: i64, price: Decimal) -> Option<Bar> {
        let bucket = self.bucket_of(timestamp);

        let Some(current_start) = self.current.as_ref().map(|b| b.bucket_start) else {
            self.current = Some(Bar::seed(bucket, price));
            return None;
        };

        if bucket == current_start {
            if let Some(bar) = self.current.as_mut() {
                bar.absorb(price);
            }
            None
        } else if bucket > current_start {
            self.current.replace(Bar::seed(bucket, price))
        } else {
            // Late tick for an already-closed bucket.
            tracing::trace!(
                bucket,
                current = current_start,
                "dropping out-of-order tick for closed bucket"
            );
            None
        }
    }

    /// The bar currently being built, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Bar> {
        self.current.as_ref()
    }
}
