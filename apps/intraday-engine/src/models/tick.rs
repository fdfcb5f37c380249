//! Price ticks as they arrive on the wire, and their sanitized form.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price tick as delivered by the (external) transport layer.
///
/// Timestamps are epoch seconds; prices are raw floats. Both are validated
/// and converted at the ingestion boundary - nothing past [`Tick::sanitize`]
/// ever sees a non-finite value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Ticker symbol.
    pub symbol: String,
    /// Epoch seconds.
    pub timestamp: f64,
    /// Last traded price.
    pub price: f64,
    /// Trade volume, when the feed supplies it.
    #[serde(default)]
    pub volume: Option<u64>,
}

/// A tick that passed input validation: integral timestamp, decimal price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanTick {
    /// Epoch seconds, floored.
    pub timestamp: i64,
    /// Last traded price.
    pub price: Decimal,
}

impl Tick {
    /// Construct a tick.
    #[must_use]
    pub fn new(symbol: impl Into<String>, timestamp: f64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            price,
            volume: None,
        }
    }

    /// Validate and convert the tick for engine consumption.
    ///
    /// Returns `None` for input noise: non-finite or non-positive price,
    /// non-finite or negative timestamp. Noise is dropped, never an error.
    #[must_use]
    pub fn sanitize(&self) -> Option<CleanTick> {
        if !self.timestamp.is_finite() || self.timestamp < 0.0 {
            return None;
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return None;
        }
        let price = Decimal::try_from(self.price).ok()?;
        Some(CleanTick {
            timestamp: self.timestamp.floor() as i64,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sanitize_accepts_normal_tick() {
        let tick = Tick::new("RELIANCE", 1_700_000_000.7, 2450.55);
        let clean = tick.sanitize().unwrap();
        assert_eq!(clean.timestamp, 1_700_000_000);
        assert_eq!(clean.price, dec!(2450.55));
    }

    #[test]
    fn sanitize_drops_non_finite_price() {
        assert!(Tick::new("X", 1.0, f64::NAN).sanitize().is_none());
        assert!(Tick::new("X", 1.0, f64::INFINITY).sanitize().is_none());
    }

    #[test]
    fn sanitize_drops_non_positive_price() {
        assert!(Tick::new("X", 1.0, 0.0).sanitize().is_none());
        assert!(Tick::new("X", 1.0, -5.0).sanitize().is_none());
    }

    #[test]
    fn sanitize_drops_bad_timestamp() {
        assert!(Tick::new("X", f64::NAN, 100.0).sanitize().is_none());
        assert!(Tick::new("X", -1.0, 100.0).sanitize().is_none());
    }
}
