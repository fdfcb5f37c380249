//! Validated per-signature frequency counts.
//!
//! The research layer aggregates historical match counts for every tag
//! signature offline and ships them as a JSON document. This module loads
//! that document once at startup into a structured book; a malformed
//! document is startup-fatal, an empty one is legal (every pick abstains).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::Tier;
use crate::tags::TagSet;

/// Frequency-book loading errors. All are startup-fatal.
#[derive(Debug, Error)]
pub enum BookError {
    /// Failed to read the book file.
    #[error("failed to read frequency book '{path}': {source}")]
    Read {
        /// Path to the book file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse the book JSON.
    #[error("failed to parse frequency book: {0}")]
    Parse(#[from] serde_json::Error),

    /// A signature key does not match its tier's arity.
    #[error("invalid signature key '{key}' for symbol '{symbol}'")]
    InvalidKey {
        /// Offending symbol.
        symbol: String,
        /// Offending key.
        key: String,
    },
}

/// Historical bull/bear match counts for one signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TierCounts {
    /// Matches that resolved bullish.
    pub bull: u32,
    /// Matches that resolved bearish.
    pub bear: u32,
}

impl TierCounts {
    /// Total sample size.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.bull + self.bear
    }
}

/// Per-symbol, per-signature frequency counts.
#[derive(Debug, Clone, Default)]
pub struct FrequencyBook {
    symbols: HashMap<String, HashMap<String, TierCounts>>,
}

impl FrequencyBook {
    /// An empty book; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and validate a book from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BookError> {
        let contents = std::fs::read_to_string(path).map_err(|e| BookError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a book from a JSON string.
    ///
    /// Document shape: `{ "SYMBOL": { "L3|BULLISH|ABOVE_HIGH|BULL":
    /// {"bull": 9, "bear": 1}, ... }, ... }`.
    pub fn from_json_str(json: &str) -> Result<Self, BookError> {
        let symbols: HashMap<String, HashMap<String, TierCounts>> = serde_json::from_str(json)?;

        for (symbol, entries) in &symbols {
            for key in entries.keys() {
                if !key_is_well_formed(key) {
                    return Err(BookError::InvalidKey {
                        symbol: symbol.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(Self { symbols })
    }

    /// Counts for a signature key under a symbol.
    #[must_use]
    pub fn lookup(&self, symbol: &str, key: &str) -> Option<TierCounts> {
        self.symbols.get(symbol)?.get(key).copied()
    }

    /// Whether the book holds no counts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.values().all(HashMap::is_empty)
    }
}

/// Each tier key carries a fixed number of `|`-separated segments:
/// `L3|pdc|ol|ot`, `L2|pdc|ol`, `L1|ol`, `L0`.
fn key_is_well_formed(key: &str) -> bool {
    let mut segments = key.split('|');
    let Some(tier) = segments.next() else {
        return false;
    };
    let rest = segments.count();
    match tier {
        "L3" => rest == 3,
        "L2" => rest == 2,
        "L1" => rest == 1,
        "L0" => rest == 0,
        _ => false,
    }
}

/// Build the signature key for a tier from locked tags.
///
/// Returns `None` when any tag the tier needs is unavailable - the tier is
/// then simply skipped by the picker.
#[must_use]
pub fn signature_key(tier: Tier, tags: &TagSet) -> Option<String> {
    match tier {
        Tier::L3 => {
            let pdc = tags.pdc.get()?;
            let ol = tags.ol.get()?;
            let ot = tags.ot.get()?;
            Some(format!("L3|{}|{}|{}", pdc.as_str(), ol.as_str(), ot.as_str()))
        }
        Tier::L2 => {
            let pdc = tags.pdc.get()?;
            let ol = tags.ol.get()?;
            Some(format!("L2|{}|{}", pdc.as_str(), ol.as_str()))
        }
        Tier::L1 => {
            let ol = tags.ol.get()?;
            Some(format!("L1|{}", ol.as_str()))
        }
        Tier::L0 => Some("L0".to_string()),
        Tier::Na => None,
    }
}
