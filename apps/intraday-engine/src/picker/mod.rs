//! Hierarchical frequency-based direction picking.
//!
//! The picker walks the specificity tiers from L3 (full tag signature) down
//! to L0 (unconditional base rate). The first tier that clears the sample,
//! alignment and confidence gates wins outright - there is no search for a
//! "better" tier afterwards. When no tier qualifies the result is an
//! abstain, not an error.

mod book;

pub use book::{BookError, FrequencyBook, TierCounts, signature_key};

use crate::models::{Direction, Tier};
use crate::tags::OpeningTrend;

/// Picker gates, read once from session configuration.
#[derive(Debug, Clone)]
pub struct PickerConfig {
    /// Minimum sample size per tier, `[L3, L2, L1, L0]`, decreasing.
    pub min_samples: [u32; 4],
    /// Minimum confidence percent, shared across tiers.
    pub min_confidence: u8,
    /// When set, a tier whose direction disagrees with the locked opening
    /// trend is skipped.
    pub require_ot_alignment: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            min_samples: [8, 6, 4, 2],
            min_confidence: 55,
            require_ot_alignment: false,
        }
    }
}

/// Outcome of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    /// Chosen direction, `None` for an abstain.
    pub direction: Direction,
    /// Confidence percent in `[0, 100]`.
    pub confidence: u8,
    /// Tier the pick came from, `Na` for an abstain.
    pub level: Tier,
}

impl Pick {
    /// The abstain result: `(NONE, 0, NA)`.
    #[must_use]
    pub const fn abstain() -> Self {
        Self {
            direction: Direction::None,
            confidence: 0,
            level: Tier::Na,
        }
    }

    /// Whether the pick carries a direction.
    #[must_use]
    pub const fn is_directional(&self) -> bool {
        self.direction.is_directional()
    }
}

/// Tier-fallback direction picker.
#[derive(Debug, Clone, Default)]
pub struct Picker {
    config: PickerConfig,
}

impl Picker {
    /// Create a picker with the given gates.
    #[must_use]
    pub const fn new(config: PickerConfig) -> Self {
        Self { config }
    }

    /// Pick a direction from per-tier counts.
    ///
    /// `counts` is indexed `[L3, L2, L1, L0]`; `None` means the tier's
    /// signature was unavailable or absent from the book, which skips the
    /// tier exactly like an insufficient sample does.
    #[must_use]
    pub fn pick(&self, counts: &[Option<TierCounts>; 4], ot: Option<OpeningTrend>) -> Pick {
        for tier in Tier::FALLBACK {
            let Some(slot) = tier.slot() else {
                continue;
            };
            let Some(tier_counts) = counts[slot] else {
                continue;
            };

            let total = tier_counts.total();
            if total == 0 || total < self.config.min_samples[slot] {
                continue;
            }

            let (direction, winner) = if tier_counts.bull >= tier_counts.bear {
                (Direction::Bull, tier_counts.bull)
            } else {
                (Direction::Bear, tier_counts.bear)
            };

            if self.config.require_ot_alignment
                && ot.and_then(OpeningTrend::as_direction) != Some(direction)
            {
                tracing::trace!(?tier, ?direction, ?ot, "tier skipped: opening-trend misaligned");
                continue;
            }

            let confidence = confidence_pct(winner, total);
            if confidence < self.config.min_confidence {
                tracing::trace!(?tier, confidence, "tier skipped: below confidence gate");
                continue;
            }

            return Pick {
                direction,
                confidence,
                level: tier,
            };
        }

        Pick::abstain()
    }
}

/// `round(100 * winner / total)`, half-up integer arithmetic.
fn confidence_pct(winner: u32, total: u32) -> u8 {
    let winner = u64::from(winner);
    let total = u64::from(total);
    ((winner * 100 + total / 2) / total) as u8
}
