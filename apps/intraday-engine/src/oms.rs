//! Paper order simulator.
//!
//! Tracks at most one open order per symbol and turns subsequent ticks into
//! fill / stop / target transitions. This is a deterministic trigger-cross
//! simulator, not a matching engine: fills happen at the level that fired,
//! and each of stop/t1/t2 fires at most once.

use rust_decimal::Decimal;

use crate::levels::PlanLevels;
use crate::models::Direction;

/// The simulator's per-symbol order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperOrder {
    /// Order side.
    pub side: Direction,
    /// Entry price (the plan trigger).
    pub entry_px: Decimal,
    /// Share quantity.
    pub qty: u64,
    /// Whether the entry has filled.
    pub filled: bool,
    /// Stop fired.
    pub stop_hit: bool,
    /// Target-1 fired.
    pub t1_hit: bool,
    /// Target-2 fired.
    pub t2_hit: bool,
}

/// Why a filled position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Protective stop crossed.
    Stop,
    /// Terminal 2R target crossed.
    TargetTwo,
    /// End-of-day or kill-switch flatten.
    ForceExit,
}

/// What a sync pass observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// No order exists.
    Idle,
    /// Order open, entry not yet filled.
    Pending,
    /// The entry filled on this tick.
    Filled {
        /// Fill price (the trigger).
        entry_px: Decimal,
    },
    /// Target-1 touched for the first time; the position stays open.
    TargetOne {
        /// The 1R level that fired.
        px: Decimal,
    },
    /// Position open, nothing new this tick.
    Holding,
    /// Position closed; terminal for this order.
    Exited {
        /// What closed it.
        reason: ExitReason,
        /// Entry price.
        entry_px: Decimal,
        /// Exit price (the level that fired).
        exit_px: Decimal,
        /// Share quantity.
        qty: u64,
    },
}

/// Outcome of an unconditional force exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceExitOutcome {
    /// There was nothing to exit.
    NoOrder,
    /// An unfilled order was cancelled; no position ever existed.
    Cancelled,
    /// A filled position was closed at the last price.
    Closed {
        /// Entry price.
        entry_px: Decimal,
        /// Exit price.
        exit_px: Decimal,
        /// Share quantity.
        qty: u64,
    },
}

/// One-symbol paper order tracker.
#[derive(Debug, Default)]
pub struct OrderSimulator {
    order: Option<PaperOrder>,
    completed: Option<PaperOrder>,
}

impl OrderSimulator {
    /// Fresh simulator with no order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the order record for an armed plan whose trigger crossed.
    ///
    /// A second entry while an order exists is a bug upstream; it is
    /// rejected with a warning rather than clobbering the live record.
    pub fn place_entry(&mut self, side: Direction, trigger_px: Decimal, qty: u64) {
        if self.order.is_some() {
            tracing::warn!(?side, %trigger_px, "entry rejected: order already open");
            return;
        }
        self.order = Some(PaperOrder {
            side,
            entry_px: trigger_px,
            qty,
            filled: false,
            stop_hit: false,
            t1_hit: false,
            t2_hit: false,
        });
    }

    /// The live order record, if any.
    #[must_use]
    pub const fn order(&self) -> Option<&PaperOrder> {
        self.order.as_ref()
    }

    /// The most recently completed (terminal) order record.
    #[must_use]
    pub const fn completed(&self) -> Option<&PaperOrder> {
        self.completed.as_ref()
    }

    /// Drive the order from a tick.
    ///
    /// Unfilled orders fill when the last price crosses the plan trigger
    /// (`>=` for bull, `<=` for bear). Filled positions check the stop
    /// before either target; target-1 is informational and fires once;
    /// stop and target-2 are terminal and destroy the record.
    pub fn sync(&mut self, last_price: Decimal, levels: &PlanLevels) -> SyncEvent {
        let Some(order) = self.order.as_mut() else {
            return SyncEvent::Idle;
        };

        if !order.filled {
            let crossed = match order.side {
                Direction::Bull => last_price >= levels.trigger,
                Direction::Bear => last_price <= levels.trigger,
                Direction::None => false,
            };
            if crossed {
                order.filled = true;
                return SyncEvent::Filled {
                    entry_px: order.entry_px,
                };
            }
            return SyncEvent::Pending;
        }

        let (stop_crossed, t1_crossed, t2_crossed) = match order.side {
            Direction::Bull => (
                last_price <= levels.stop,
                last_price >= levels.t1,
                last_price >= levels.t2,
            ),
            Direction::Bear => (
                last_price >= levels.stop,
                last_price <= levels.t1,
                last_price <= levels.t2,
            ),
            Direction::None => (false, false, false),
        };

        if stop_crossed && !order.stop_hit {
            order.stop_hit = true;
            return self.close(ExitReason::Stop, levels.stop);
        }
        if t2_crossed && !order.t2_hit {
            order.t2_hit = true;
            return self.close(ExitReason::TargetTwo, levels.t2);
        }
        if t1_crossed && !order.t1_hit {
            order.t1_hit = true;
            return SyncEvent::TargetOne { px: levels.t1 };
        }

        SyncEvent::Holding
    }

    /// Unconditionally remove the order record, closing any filled
    /// position at the given last price.
    pub fn force_exit(&mut self, last_price: Option<Decimal>) -> ForceExitOutcome {
        let Some(order) = self.order.take() else {
            return ForceExitOutcome::NoOrder;
        };
        self.completed = Some(order);

        if order.filled {
            ForceExitOutcome::Closed {
                entry_px: order.entry_px,
                exit_px: last_price.unwrap_or(order.entry_px),
                qty: order.qty,
            }
        } else {
            ForceExitOutcome::Cancelled
        }
    }

    /// Terminal close helper: records the order as completed and emits the
    /// exit event.
    fn close(&mut self, reason: ExitReason, exit_px: Decimal) -> SyncEvent {
        // The record was mutated just before; take() cannot miss.
        let Some(order) = self.order.take() else {
            return SyncEvent::Idle;
        };
        self.completed = Some(order);
        SyncEvent::Exited {
            reason,
            entry_px: order.entry_px,
            exit_px,
            qty: order.qty,
        }
    }
}
