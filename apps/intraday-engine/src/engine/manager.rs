//! Per-symbol decision state machine.
//!
//! One manager owns the complete intraday lifecycle for one symbol:
//! checkpoint-gated tag locking, the direction pick, plan arming,
//! trigger watching, order sync and the unskippable end-of-day flatten.
//!
//! Checkpoint logic is clock-driven: [`DecisionManager::on_clock`] is
//! idempotent and is called both from the worker's interval timer and with
//! every tick's own timestamp, so a quiet market can never miss a lock,
//! arm or flatten event.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::bars::{Bar, BarAggregator};
use crate::levels::{ArmError, DayContext, LevelEngine, OPENING_BARS, PlanLevels};
use crate::models::{Direction, Plan, PlanStatus, Tick, Tier};
use crate::oms::{ForceExitOutcome, OrderSimulator, SyncEvent};
use crate::picker::{FrequencyBook, Picker, PickerConfig, TierCounts, signature_key};
use crate::risk::RiskSizer;
use crate::snapshot::{PlanSnapshot, SymbolSnapshot, TagsSnapshot};
use crate::tags::{TagLocker, TagSet};

/// Session-clock checkpoint times, seconds since session-local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoints {
    /// Previous-day-context lock.
    pub pdc_lock: u32,
    /// Open-location lock.
    pub ol_lock: u32,
    /// Opening-trend / first-candle / range-status lock (after the fifth
    /// bar is expected to have closed).
    pub ot_lock: u32,
    /// Plan arming.
    pub arm: u32,
    /// End-of-day flatten.
    pub eod: u32,
}

/// Everything a manager needs at construction.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Symbol this manager owns.
    pub symbol: String,
    /// Entry mode identifier, copied into the plan.
    pub entry_mode: String,
    /// Bar width in seconds.
    pub bar_width_secs: i64,
    /// Session-local clock offset from UTC, minutes.
    pub utc_offset_minutes: i32,
    /// Checkpoint times.
    pub checkpoints: Checkpoints,
    /// Picker gates.
    pub picker: PickerConfig,
    /// Per-trade risk budget.
    pub risk_budget_rs: Decimal,
    /// Previous-day OHLC, when backfill provided one.
    pub prev_day: Option<DayContext>,
}

/// The per-symbol orchestrator.
#[derive(Debug)]
pub struct DecisionManager {
    cfg: ManagerConfig,
    aggregator: BarAggregator,
    session_bars: Vec<Bar>,
    session_open: Option<Decimal>,
    tags: TagSet,
    locker: TagLocker,
    picker: Picker,
    level_engine: LevelEngine,
    sizer: RiskSizer,
    book: Arc<FrequencyBook>,
    plan: Plan,
    levels: Option<PlanLevels>,
    oms: OrderSimulator,
    last_price: Option<Decimal>,
    entry_px: Option<Decimal>,
    realized_pnl: Decimal,
    unrealized_pnl: Decimal,
    has_position: bool,
    picked: bool,
    arm_attempted: bool,
    eod_done: bool,
    halted: bool,
}

impl DecisionManager {
    /// Build a manager for one symbol-session.
    #[must_use]
    pub fn new(cfg: ManagerConfig, book: Arc<FrequencyBook>) -> Self {
        let aggregator = BarAggregator::new(cfg.bar_width_secs);
        let locker = TagLocker::new(cfg.prev_day);
        let picker = Picker::new(cfg.picker.clone());
        let sizer = RiskSizer::new(cfg.risk_budget_rs);
        let plan = Plan::idle(cfg.entry_mode.clone());
        Self {
            cfg,
            aggregator,
            session_bars: Vec::new(),
            session_open: None,
            tags: TagSet::default(),
            locker,
            picker,
            level_engine: LevelEngine,
            sizer,
            book,
            plan,
            levels: None,
            oms: OrderSimulator::new(),
            last_price: None,
            entry_px: None,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            has_position: false,
            picked: false,
            arm_attempted: false,
            eod_done: false,
            halted: false,
        }
    }

    /// The symbol this manager owns.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.cfg.symbol
    }

    /// Current plan, for inspection.
    #[must_use]
    pub const fn plan(&self) -> &Plan {
        &self.plan
    }

    /// The order simulator, for inspection.
    #[must_use]
    pub const fn oms(&self) -> &OrderSimulator {
        &self.oms
    }

    /// Seconds since session-local midnight for an epoch timestamp.
    fn session_secs(&self, epoch_secs: i64) -> u32 {
        let local = epoch_secs + i64::from(self.cfg.utc_offset_minutes) * 60;
        local.rem_euclid(86_400) as u32
    }

    /// Drive the state machine from one tick.
    ///
    /// Malformed ticks and ticks for other symbols are dropped silently -
    /// input noise is never fatal to the state machine.
    pub fn on_tick(&mut self, tick: &Tick) {
        if tick.symbol != self.cfg.symbol {
            tracing::trace!(got = %tick.symbol, own = %self.cfg.symbol, "dropping foreign tick");
            return;
        }
        let Some(clean) = tick.sanitize() else {
            tracing::trace!(symbol = %self.cfg.symbol, "dropping malformed tick");
            return;
        };

        self.last_price = Some(clean.price);
        if self.session_open.is_none() {
            self.session_open = Some(clean.price);
        }
        if let Some(closed) = self.aggregator.on_tick(clean.timestamp, clean.price) {
            self.session_bars.push(closed);
        }

        self.run_checkpoints(self.session_secs(clean.timestamp));

        if self.plan.status == PlanStatus::Armed {
            self.watch_trigger(clean.price);
        } else if self.plan.status.has_order() {
            self.sync_order(clean.price);
        }

        self.refresh_unrealized();
    }

    /// Drive checkpoint logic from the wall clock (no tick required).
    pub fn on_clock(&mut self, epoch_secs: i64) {
        self.run_checkpoints(self.session_secs(epoch_secs));
    }

    /// Kill switch: force-exit any open order and stop issuing entries.
    /// Terminal states are not rolled back.
    pub fn on_kill_switch(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;
        if self.plan.status.has_order() {
            tracing::warn!(symbol = %self.cfg.symbol, "kill switch: flattening open order");
            self.flatten();
        } else {
            tracing::info!(symbol = %self.cfg.symbol, "kill switch: entries disabled");
        }
    }

    /// Externally consumed state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SymbolSnapshot {
        SymbolSnapshot {
            symbol: self.cfg.symbol.clone(),
            ltp: self.last_price,
            tags: TagsSnapshot {
                pdc: self.tags.pdc.get(),
                ol: self.tags.ol.get(),
                ot: self.tags.ot.get(),
                first_candle_type: self.tags.first_candle_type.get(),
                range_status: self.tags.range_status.get(),
            },
            plan: PlanSnapshot {
                direction: self.plan.direction,
                confidence: self.plan.confidence,
                level: self.plan.level,
                entry_ref: self.plan.entry_ref,
                trigger: self.plan.trigger,
                stop: self.plan.stop,
                t1: self.plan.t1,
                t2: self.plan.t2,
                qty: self.plan.qty,
                status: self.plan.status,
            },
            unrealized_pnl: self.unrealized_pnl,
            realized_pnl: self.realized_pnl,
            has_position: self.has_position,
        }
    }

    /// Fire every checkpoint whose time has come, in session order. Each
    /// fires exactly once; re-running is harmless.
    fn run_checkpoints(&mut self, secs: u32) {
        let cp = self.cfg.checkpoints;

        if secs >= cp.pdc_lock {
            self.locker.lock_pdc(&mut self.tags);
        }
        if secs >= cp.ol_lock {
            self.locker.lock_ol(&mut self.tags, self.session_open);
        }
        if secs >= cp.ot_lock {
            let take = self.session_bars.len().min(OPENING_BARS);
            self.locker
                .lock_open_set(&mut self.tags, &self.session_bars[..take]);
            self.maybe_pick();
        }
        if secs >= cp.arm {
            self.maybe_arm();
        }
        if secs >= cp.eod {
            self.end_of_day();
        }
    }

    /// Run the picker once, immediately after the opening-tag checkpoint.
    fn maybe_pick(&mut self) {
        if self.picked {
            return;
        }
        if !matches!(
            self.plan.status,
            PlanStatus::Idle | PlanStatus::Abstained
        ) {
            return;
        }
        self.picked = true;

        let mut counts: [Option<TierCounts>; 4] = [None; 4];
        for tier in Tier::FALLBACK {
            let Some(slot) = tier.slot() else { continue };
            counts[slot] = signature_key(tier, &self.tags)
                .and_then(|key| self.book.lookup(&self.cfg.symbol, &key));
        }

        let pick = self.picker.pick(&counts, self.tags.ot.get());
        if pick.is_directional() {
            self.plan.direction = pick.direction;
            self.plan.confidence = pick.confidence;
            self.plan.level = pick.level;
            tracing::info!(
                symbol = %self.cfg.symbol,
                direction = ?pick.direction,
                confidence = pick.confidence,
                level = ?pick.level,
                "direction picked"
            );
        } else {
            self.plan.status = PlanStatus::Abstained;
            tracing::info!(symbol = %self.cfg.symbol, "no qualifying tier, abstaining");
        }
    }

    /// Build levels and size the plan at the arming checkpoint.
    fn maybe_arm(&mut self) {
        if self.arm_attempted {
            return;
        }
        if self.plan.status != PlanStatus::Idle || !self.plan.direction.is_directional() {
            return;
        }
        if !self.tags.fully_locked() {
            return;
        }
        self.arm_attempted = true;

        if self.halted {
            self.plan.status = PlanStatus::Abstained;
            tracing::info!(symbol = %self.cfg.symbol, "kill switch active, not arming");
            return;
        }

        let built = self.level_engine.build(
            self.plan.direction,
            self.tags.ot.get(),
            &self.session_bars,
            self.cfg.prev_day.as_ref(),
        );
        let levels = match built {
            Ok(levels) => levels,
            Err(err @ ArmError::RiskRewardFloor) => {
                // Programming defect surfaced as data; degrade to abstain
                // instead of taking the process down.
                tracing::error!(symbol = %self.cfg.symbol, %err, "refusing to arm plan");
                self.plan.status = PlanStatus::Abstained;
                return;
            }
            Err(err) => {
                tracing::info!(symbol = %self.cfg.symbol, %err, "cannot arm, abstaining");
                self.plan.status = PlanStatus::Abstained;
                return;
            }
        };

        let qty = self.sizer.size(levels.risk_per_share);
        if qty == 0 {
            tracing::info!(
                symbol = %self.cfg.symbol,
                risk_per_share = %levels.risk_per_share,
                "sized to zero, abstaining"
            );
            self.plan.status = PlanStatus::Abstained;
            return;
        }

        self.plan.entry_ref = Some(levels.entry_ref);
        self.plan.trigger = Some(levels.trigger);
        self.plan.stop = Some(levels.stop);
        self.plan.t1 = Some(levels.t1);
        self.plan.t2 = Some(levels.t2);
        self.plan.qty = qty;
        self.plan.status = PlanStatus::Armed;
        self.levels = Some(levels);

        tracing::info!(
            symbol = %self.cfg.symbol,
            direction = ?self.plan.direction,
            trigger = %levels.trigger,
            stop = %levels.stop,
            t1 = %levels.t1,
            t2 = %levels.t2,
            qty,
            "plan armed"
        );
    }

    /// While armed, convert a trigger cross into a sent order.
    fn watch_trigger(&mut self, last: Decimal) {
        let Some(levels) = self.levels else { return };
        if self.halted {
            return;
        }

        let crossed = match self.plan.direction {
            Direction::Bull => last >= levels.trigger,
            Direction::Bear => last <= levels.trigger,
            Direction::None => false,
        };
        if crossed {
            self.oms
                .place_entry(self.plan.direction, levels.trigger, self.plan.qty);
            self.plan.status = PlanStatus::OrderSent;
            tracing::info!(
                symbol = %self.cfg.symbol,
                trigger = %levels.trigger,
                last = %last,
                "trigger crossed, order sent"
            );
        }
    }

    /// Apply one OMS sync pass to the plan.
    fn sync_order(&mut self, last: Decimal) {
        let Some(levels) = self.levels else { return };

        match self.oms.sync(last, &levels) {
            SyncEvent::Filled { entry_px } => {
                self.plan.status = PlanStatus::Live;
                self.entry_px = Some(entry_px);
                self.has_position = true;
                tracing::info!(symbol = %self.cfg.symbol, entry_px = %entry_px, "order filled");
            }
            SyncEvent::TargetOne { px } => {
                tracing::info!(symbol = %self.cfg.symbol, t1 = %px, "target-1 touched");
            }
            SyncEvent::Exited {
                reason,
                entry_px,
                exit_px,
                qty,
            } => {
                self.settle(entry_px, exit_px, qty);
                self.plan.status = PlanStatus::Flat;
                tracing::info!(
                    symbol = %self.cfg.symbol,
                    ?reason,
                    exit_px = %exit_px,
                    realized = %self.realized_pnl,
                    "position closed"
                );
            }
            SyncEvent::Pending | SyncEvent::Holding | SyncEvent::Idle => {}
        }
    }

    /// The unskippable end-of-day transition.
    ///
    /// The force-exit always happens; the terminal label distinguishes
    /// whether capital was ever committed: `MISSED` when no fill happened,
    /// `FLAT` when a position existed.
    fn end_of_day(&mut self) {
        if self.eod_done {
            return;
        }
        self.eod_done = true;

        if !matches!(
            self.plan.status,
            PlanStatus::Armed | PlanStatus::OrderSent | PlanStatus::Live
        ) {
            return;
        }

        tracing::info!(symbol = %self.cfg.symbol, status = ?self.plan.status, "end of day flatten");
        self.flatten();
    }

    /// Force-exit whatever is open and assign the terminal label.
    fn flatten(&mut self) {
        match self.oms.force_exit(self.last_price) {
            ForceExitOutcome::Closed {
                entry_px,
                exit_px,
                qty,
            } => {
                self.settle(entry_px, exit_px, qty);
                self.plan.status = PlanStatus::Flat;
                tracing::info!(
                    symbol = %self.cfg.symbol,
                    exit_px = %exit_px,
                    realized = %self.realized_pnl,
                    "forced exit"
                );
            }
            ForceExitOutcome::Cancelled | ForceExitOutcome::NoOrder => {
                self.plan.status = PlanStatus::Missed;
                tracing::info!(symbol = %self.cfg.symbol, "no fill by flatten, plan missed");
            }
        }
    }

    /// Book realized PnL for a closed position.
    fn settle(&mut self, entry_px: Decimal, exit_px: Decimal, qty: u64) {
        let sign = Decimal::from(self.plan.direction.sign());
        self.realized_pnl += (exit_px - entry_px) * Decimal::from(qty) * sign;
        self.unrealized_pnl = Decimal::ZERO;
        self.has_position = false;
        self.entry_px = None;
    }

    /// Mark open-position PnL to the last price.
    fn refresh_unrealized(&mut self) {
        if !self.has_position {
            return;
        }
        let (Some(last), Some(entry)) = (self.last_price, self.entry_px) else {
            return;
        };
        let sign = Decimal::from(self.plan.direction.sign());
        self.unrealized_pnl = (last - entry) * Decimal::from(self.plan.qty) * sign;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{OpenLocation, OpeningTrend, PrevDayContext};
    use rust_decimal_macros::dec;

    const SYMBOL: &str = "RELIANCE";

    /// Checkpoints for a compressed test session: 300 s bars starting at
    /// epoch 0, fifth bar closed by t=1500.
    const fn checkpoints() -> Checkpoints {
        Checkpoints {
            pdc_lock: 60,
            ol_lock: 400,
            ot_lock: 1560,
            arm: 1620,
            eod: 3000,
        }
    }

    fn config(risk_budget: Decimal) -> ManagerConfig {
        ManagerConfig {
            symbol: SYMBOL.to_string(),
            entry_mode: "orb-breakout".to_string(),
            bar_width_secs: 300,
            utc_offset_minutes: 0,
            checkpoints: checkpoints(),
            picker: PickerConfig {
                min_samples: [8, 6, 4, 2],
                min_confidence: 55,
                require_ot_alignment: false,
            },
            risk_budget_rs: risk_budget,
            prev_day: Some(DayContext {
                open: dec!(98),
                high: dec!(104),
                low: dec!(96),
                close: dec!(103),
            }),
        }
    }

    fn book() -> Arc<FrequencyBook> {
        let json = format!(
            r#"{{"{SYMBOL}": {{"L3|BULLISH|ABOVE_HIGH|BULL": {{"bull": 9, "bear": 1}}}}}}"#
        );
        Arc::new(FrequencyBook::from_json_str(&json).unwrap())
    }

    fn manager(risk_budget: Decimal) -> DecisionManager {
        DecisionManager::new(config(risk_budget), book())
    }

    fn tick(manager: &mut DecisionManager, t: f64, price: f64) {
        manager.on_tick(&Tick::new(SYMBOL, t, price));
    }

    /// Drive the opening 25 minutes: rising market, ORB 104..110.
    fn run_opening(m: &mut DecisionManager) {
        let ticks = [
            (0.0, 105.0),
            (100.0, 104.0),
            (200.0, 106.0),
            (300.0, 106.0),
            (400.0, 107.0),
            (600.0, 107.0),
            (700.0, 108.0),
            (900.0, 108.0),
            (1000.0, 109.0),
            (1200.0, 109.0),
            (1300.0, 110.0),
            (1400.0, 109.5),
            // Closes the fifth bar; OT/arm checkpoints have not passed yet.
            (1500.0, 109.0),
        ];
        for (t, px) in ticks {
            tick(m, t, px);
        }
    }

    /// Drive through pick + arm. Leaves the plan ARMED below its trigger.
    fn run_to_armed(m: &mut DecisionManager) {
        run_opening(m);
        tick(m, 1650.0, 109.0);
    }

    #[test]
    fn opening_run_locks_expected_tags() {
        let mut m = manager(dec!(1200));
        run_opening(&mut m);
        tick(&mut m, 1600.0, 109.0);

        assert_eq!(m.snapshot().tags.pdc, Some(PrevDayContext::Bullish));
        assert_eq!(m.snapshot().tags.ol, Some(OpenLocation::AboveHigh));
        assert_eq!(m.snapshot().tags.ot, Some(OpeningTrend::Bull));
    }

    #[test]
    fn arms_with_orb_levels_and_sized_qty() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        let plan = m.plan();
        assert_eq!(plan.status, PlanStatus::Armed);
        assert_eq!(plan.direction, Direction::Bull);
        assert_eq!(plan.confidence, 90);
        assert_eq!(plan.level, Tier::L3);
        assert_eq!(plan.entry_ref, Some(dec!(110)));
        assert_eq!(plan.trigger, Some(dec!(110)));
        // Aligned with OT, far from the previous-day low: ORB low stop.
        assert_eq!(plan.stop, Some(dec!(104)));
        assert_eq!(plan.t1, Some(dec!(116)));
        assert_eq!(plan.t2, Some(dec!(122)));
        // 1200 / 6 risk per share.
        assert_eq!(plan.qty, 200);
    }

    #[test]
    fn full_lifecycle_to_stop_out() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        // Below the trigger: still armed.
        tick(&mut m, 1700.0, 109.5);
        assert_eq!(m.plan().status, PlanStatus::Armed);

        // Trigger cross places the order; the fill happens on a later tick.
        tick(&mut m, 1710.0, 110.0);
        assert_eq!(m.plan().status, PlanStatus::OrderSent);

        tick(&mut m, 1720.0, 111.0);
        assert_eq!(m.plan().status, PlanStatus::Live);
        let snap = m.snapshot();
        assert!(snap.has_position);
        assert_eq!(snap.unrealized_pnl, dec!(200));

        // Stop cross closes at the stop level.
        tick(&mut m, 1800.0, 103.0);
        let snap = m.snapshot();
        assert_eq!(snap.plan.status, PlanStatus::Flat);
        assert!(!snap.has_position);
        assert_eq!(snap.unrealized_pnl, Decimal::ZERO);
        // (104 - 110) * 200.
        assert_eq!(snap.realized_pnl, dec!(-1200));

        let done = m.oms().completed().unwrap();
        assert!(done.stop_hit);
        assert!(!done.t1_hit);
        assert!(!done.t2_hit);
    }

    #[test]
    fn target_two_exit_realizes_profit() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);
        tick(&mut m, 1710.0, 110.0);
        tick(&mut m, 1720.0, 116.5); // fills, and t1 is checked next tick
        assert_eq!(m.plan().status, PlanStatus::Live);

        tick(&mut m, 1730.0, 122.5);
        let snap = m.snapshot();
        assert_eq!(snap.plan.status, PlanStatus::Flat);
        // (122 - 110) * 200.
        assert_eq!(snap.realized_pnl, dec!(2400));
    }

    #[test]
    fn eod_without_trigger_cross_is_missed() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        tick(&mut m, 3100.0, 109.0);
        assert_eq!(m.plan().status, PlanStatus::Missed);
    }

    #[test]
    fn eod_with_open_position_flattens_at_last_price() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);
        tick(&mut m, 1710.0, 110.0);
        tick(&mut m, 1720.0, 112.0);
        assert_eq!(m.plan().status, PlanStatus::Live);

        tick(&mut m, 3100.0, 113.0);
        let snap = m.snapshot();
        assert_eq!(snap.plan.status, PlanStatus::Flat);
        // (113 - 110) * 200.
        assert_eq!(snap.realized_pnl, dec!(600));
        assert!(!snap.has_position);
    }

    #[test]
    fn eod_with_unfilled_order_is_missed() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        // Cross the trigger, then fade below it before any fill-confirming
        // tick arrives.
        tick(&mut m, 1710.0, 110.0);
        assert_eq!(m.plan().status, PlanStatus::OrderSent);

        tick(&mut m, 3100.0, 109.0);
        assert_eq!(m.plan().status, PlanStatus::Missed);
    }

    #[test]
    fn clock_only_session_still_locks_and_terminates() {
        let mut m = manager(dec!(1200));

        // Not a single tick: drive checkpoints from the timer alone.
        m.on_clock(100);
        m.on_clock(500);
        m.on_clock(1700);

        let snap = m.snapshot();
        // PDC comes from the previous day and locks without ticks; the
        // others lock empty.
        assert_eq!(snap.tags.pdc, Some(PrevDayContext::Bullish));
        assert_eq!(snap.tags.ol, None);
        assert_eq!(snap.tags.ot, None);
        // Pick ran against an unreachable signature and abstained.
        assert_eq!(snap.plan.status, PlanStatus::Abstained);

        m.on_clock(3200);
        assert_eq!(m.plan().status, PlanStatus::Abstained);
    }

    #[test]
    fn checkpoints_fire_once_even_when_reobserved() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);
        let armed_qty = m.plan().qty;

        // Clock keeps ticking past every checkpoint; nothing re-fires.
        m.on_clock(1650);
        m.on_clock(1660);
        assert_eq!(m.plan().status, PlanStatus::Armed);
        assert_eq!(m.plan().qty, armed_qty);
    }

    #[test]
    fn empty_book_abstains() {
        let mut m = DecisionManager::new(config(dec!(1200)), Arc::new(FrequencyBook::empty()));
        run_opening(&mut m);
        tick(&mut m, 1600.0, 109.0);
        assert_eq!(m.plan().status, PlanStatus::Abstained);
    }

    #[test]
    fn zero_qty_abstains_instead_of_arming() {
        // Risk per share is 6; a 5-rupee budget sizes to zero.
        let mut m = manager(dec!(5));
        run_to_armed(&mut m);
        assert_eq!(m.plan().status, PlanStatus::Abstained);
        assert_eq!(m.plan().qty, 0);
    }

    #[test]
    fn too_few_bars_at_arm_abstains() {
        let mut m = manager(dec!(1200));
        // Only two bars before the checkpoints pass.
        tick(&mut m, 0.0, 105.0);
        tick(&mut m, 300.0, 106.0);
        tick(&mut m, 650.0, 107.0);
        m.on_clock(1700);

        assert_eq!(m.plan().status, PlanStatus::Abstained);
    }

    #[test]
    fn malformed_ticks_are_dropped_silently() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        tick(&mut m, 1700.0, f64::NAN);
        tick(&mut m, f64::INFINITY, 110.0);
        m.on_tick(&Tick::new("TCS", 1700.0, 110.0));

        // None of those may have armed the trigger.
        assert_eq!(m.plan().status, PlanStatus::Armed);
        assert_eq!(m.snapshot().ltp, Some(dec!(109)));
    }

    #[test]
    fn kill_switch_blocks_new_entries() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);

        m.on_kill_switch();
        tick(&mut m, 1700.0, 111.0); // would have crossed the trigger
        assert_eq!(m.plan().status, PlanStatus::Armed);

        // EOD labels the never-filled plan as missed.
        tick(&mut m, 3100.0, 111.0);
        assert_eq!(m.plan().status, PlanStatus::Missed);
    }

    #[test]
    fn kill_switch_flattens_live_position() {
        let mut m = manager(dec!(1200));
        run_to_armed(&mut m);
        tick(&mut m, 1710.0, 110.0);
        tick(&mut m, 1720.0, 112.0);
        assert_eq!(m.plan().status, PlanStatus::Live);

        m.on_kill_switch();
        let snap = m.snapshot();
        assert_eq!(snap.plan.status, PlanStatus::Flat);
        // (112 - 110) * 200, closed at the last seen price.
        assert_eq!(snap.realized_pnl, dec!(400));
    }

    #[test]
    fn kill_switch_before_pick_abstains_at_arm() {
        let mut m = manager(dec!(1200));
        m.on_kill_switch();
        run_to_armed(&mut m);
        assert_eq!(m.plan().status, PlanStatus::Abstained);
    }

    #[test]
    fn snapshot_carries_symbol_and_ltp() {
        let mut m = manager(dec!(1200));
        tick(&mut m, 10.0, 105.5);
        let snap = m.snapshot();
        assert_eq!(snap.symbol, SYMBOL);
        assert_eq!(snap.ltp, Some(dec!(105.5)));
        assert_eq!(snap.plan.status, PlanStatus::Idle);
    }

    #[test]
    fn session_clock_respects_utc_offset() {
        let mut cfg = config(dec!(1200));
        cfg.utc_offset_minutes = 330; // IST
        let m = DecisionManager::new(cfg, book());

        // 03:45 UTC == 09:15 IST.
        assert_eq!(m.session_secs(3 * 3600 + 45 * 60), 9 * 3600 + 15 * 60);
    }
}
