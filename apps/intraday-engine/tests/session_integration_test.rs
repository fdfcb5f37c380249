//! Session Integration Tests
//!
//! End-to-end scenarios driving a full symbol-session through the public
//! API: ticks in, state transitions and snapshots out. The sessions are
//! compressed (epoch-zero timestamps, session offset 0) so every
//! checkpoint is driven deterministically by tick time.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use intraday_engine::engine::{Checkpoints, DecisionManager, ManagerConfig};
use intraday_engine::levels::DayContext;
use intraday_engine::models::{Direction, PlanStatus, Tick, Tier};
use intraday_engine::picker::{FrequencyBook, PickerConfig};
use intraday_engine::session::AppState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Compressed session: 300 s bars from epoch 0, fifth bar closed at 1500.
const fn checkpoints() -> Checkpoints {
    Checkpoints {
        pdc_lock: 60,
        ol_lock: 400,
        ot_lock: 1560,
        arm: 1620,
        eod: 3000,
    }
}

fn manager_config(symbol: &str, risk_budget: Decimal, prev_day: DayContext) -> ManagerConfig {
    ManagerConfig {
        symbol: symbol.to_string(),
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
        prev_day: Some(prev_day),
    }
}

fn book_for(symbol: &str, key: &str) -> Arc<FrequencyBook> {
    let json = format!(r#"{{"{symbol}": {{"{key}": {{"bull": 9, "bear": 1}}}}}}"#);
    Arc::new(FrequencyBook::from_json_str(&json).expect("valid book"))
}

fn drive(m: &mut DecisionManager, symbol: &str, ticks: &[(f64, f64)]) {
    for &(t, px) in ticks {
        m.on_tick(&Tick::new(symbol, t, px));
    }
}

/// Rising opening: ORB 100..105, opening trend BULL, open in the upper
/// half of the previous day.
const BULL_OPENING: [(f64, f64); 17] = [
    (0.0, 100.5),
    (60.0, 102.0),
    (120.0, 100.0),
    (240.0, 101.5),
    (300.0, 101.5),
    (400.0, 103.0),
    (500.0, 101.0),
    (560.0, 102.5),
    (600.0, 102.0),
    (700.0, 104.0),
    (870.0, 103.5),
    (900.0, 103.0),
    (1000.0, 105.0),
    (1100.0, 104.5),
    (1200.0, 104.0),
    (1400.0, 104.5),
    (1500.0, 104.0), // closes the fifth bar
];

/// Falling opening: ORB 100..105, opening trend BEAR.
const BEAR_OPENING: [(f64, f64); 13] = [
    (0.0, 104.5),
    (60.0, 105.0),
    (120.0, 103.5),
    (240.0, 104.0),
    (300.0, 104.0),
    (400.0, 102.5),
    (600.0, 103.0),
    (700.0, 101.5),
    (900.0, 102.0),
    (1000.0, 100.5),
    (1200.0, 101.0),
    (1300.0, 100.0),
    (1500.0, 100.5), // closes the fifth bar
];

#[test]
fn bull_breakout_stops_out_end_to_end() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);

    drive(&mut m, "RELIANCE", &BULL_OPENING);

    // Pick and arm.
    drive(&mut m, "RELIANCE", &[(1650.0, 103.0)]);
    {
        let plan = m.plan();
        assert_eq!(plan.status, PlanStatus::Armed);
        assert_eq!(plan.direction, Direction::Bull);
        assert_eq!(plan.confidence, 90);
        assert_eq!(plan.level, Tier::L3);
        assert_eq!(plan.entry_ref, Some(dec!(105)));
        assert_eq!(plan.trigger, Some(dec!(105)));
        assert_eq!(plan.stop, Some(dec!(100)));
        assert_eq!(plan.t1, Some(dec!(110)));
        assert_eq!(plan.t2, Some(dec!(115)));
        assert_eq!(plan.qty, 100); // 500 budget / 5 risk per share
    }

    // ARMED -> ORDER_SENT -> LIVE -> FLAT(stop).
    drive(&mut m, "RELIANCE", &[(1700.0, 103.0)]);
    assert_eq!(m.plan().status, PlanStatus::Armed);

    drive(&mut m, "RELIANCE", &[(1710.0, 105.0)]);
    assert_eq!(m.plan().status, PlanStatus::OrderSent);

    drive(&mut m, "RELIANCE", &[(1720.0, 107.0)]);
    assert_eq!(m.plan().status, PlanStatus::Live);
    assert_eq!(m.snapshot().unrealized_pnl, dec!(200));

    drive(&mut m, "RELIANCE", &[(1730.0, 99.0)]);

    let snap = m.snapshot();
    assert_eq!(snap.plan.status, PlanStatus::Flat);
    assert!(!snap.has_position);
    assert_eq!(snap.unrealized_pnl, Decimal::ZERO);
    // Stopped at 100 against a 105 entry, 100 shares.
    assert_eq!(snap.realized_pnl, dec!(-500));

    let done = m.oms().completed().expect("completed order record");
    assert!(done.stop_hit);
    assert!(!done.t1_hit);
    assert!(!done.t2_hit);
}

#[test]
fn bear_breakdown_rides_to_target_two() {
    // Previous-day high 105.1 sits within the tie-break threshold of the
    // ORB high, so the short stop moves out to 105.1.
    let prev_day = DayContext {
        open: dec!(104),
        high: dec!(105.1),
        low: dec!(99),
        close: dec!(100),
    };
    let json = r#"{"TCS": {"L3|BEARISH|UPPER_HALF|BEAR": {"bull": 1, "bear": 9}}}"#;
    let book = Arc::new(FrequencyBook::from_json_str(json).unwrap());
    let mut m = DecisionManager::new(manager_config("TCS", dec!(510), prev_day), book);

    drive(&mut m, "TCS", &BEAR_OPENING);
    drive(&mut m, "TCS", &[(1650.0, 100.5)]);

    {
        let plan = m.plan();
        assert_eq!(plan.status, PlanStatus::Armed);
        assert_eq!(plan.direction, Direction::Bear);
        assert_eq!(plan.confidence, 90);
        assert_eq!(plan.entry_ref, Some(dec!(100)));
        assert_eq!(plan.stop, Some(dec!(105.1)));
        assert_eq!(plan.t1, Some(dec!(94.9)));
        assert_eq!(plan.t2, Some(dec!(89.8)));
        assert_eq!(plan.qty, 100); // 510 / 5.1
    }

    drive(&mut m, "TCS", &[(1700.0, 100.0)]);
    assert_eq!(m.plan().status, PlanStatus::OrderSent);

    drive(&mut m, "TCS", &[(1710.0, 99.5)]);
    assert_eq!(m.plan().status, PlanStatus::Live);

    // Target-1 touch keeps the position open.
    drive(&mut m, "TCS", &[(1720.0, 94.0)]);
    assert_eq!(m.plan().status, PlanStatus::Live);
    assert!(m.oms().order().unwrap().t1_hit);

    // Target-2 closes at 89.8.
    drive(&mut m, "TCS", &[(1730.0, 89.5)]);
    let snap = m.snapshot();
    assert_eq!(snap.plan.status, PlanStatus::Flat);
    assert_eq!(snap.realized_pnl, dec!(1020)); // (100 - 89.8) * 100
}

#[test]
fn armed_plan_missed_at_end_of_day() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);

    drive(&mut m, "RELIANCE", &BULL_OPENING);
    drive(&mut m, "RELIANCE", &[(1650.0, 103.0)]);
    assert_eq!(m.plan().status, PlanStatus::Armed);

    // Price never reaches 105; the EOD tick forces the terminal label.
    drive(&mut m, "RELIANCE", &[(2000.0, 104.0), (3100.0, 103.5)]);
    assert_eq!(m.plan().status, PlanStatus::Missed);
}

#[test]
fn quiet_market_checkpoints_fire_from_the_clock() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);

    // Not a single tick arrives; the session must still settle terminally.
    for t in [100, 500, 1600, 1650, 3100] {
        m.on_clock(t);
    }

    let snap = m.snapshot();
    assert!(snap.tags.pdc.is_some());
    assert_eq!(snap.plan.status, PlanStatus::Abstained);
}

#[test]
fn snapshot_json_matches_downstream_contract() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);

    drive(&mut m, "RELIANCE", &BULL_OPENING);
    drive(&mut m, "RELIANCE", &[(1650.0, 103.0), (1710.0, 105.0)]);

    let value = serde_json::to_value(m.snapshot()).unwrap();
    assert_eq!(value["symbol"], "RELIANCE");
    assert_eq!(value["plan"]["status"], "ORDER_SENT");
    assert_eq!(value["plan"]["direction"], "BULL");
    assert_eq!(value["plan"]["level"], "L3");
    assert_eq!(value["plan"]["qty"], 100);
    assert_eq!(value["tags"]["pdc"], "BULLISH");
    assert_eq!(value["tags"]["ol"], "UPPER_HALF");
    assert_eq!(value["tags"]["ot"], "BULL");
    assert_eq!(value["has_position"], false);
}

#[tokio::test]
async fn session_state_serves_published_snapshots() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);
    drive(&mut m, "RELIANCE", &BULL_OPENING);

    let state = AppState::new(dec!(500), "orb-breakout");
    state.publish(m.snapshot()).await;

    let snap = state.snapshot_of("RELIANCE").await.expect("snapshot");
    assert_eq!(snap.ltp, Some(dec!(104)));
    assert!(state.snapshot_of("TCS").await.is_none());
}

#[test]
fn kill_switch_mid_session_flattens_and_blocks() {
    let prev_day = DayContext {
        open: dec!(99),
        high: dec!(103),
        low: dec!(97),
        close: dec!(102),
    };
    let book = book_for("RELIANCE", "L3|BULLISH|UPPER_HALF|BULL");
    let mut m = DecisionManager::new(manager_config("RELIANCE", dec!(500), prev_day), book);

    drive(&mut m, "RELIANCE", &BULL_OPENING);
    drive(&mut m, "RELIANCE", &[(1650.0, 103.0), (1710.0, 105.0), (1720.0, 107.0)]);
    assert_eq!(m.plan().status, PlanStatus::Live);

    m.on_kill_switch();
    let snap = m.snapshot();
    assert_eq!(snap.plan.status, PlanStatus::Flat);
    // Closed at the last seen price: (107 - 105) * 100.
    assert_eq!(snap.realized_pnl, dec!(200));

    // Terminal state is not rolled back by later ticks.
    drive(&mut m, "RELIANCE", &[(1800.0, 120.0)]);
    assert_eq!(m.plan().status, PlanStatus::Flat);
}
