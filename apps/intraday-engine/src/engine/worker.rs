//! One tokio task per symbol.
//!
//! Each worker owns its manager exclusively and is driven by three event
//! sources: the symbol's tick channel, a one-second clock interval (so
//! checkpoints fire even on a quiet market), and the session kill switch.
//! After every event the worker publishes a fresh snapshot into the shared
//! registry.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::DecisionManager;
use crate::models::Tick;
use crate::session::SharedState;

/// Per-symbol worker loop.
pub struct SymbolWorker {
    manager: DecisionManager,
    ticks: mpsc::Receiver<Tick>,
    state: SharedState,
}

impl SymbolWorker {
    /// Wire a manager to its tick channel and the shared session state.
    #[must_use]
    pub fn new(manager: DecisionManager, ticks: mpsc::Receiver<Tick>, state: SharedState) -> Self {
        Self {
            manager,
            ticks,
            state,
        }
    }

    /// Run until the tick channel closes.
    pub async fn run(mut self) {
        let mut kill_rx = self.state.kill_switch().subscribe();
        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(symbol = %self.manager.symbol(), "worker started");

        loop {
            tokio::select! {
                maybe_tick = self.ticks.recv() => {
                    let Some(tick) = maybe_tick else { break };
                    self.manager.on_tick(&tick);
                }
                _ = clock.tick() => {
                    self.manager.on_clock(chrono::Utc::now().timestamp());
                }
                changed = kill_rx.changed() => {
                    if changed.is_ok() && *kill_rx.borrow_and_update() {
                        self.manager.on_kill_switch();
                    }
                }
            }
            self.state.publish(self.manager.snapshot()).await;
        }

        // Feed gone. A kill-switch trip may have raced the channel close;
        // make sure the flatten is not lost before the final snapshot.
        if self.state.kill_switch().is_tripped() {
            self.manager.on_kill_switch();
        }
        self.state.publish(self.manager.snapshot()).await;
        tracing::info!(symbol = %self.manager.symbol(), "worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::engine::{Checkpoints, ManagerConfig};
    use crate::models::PlanStatus;
    use crate::picker::{FrequencyBook, PickerConfig};
    use crate::session::AppState;

    fn manager(symbol: &str) -> DecisionManager {
        DecisionManager::new(
            ManagerConfig {
                symbol: symbol.to_string(),
                entry_mode: "orb-breakout".to_string(),
                bar_width_secs: 300,
                utc_offset_minutes: 0,
                checkpoints: Checkpoints {
                    pdc_lock: 60,
                    ol_lock: 120,
                    ot_lock: 1560,
                    arm: 1620,
                    eod: 3000,
                },
                picker: PickerConfig::default(),
                risk_budget_rs: Decimal::from(1000),
                prev_day: None,
            },
            Arc::new(FrequencyBook::empty()),
        )
    }

    #[tokio::test]
    async fn worker_processes_ticks_and_publishes() {
        let state = Arc::new(AppState::new(Decimal::from(1000), "orb-breakout"));
        let (tx, rx) = mpsc::channel(16);
        let worker = SymbolWorker::new(manager("TCS"), rx, Arc::clone(&state));
        let handle = tokio::spawn(worker.run());

        tx.send(Tick::new("TCS", 10.0, 3500.5)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let snap = state.snapshot_of("TCS").await.unwrap();
        assert_eq!(snap.ltp, Some(dec!(3500.5)));
        // The wall-clock interval may or may not have fired checkpoints
        // already (it runs on real time); either pre-pick state is fine.
        assert!(matches!(
            snap.plan.status,
            PlanStatus::Idle | PlanStatus::Abstained
        ));
    }

    #[tokio::test]
    async fn kill_switch_reaches_the_manager() {
        let state = Arc::new(AppState::new(Decimal::from(1000), "orb-breakout"));
        let (tx, rx) = mpsc::channel(16);
        let worker = SymbolWorker::new(manager("TCS"), rx, Arc::clone(&state));
        let handle = tokio::spawn(worker.run());

        tx.send(Tick::new("TCS", 10.0, 3500.0)).await.unwrap();
        state.kill_switch().trip();

        // Give the worker a moment to observe the trip, then shut down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(tx);
        handle.await.unwrap();

        assert!(state.kill_switch().is_tripped());
        assert!(state.snapshot_of("TCS").await.is_some());
    }
}
