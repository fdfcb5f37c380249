//! Seeded random-walk tick generator.

use std::collections::HashMap;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;

use crate::models::Tick;

/// Simulated feed parameters.
#[derive(Debug, Clone)]
pub struct SimFeedConfig {
    /// Milliseconds between generated ticks (per symbol).
    pub tick_interval_ms: u64,
    /// RNG seed for reproducible runs.
    pub seed: u64,
    /// Per-tick move scale in basis points.
    pub volatility_bps: f64,
}

impl Default for SimFeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            seed: 7,
            volatility_bps: 15.0,
        }
    }
}

/// Deterministic random-walk feed for a set of symbols.
pub struct SimFeed {
    config: SimFeedConfig,
    prices: Vec<(String, f64)>,
    rng: StdRng,
}

impl SimFeed {
    /// Create a feed from `(symbol, start_price)` pairs.
    #[must_use]
    pub fn new(config: SimFeedConfig, start_prices: Vec<(String, f64)>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            prices: start_prices,
            rng,
        }
    }

    /// Generate one tick per symbol.
    fn step(&mut self, now: f64) -> Vec<Tick> {
        let scale = self.config.volatility_bps / 10_000.0;
        let rng = &mut self.rng;
        self.prices
            .iter_mut()
            .map(|(symbol, price)| {
                let shock: f64 = rng.random_range(-1.0..1.0);
                *price *= 1.0 + shock * scale;
                Tick::new(symbol.clone(), now, *price)
            })
            .collect()
    }

    /// Run until shutdown or until every receiver is gone.
    ///
    /// Ticks are delivered with `try_send`: a stalled worker drops ticks
    /// rather than stalling the feed, matching the engine's no-retry
    /// policy.
    pub async fn run(
        mut self,
        routes: HashMap<String, mpsc::Sender<Tick>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            symbols = routes.len(),
            interval_ms = self.config.tick_interval_ms,
            seed = self.config.seed,
            "simulated feed started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
                    let mut delivered = false;
                    for tick in self.step(now) {
                        let Some(tx) = routes.get(&tick.symbol) else { continue };
                        match tx.try_send(tick) {
                            Ok(()) => delivered = true,
                            Err(mpsc::error::TrySendError::Full(dropped)) => {
                                tracing::trace!(symbol = %dropped.symbol, "worker busy, tick dropped");
                                delivered = true;
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {}
                        }
                    }
                    if !delivered && !routes.is_empty() {
                        tracing::info!("all workers gone, feed stopping");
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("simulated feed shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(symbols: &[&str]) -> SimFeed {
        SimFeed::new(
            SimFeedConfig {
                tick_interval_ms: 1,
                seed: 42,
                volatility_bps: 15.0,
            },
            symbols.iter().map(|s| ((*s).to_string(), 100.0)).collect(),
        )
    }

    #[test]
    fn step_produces_one_tick_per_symbol() {
        let mut f = feed(&["A", "B"]);
        let ticks = f.step(1000.0);
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].symbol, "A");
        assert_eq!(ticks[1].symbol, "B");
        for tick in &ticks {
            assert!(tick.price.is_finite());
            assert!(tick.price > 0.0);
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut a = feed(&["A"]);
        let mut b = feed(&["A"]);
        for _ in 0..10 {
            let ta = a.step(0.0);
            let tb = b.step(0.0);
            assert!((ta[0].price - tb[0].price).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn walk_stays_in_sane_bounds() {
        let mut f = feed(&["A"]);
        for _ in 0..1000 {
            let ticks = f.step(0.0);
            // 15 bps per tick cannot move 100 beyond these bounds in 1000 steps.
            assert!(ticks[0].price > 10.0);
            assert!(ticks[0].price < 1000.0);
        }
    }

    #[tokio::test]
    async fn run_delivers_ticks_and_honors_shutdown() {
        let (tx, mut rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let routes = HashMap::from([("A".to_string(), tx)]);

        let handle = tokio::spawn(feed(&["A"]).run(routes, shutdown_rx));

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.symbol, "A");

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_when_receivers_close() {
        let (tx, rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let routes = HashMap::from([("A".to_string(), tx)]);
        drop(rx);

        // Must terminate on its own once the only receiver is gone.
        feed(&["A"]).run(routes, shutdown_rx).await;
    }
}
