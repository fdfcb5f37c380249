//! Intraday Engine Binary
//!
//! Starts the Saffron intraday decision engine against the simulated feed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin intraday-engine [config.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)
//!
//! YAML values may reference environment variables with `${VAR}` or
//! `${VAR:-default}`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use intraday_engine::config::{Config, PrevDayConfig, SymbolConfig, load_config};
use intraday_engine::engine::{DecisionManager, ManagerConfig, SymbolWorker};
use intraday_engine::feed::{SimFeed, SimFeedConfig};
use intraday_engine::models::Tick;
use intraday_engine::picker::FrequencyBook;
use intraday_engine::session::{AppState, SharedState};
use intraday_engine::telemetry;
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Per-symbol tick channel depth; overflow ticks are dropped by the feed.
const TICK_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting Saffron intraday engine");

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    log_config(&config);

    if config.symbols.is_empty() {
        anyhow::bail!("no symbols configured; nothing to run");
    }

    let book = load_book(&config)?;
    let state: SharedState = Arc::new(AppState::new(
        config.risk_budget().context("risk budget")?,
        config.engine.entry_mode.clone(),
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let (worker_handles, routes) = spawn_workers(&config, &book, &state)?;
    let feed_handle = spawn_feed(&config, routes, shutdown_tx.subscribe());

    tracing::info!("Intraday engine ready");

    shutdown_signal().await;

    // Flatten everything, then stop the feed; workers drain and finish
    // once their tick channels close.
    state.kill_switch().trip();
    let _ = shutdown_tx.send(());

    let _ = feed_handle.await;
    for handle in worker_handles {
        let _ = handle.await;
    }

    for snapshot in state.all_snapshots().await {
        tracing::info!(
            symbol = %snapshot.symbol,
            status = ?snapshot.plan.status,
            realized_pnl = %snapshot.realized_pnl,
            "final state"
        );
    }

    tracing::info!("Intraday engine stopped");
    Ok(())
}

/// Log the loaded configuration.
fn log_config(config: &Config) {
    tracing::info!(
        risk_budget_rs = config.engine.risk_budget_rs,
        entry_mode = %config.engine.entry_mode,
        bar_width_secs = config.engine.bar_width_secs,
        utc_offset_minutes = config.engine.utc_offset_minutes,
        min_confidence = config.engine.min_confidence,
        require_ot_alignment = config.engine.require_ot_alignment,
        symbols = config.symbols.len(),
        "Configuration loaded"
    );
}

/// Load the frequency book, or fall back to an empty one.
fn load_book(config: &Config) -> anyhow::Result<Arc<FrequencyBook>> {
    let book = match config.stats.book_path.as_deref() {
        Some(path) => FrequencyBook::load(std::path::Path::new(path))
            .with_context(|| format!("loading frequency book '{path}'"))?,
        None => {
            tracing::warn!("no frequency book configured; every pick will abstain");
            FrequencyBook::empty()
        }
    };
    Ok(Arc::new(book))
}

/// Spawn one worker per configured symbol; returns the join handles and
/// the per-symbol tick routes for the feed.
fn spawn_workers(
    config: &Config,
    book: &Arc<FrequencyBook>,
    state: &SharedState,
) -> anyhow::Result<(Vec<JoinHandle<()>>, HashMap<String, mpsc::Sender<Tick>>)> {
    let mut handles = Vec::with_capacity(config.symbols.len());
    let mut routes = HashMap::with_capacity(config.symbols.len());

    for sym in &config.symbols {
        let manager = build_manager(config, sym, book)
            .with_context(|| format!("building manager for '{}'", sym.symbol))?;
        let (tx, rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        let worker = SymbolWorker::new(manager, rx, Arc::clone(state));

        routes.insert(sym.symbol.clone(), tx);
        handles.push(tokio::spawn(worker.run()));
    }

    Ok((handles, routes))
}

/// Build one symbol's decision manager from configuration.
fn build_manager(
    config: &Config,
    sym: &SymbolConfig,
    book: &Arc<FrequencyBook>,
) -> anyhow::Result<DecisionManager> {
    let checkpoints = config.checkpoints.parse()?;
    let prev_day = sym
        .prev_day
        .as_ref()
        .map(PrevDayConfig::day_context)
        .transpose()?;

    Ok(DecisionManager::new(
        ManagerConfig {
            symbol: sym.symbol.clone(),
            entry_mode: config.engine.entry_mode.clone(),
            bar_width_secs: config.engine.bar_width_secs,
            utc_offset_minutes: config.engine.utc_offset_minutes,
            checkpoints,
            picker: config.picker_config(),
            risk_budget_rs: config.risk_budget()?,
            prev_day,
        },
        Arc::clone(book),
    ))
}

/// Spawn the simulated feed over the worker routes.
fn spawn_feed(
    config: &Config,
    routes: HashMap<String, mpsc::Sender<Tick>>,
    shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let start_prices = config
        .symbols
        .iter()
        .map(|s| {
            (
                s.symbol.clone(),
                s.start_price.unwrap_or(config.feed.start_price),
            )
        })
        .collect();

    let feed = SimFeed::new(
        SimFeedConfig {
            tick_interval_ms: config.feed.tick_interval_ms,
            seed: config.feed.seed,
            volatility_bps: config.feed.volatility_bps,
        },
        start_prices,
    );

    tokio::spawn(feed.run(routes, shutdown_rx))
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed: a process that cannot
/// respond to termination signals is worse than one that fails fast at
/// startup.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
