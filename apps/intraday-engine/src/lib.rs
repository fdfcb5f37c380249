// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Intraday Engine - Rust Core Library
//!
//! Deterministic per-symbol decision/execution engine for the Saffron
//! trading system.
//!
//! # Pipeline
//!
//! Each traded symbol runs an independent pipeline, driven by tick arrival
//! and a session clock:
//!
//! ```text
//! tick ──► BarAggregator ──► bar history
//!                                │
//!                 TagLocker (wall-clock-gated, locks once)
//!                                │
//!                  Picker (L3→L0 frequency fallback)
//!                                │
//!             LevelEngine + RiskSizer (ORB levels, fixed risk)
//!                                │
//!          DecisionManager (IDLE → ARMED → ORDER_SENT → LIVE → FLAT)
//!                                │
//!            OrderSimulator (fill / stop / target transitions)
//!                                │
//!                    SymbolSnapshot (external contract)
//! ```
//!
//! # Boundaries
//!
//! Historical backfill, persistence, dashboards, broker auth and the
//! REST/WebSocket transport are external collaborators: they produce this
//! engine's inputs (ticks, previous-day context, frequency counts) and
//! consume its output (per-symbol state snapshots) but contain no decision
//! logic of their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Tick-to-bar aggregation.
pub mod bars;

/// Configuration loading and validation.
pub mod config;

/// Decision manager state machine and per-symbol workers.
pub mod engine;

/// Tick sources (simulated random-walk feed).
pub mod feed;

/// Opening-range level computation.
pub mod levels;

/// Wire-level data types (ticks, plans).
pub mod models;

/// Paper order simulator.
pub mod oms;

/// Tiered frequency-based direction picking.
pub mod picker;

/// Fixed-budget position sizing.
pub mod risk;

/// Session state shared across workers.
pub mod session;

/// External state snapshot contract.
pub mod snapshot;

/// Time-locked context tags.
pub mod tags;

/// Tracing initialization.
pub mod telemetry;

pub use bars::{Bar, BarAggregator};
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use engine::{DecisionManager, ManagerConfig, SymbolWorker};
pub use levels::{ArmError, DayContext, LevelEngine, OpeningRange, PlanLevels};
pub use models::{Direction, Plan, PlanStatus, Tick, Tier};
pub use oms::{ExitReason, OrderSimulator, SyncEvent};
pub use picker::{FrequencyBook, Pick, Picker, PickerConfig, TierCounts};
pub use risk::RiskSizer;
pub use session::{AppState, KillSwitch};
pub use snapshot::SymbolSnapshot;
pub use tags::{TagLocker, TagSet};
