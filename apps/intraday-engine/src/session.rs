//! Session-wide shared state.
//!
//! The session object is constructed once in `main` and handed to every
//! worker at construction - there is no process-wide mutable singleton.
//! Workers own their symbol state exclusively; the only shared pieces are
//! the read-only risk budget/entry mode, the kill switch, and the snapshot
//! registry the transport layer reads.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use tokio::sync::{RwLock, watch};

use crate::snapshot::SymbolSnapshot;

/// Session kill switch.
///
/// Tripping it force-flattens every open order and stops new entries;
/// terminal states are never rolled back. The flag is readable from any
/// worker and writable from any control surface.
#[derive(Debug, Clone)]
pub struct KillSwitch {
    inner: Arc<KillSwitchInner>,
}

#[derive(Debug)]
struct KillSwitchInner {
    tripped: AtomicBool,
    tx: watch::Sender<bool>,
}

impl KillSwitch {
    /// A fresh, untripped switch.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(KillSwitchInner {
                tripped: AtomicBool::new(false),
                tx,
            }),
        }
    }

    /// Trip the switch. Idempotent.
    pub fn trip(&self) {
        if !self.inner.tripped.swap(true, Ordering::SeqCst) {
            tracing::warn!("kill switch tripped");
            let _ = self.inner.tx.send(true);
        }
    }

    /// Whether the switch has been tripped.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }

    /// Subscribe for async notification of the trip.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.tx.subscribe()
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide session registry.
#[derive(Debug)]
pub struct AppState {
    /// Per-trade risk budget in currency units, read-only for workers.
    pub risk_budget_rs: Decimal,
    /// Entry mode identifier, read-only for workers.
    pub entry_mode: String,
    kill: KillSwitch,
    snapshots: RwLock<HashMap<String, SymbolSnapshot>>,
}

/// Convenience alias for the shared session handle.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create the session state.
    #[must_use]
    pub fn new(risk_budget_rs: Decimal, entry_mode: impl Into<String>) -> Self {
        Self {
            risk_budget_rs,
            entry_mode: entry_mode.into(),
            kill: KillSwitch::new(),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// The session kill switch.
    #[must_use]
    pub const fn kill_switch(&self) -> &KillSwitch {
        &self.kill
    }

    /// Publish a symbol's snapshot. Called only by that symbol's worker.
    pub async fn publish(&self, snapshot: SymbolSnapshot) {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.symbol.clone(), snapshot);
    }

    /// The latest snapshot for one symbol.
    pub async fn snapshot_of(&self, symbol: &str) -> Option<SymbolSnapshot> {
        let snapshots = self.snapshots.read().await;
        snapshots.get(symbol).cloned()
    }

    /// All current snapshots, in symbol order.
    pub async fn all_snapshots(&self) -> Vec<SymbolSnapshot> {
        let snapshots = self.snapshots.read().await;
        let mut all: Vec<SymbolSnapshot> = snapshots.values().cloned().collect();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        all
    }
}
