//! Configuration for the intraday engine.
//!
//! Configuration is read once per session from a YAML file, with
//! environment variable interpolation and a validation pass. Anything
//! malformed is startup-fatal and surfaces before the first tick is
//! processed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use intraday_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//! ```

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Checkpoints;
use crate::levels::DayContext;
use crate::picker::PickerConfig;

/// Configuration errors. All are startup-fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine parameters.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Session-clock checkpoint times.
    #[serde(default)]
    pub checkpoints: CheckpointsConfig,
    /// Traded symbols with their previous-day context.
    #[serde(default)]
    pub symbols: Vec<SymbolConfig>,
    /// Frequency-statistics input.
    #[serde(default)]
    pub stats: StatsConfig,
    /// Simulated feed parameters.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Core engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-trade risk budget in currency units.
    #[serde(default = "default_risk_budget")]
    pub risk_budget_rs: f64,
    /// Entry mode identifier, copied into every plan.
    #[serde(default = "default_entry_mode")]
    pub entry_mode: String,
    /// Bar width in seconds (production 300; simulations may go smaller).
    #[serde(default = "default_bar_width")]
    pub bar_width_secs: i64,
    /// Session-local clock offset from UTC, minutes (IST = 330).
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Minimum sample counts per tier `[L3, L2, L1, L0]`, decreasing.
    #[serde(default = "default_min_samples")]
    pub min_samples: [u32; 4],
    /// Minimum pick confidence, percent.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,
    /// Require the picked direction to agree with the opening trend.
    #[serde(default)]
    pub require_ot_alignment: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_budget_rs: default_risk_budget(),
            entry_mode: default_entry_mode(),
            bar_width_secs: default_bar_width(),
            utc_offset_minutes: 0,
            min_samples: default_min_samples(),
            min_confidence: default_min_confidence(),
            require_ot_alignment: false,
        }
    }
}

const fn default_risk_budget() -> f64 {
    1000.0
}
fn default_entry_mode() -> String {
    "orb-breakout".to_string()
}
const fn default_bar_width() -> i64 {
    300
}
const fn default_min_samples() -> [u32; 4] {
    [8, 6, 4, 2]
}
const fn default_min_confidence() -> u8 {
    55
}

/// Session-clock checkpoint times as `HH:MM:SS` strings.
///
/// Defaults follow a 09:15 cash-market open with 5-minute bars: the fifth
/// bar closes at 09:40, the plan arms right after, and everything flattens
/// before the 15:30 close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointsConfig {
    /// Previous-day-context lock.
    #[serde(default = "default_pdc_lock")]
    pub pdc_lock: String,
    /// Open-location lock.
    #[serde(default = "default_ol_lock")]
    pub ol_lock: String,
    /// Opening-trend / first-candle / range-status lock.
    #[serde(default = "default_ot_lock")]
    pub ot_lock: String,
    /// Plan arming.
    #[serde(default = "default_arm")]
    pub arm: String,
    /// End-of-day flatten.
    #[serde(default = "default_eod")]
    pub eod: String,
}

impl Default for CheckpointsConfig {
    fn default() -> Self {
        Self {
            pdc_lock: default_pdc_lock(),
            ol_lock: default_ol_lock(),
            ot_lock: default_ot_lock(),
            arm: default_arm(),
            eod: default_eod(),
        }
    }
}

fn default_pdc_lock() -> String {
    "09:16:00".to_string()
}
fn default_ol_lock() -> String {
    "09:18:00".to_string()
}
fn default_ot_lock() -> String {
    "09:41:00".to_string()
}
fn default_arm() -> String {
    "09:42:00".to_string()
}
fn default_eod() -> String {
    "15:12:00".to_string()
}

impl CheckpointsConfig {
    /// Parse into session-clock seconds.
    pub fn parse(&self) -> Result<Checkpoints, ConfigError> {
        Ok(Checkpoints {
            pdc_lock: parse_session_time("checkpoints.pdc_lock", &self.pdc_lock)?,
            ol_lock: parse_session_time("checkpoints.ol_lock", &self.ol_lock)?,
            ot_lock: parse_session_time("checkpoints.ot_lock", &self.ot_lock)?,
            arm: parse_session_time("checkpoints.arm", &self.arm)?,
            eod: parse_session_time("checkpoints.eod", &self.eod)?,
        })
    }
}

fn parse_session_time(field: &str, value: &str) -> Result<u32, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .map(|t| t.num_seconds_from_midnight())
        .map_err(|e| ConfigError::ValidationError(format!("{field}: '{value}' is not HH:MM:SS ({e})")))
}

/// One traded symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Ticker symbol.
    pub symbol: String,
    /// Previous-day OHLC from the (external) backfill. Optional: without
    /// it the day-context tags lock empty and the stop tie-break is
    /// skipped.
    #[serde(default)]
    pub prev_day: Option<PrevDayConfig>,
    /// Simulated-feed starting price override.
    #[serde(default)]
    pub start_price: Option<f64>,
}

/// Previous-day OHLC values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrevDayConfig {
    /// Previous-day open.
    pub open: f64,
    /// Previous-day high.
    pub high: f64,
    /// Previous-day low.
    pub low: f64,
    /// Previous-day close.
    pub close: f64,
}

impl PrevDayConfig {
    /// Convert to the engine's decimal day context.
    pub fn day_context(&self) -> Result<DayContext, ConfigError> {
        let convert = |name: &str, v: f64| {
            Decimal::try_from(v).map_err(|e| {
                ConfigError::ValidationError(format!("prev_day.{name}: {v} not representable ({e})"))
            })
        };
        Ok(DayContext {
            open: convert("open", self.open)?,
            high: convert("high", self.high)?,
            low: convert("low", self.low)?,
            close: convert("close", self.close)?,
        })
    }
}

/// Frequency-statistics input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Path to the frequency-counts JSON document. Absent means an empty
    /// book: every pick abstains.
    #[serde(default)]
    pub book_path: Option<String>,
}

/// Simulated feed parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Milliseconds between generated ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// RNG seed for reproducible runs.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Default starting price for symbols without an override.
    #[serde(default = "default_start_price")]
    pub start_price: f64,
    /// Per-tick move scale in basis points.
    #[serde(default = "default_volatility_bps")]
    pub volatility_bps: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            seed: default_seed(),
            start_price: default_start_price(),
            volatility_bps: default_volatility_bps(),
        }
    }
}

const fn default_tick_interval() -> u64 {
    500
}
const fn default_seed() -> u64 {
    7
}
const fn default_start_price() -> f64 {
    100.0
}
const fn default_volatility_bps() -> f64 {
    15.0
}

impl Config {
    /// Per-trade risk budget as a decimal.
    pub fn risk_budget(&self) -> Result<Decimal, ConfigError> {
        Decimal::try_from(self.engine.risk_budget_rs).map_err(|e| {
            ConfigError::ValidationError(format!(
                "engine.risk_budget_rs: {} not representable ({e})",
                self.engine.risk_budget_rs
            ))
        })
    }

    /// Picker gates derived from the engine section.
    #[must_use]
    pub fn picker_config(&self) -> PickerConfig {
        PickerConfig {
            min_samples: self.engine.min_samples,
            min_confidence: self.engine.min_confidence,
            require_ot_alignment: self.engine.require_ot_alignment,
        }
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable
/// interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or
/// validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    let interpolated = interpolate_env_vars(&contents);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    // Match ${VAR} or ${VAR:-default} patterns
    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let engine = &config.engine;

    if !engine.risk_budget_rs.is_finite() || engine.risk_budget_rs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "engine.risk_budget_rs must be a positive finite number".to_string(),
        ));
    }

    if engine.bar_width_secs < 1 {
        return Err(ConfigError::ValidationError(
            "engine.bar_width_secs must be at least 1".to_string(),
        ));
    }

    if engine.min_confidence > 100 {
        return Err(ConfigError::ValidationError(
            "engine.min_confidence must be between 0 and 100".to_string(),
        ));
    }

    // Sample thresholds must strictly decrease with tier coarseness.
    let s = engine.min_samples;
    if !(s[0] > s[1] && s[1] > s[2] && s[2] > s[3]) {
        return Err(ConfigError::ValidationError(format!(
            "engine.min_samples must be strictly decreasing, got {s:?}"
        )));
    }

    if engine.utc_offset_minutes.abs() > 14 * 60 {
        return Err(ConfigError::ValidationError(
            "engine.utc_offset_minutes must be within +/-14 hours".to_string(),
        ));
    }

    // Checkpoints must parse and be strictly ordered.
    let cp = config.checkpoints.parse()?;
    let sequence = [
        ("pdc_lock", cp.pdc_lock),
        ("ol_lock", cp.ol_lock),
        ("ot_lock", cp.ot_lock),
        ("arm", cp.arm),
        ("eod", cp.eod),
    ];
    for pair in sequence.windows(2) {
        if pair[0].1 >= pair[1].1 {
            return Err(ConfigError::ValidationError(format!(
                "checkpoints must be strictly increasing: {} >= {}",
                pair[0].0, pair[1].0
            )));
        }
    }

    // Symbols must be unique with sane previous-day context.
    let mut seen = std::collections::HashSet::new();
    for sym in &config.symbols {
        if sym.symbol.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "symbols[].symbol must not be empty".to_string(),
            ));
        }
        if !seen.insert(sym.symbol.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate symbol '{}'",
                sym.symbol
            )));
        }
        if let Some(day) = &sym.prev_day {
            for (name, v) in [
                ("open", day.open),
                ("high", day.high),
                ("low", day.low),
                ("close", day.close),
            ] {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "symbol '{}' prev_day.{name} must be a positive finite number",
                        sym.symbol
                    )));
                }
            }
            if day.high < day.low {
                return Err(ConfigError::ValidationError(format!(
                    "symbol '{}' prev_day.high must be >= prev_day.low",
                    sym.symbol
                )));
            }
        }
        if let Some(px) = sym.start_price
            && (!px.is_finite() || px <= 0.0)
        {
            return Err(ConfigError::ValidationError(format!(
                "symbol '{}' start_price must be a positive finite number",
                sym.symbol
            )));
        }
    }

    let feed = &config.feed;
    if feed.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "feed.tick_interval_ms must be at least 1".to_string(),
        ));
    }
    if !feed.start_price.is_finite() || feed.start_price <= 0.0 {
        return Err(ConfigError::ValidationError(
            "feed.start_price must be a positive finite number".to_string(),
        ));
    }
    if !feed.volatility_bps.is_finite() || feed.volatility_bps < 0.0 {
        return Err(ConfigError::ValidationError(
            "feed.volatility_bps must be a non-negative finite number".to_string(),
        ));
    }

    Ok(())
}
