// =============================================================================
// Runtime Configuration — scanner settings with atomic save
// =============================================================================
//
// Central configuration for the Nadir reversal scanner. Persistence uses an
// atomic tmp + rename pattern to prevent corruption on crash. All fields
// carry `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::signals::SignalParams;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "XRPUSDT".to_string()]
}

fn default_interval() -> String {
    "12h".to_string()
}

fn default_kline_limit() -> u32 {
    200
}

fn default_scan_interval_secs() -> u64 {
    300
}

fn default_utc_offset_hours() -> i64 {
    9
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Perpetual futures symbols to scan.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Candle interval the rules are defined on.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// How many klines to request per scan. Must comfortably exceed the
    /// volume baseline window (120) for the explosion flag to be defined.
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,

    /// Seconds between scan cycles.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Hours added to exchange UTC open times before display/alerting
    /// (the original deployment ran on KST, UTC+9).
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i64,

    /// Master switch for outbound alert delivery.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Indicator periods and rule thresholds.
    #[serde(default)]
    pub signal_params: SignalParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            interval: default_interval(),
            kline_limit: default_kline_limit(),
            scan_interval_secs: default_scan_interval_secs(),
            utc_offset_hours: default_utc_offset_hours(),
            notifications_enabled: true,
            signal_params: SignalParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            interval = %config.interval,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
