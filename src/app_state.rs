// =============================================================================
// Central Application State — Nadir Reversal Scanner
// =============================================================================
//
// The single source of truth shared between the scan loop and the status API.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::indicators::IndicatorPoint;
use crate::runtime_config::RuntimeConfig;
use crate::types::SignalKind;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;
/// Maximum number of recent alerts to retain.
const MAX_RECENT_ALERTS: usize = 100;
/// How many trailing indicator points a scan report keeps for the API.
pub const REPORT_TAIL_LEN: usize = 5;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the status API error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Auditable record of one delivered (or log-only) alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    /// Unique identifier for this alert (UUID v4).
    pub id: String,
    pub symbol: String,
    pub rule: SignalKind,
    /// Open time of the bar that fired the rule.
    pub bar_open_time: DateTime<Utc>,
    /// The exact message handed to the notifier.
    pub message: String,
    /// ISO 8601 timestamp of when the alert was raised.
    pub created_at: String,
}

impl AlertRecord {
    pub fn new(
        symbol: impl Into<String>,
        rule: SignalKind,
        bar_open_time: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            rule,
            bar_open_time,
            message: message.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of one scan cycle for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub symbol: String,
    pub interval: String,
    /// Total candles the engine saw this cycle.
    pub series_len: usize,
    /// The trailing points, newest last (mirrors a dashboard "tail" view).
    pub tail: Vec<IndicatorPoint>,
    /// ISO 8601 timestamp of the scan.
    pub scanned_at: String,
}

impl ScanReport {
    /// The latest point — where the rule verdicts live.
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.tail.last()
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation so API consumers can detect changes.
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    /// Latest scan report per symbol.
    pub reports: RwLock<HashMap<String, ScanReport>>,

    /// Capped alert audit trail, newest last.
    pub recent_alerts: RwLock<Vec<AlertRecord>>,

    /// Capped error log, newest last.
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Bar open time of the most recent alert per (symbol, rule); a bar that
    /// already alerted never alerts again across later scan cycles.
    last_alerted: RwLock<HashMap<(String, SignalKind), DateTime<Utc>>>,

    pub last_scan_ok: RwLock<Option<std::time::Instant>>,

    /// Instant when the scanner was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            reports: RwLock::new(HashMap::new()),
            recent_alerts: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            last_alerted: RwLock::new(HashMap::new()),
            last_scan_ok: RwLock::new(None),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Scan results ────────────────────────────────────────────────────

    /// Store the latest report for a symbol, replacing any previous one.
    pub fn store_report(&self, report: ScanReport) {
        self.reports.write().insert(report.symbol.clone(), report);
        *self.last_scan_ok.write() = Some(std::time::Instant::now());
        self.increment_version();
    }

    // ── Alert de-duplication ────────────────────────────────────────────

    /// Whether `(symbol, rule)` should alert for the bar at `bar_open_time`.
    /// Returns true (and records the bar) only the first time a given bar
    /// fires a given rule; re-scans of the same bar stay silent.
    pub fn should_alert(
        &self,
        symbol: &str,
        rule: SignalKind,
        bar_open_time: DateTime<Utc>,
    ) -> bool {
        let key = (symbol.to_string(), rule);
        let mut last = self.last_alerted.write();
        match last.get(&key) {
            Some(seen) if *seen >= bar_open_time => false,
            _ => {
                last.insert(key, bar_open_time);
                true
            }
        }
    }

    /// Record an alert. The buffer is capped at [`MAX_RECENT_ALERTS`];
    /// oldest entries are evicted when the limit is reached.
    pub fn push_alert(&self, alert: AlertRecord) {
        let mut alerts = self.recent_alerts.write();
        alerts.push(alert);
        while alerts.len() > MAX_RECENT_ALERTS {
            alerts.remove(0);
        }
        self.increment_version();
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the scanner state. This is
    /// the payload behind `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();

        let mut reports: Vec<ScanReport> = self.reports.read().values().cloned().collect();
        reports.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            last_scan_age_s: self.last_scan_ok.read().map(|t| t.elapsed().as_secs()),
            symbols: config.symbols.clone(),
            interval: config.interval.clone(),
            scan_interval_secs: config.scan_interval_secs,
            notifications_enabled: config.notifications_enabled,
            reports,
            recent_alerts: self.recent_alerts.read().clone(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable snapshot
// =============================================================================

/// Full scanner state snapshot for the status API.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub last_scan_age_s: Option<u64>,
    pub symbols: Vec<String>,
    pub interval: String,
    pub scan_interval_secs: u64,
    pub notifications_enabled: bool,
    pub reports: Vec<ScanReport>,
    pub recent_alerts: Vec<AlertRecord>,
    pub recent_errors: Vec<ErrorRecord>,
}
