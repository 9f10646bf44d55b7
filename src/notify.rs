// =============================================================================
// Alert delivery — LINE Notify sink
// =============================================================================
//
// Outbound notification is deliberately dumb: it takes a finished message
// string and posts it. Message composition lives with the scanner, transport
// lives here, and neither knows about the other's internals.
//
// When no endpoint/token is configured the notifier still "delivers" by
// logging the message at info level, so a keyless deployment stays useful.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::indicators::IndicatorPoint;
use crate::types::SignalKind;

/// LINE Notify-style sink: POST with a Bearer token and a `message` form
/// field.
pub struct LineNotifier {
    endpoint: Option<(String, String)>, // (url, token)
    client: reqwest::Client,
}

impl LineNotifier {
    /// Build a notifier from optional endpoint configuration. Either value
    /// missing or empty means log-only mode.
    pub fn new(url: Option<String>, token: Option<String>) -> Self {
        let endpoint = match (url, token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some((url, token))
            }
            _ => {
                warn!("LINE endpoint not configured — alerts will only be logged");
                None
            }
        };

        Self {
            endpoint,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to build reqwest client for LineNotifier"),
        }
    }

    /// Read `LINE_URL` / `LINE_TOKEN` from the environment.
    pub fn from_env() -> Self {
        Self::new(std::env::var("LINE_URL").ok(), std::env::var("LINE_TOKEN").ok())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Deliver one message. In log-only mode this always succeeds.
    pub async fn send(&self, message: &str) -> Result<()> {
        info!(message, "alert");

        let Some((url, token)) = &self.endpoint else {
            return Ok(());
        };

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .form(&[("message", message)])
            .send()
            .await
            .context("POST to LINE endpoint failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("LINE endpoint returned {status}: {body}");
        }

        debug!("alert delivered");
        Ok(())
    }
}

/// Compose the alert text for one fired rule.
///
/// Includes the bar's open time and the indicator values the rule was judged
/// on, so the receiving human can sanity-check without opening the dashboard.
pub fn format_alert(symbol: &str, kind: SignalKind, point: &IndicatorPoint) -> String {
    let rsi = point
        .rsi
        .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    let k = point
        .stochrsi_k
        .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

    format!(
        "[{symbol}] {kind} triggered ({desc}) | bar {bar} close {close} rsi {rsi} k {k} vol_explosive {explosive}",
        desc = kind.description(),
        bar = point.candle.open_time.format("%Y-%m-%d %H:%M"),
        close = point.candle.close,
        explosive = point.vol_explosive,
    )
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Candle;
    use crate::signals::RuleFlags;
    use chrono::{TimeZone, Utc};

    fn point() -> IndicatorPoint {
        IndicatorPoint {
            candle: Candle {
                open_time: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 95.0,
                close: 96.5,
                volume: 1234.0,
            },
            rsi: Some(12.3456),
            stochrsi_k: Some(0.789),
            vol_avg: Some(400.0),
            vol_explosive: true,
            flags: RuleFlags {
                b_low: true,
                r_low: true,
                t_low: true,
            },
        }
    }

    #[test]
    fn unconfigured_notifier_is_log_only() {
        let notifier = LineNotifier::new(None, None);
        assert!(!notifier.is_configured());

        let notifier = LineNotifier::new(Some("".into()), Some("tok".into()));
        assert!(!notifier.is_configured());
    }

    #[test]
    fn configured_notifier_keeps_endpoint() {
        let notifier =
            LineNotifier::new(Some("https://example.test/notify".into()), Some("tok".into()));
        assert!(notifier.is_configured());
    }

    #[test]
    fn alert_text_names_symbol_rule_and_values() {
        let msg = format_alert("BTCUSDT", SignalKind::BLow, &point());
        assert!(msg.contains("[BTCUSDT]"));
        assert!(msg.contains("b_low"));
        assert!(msg.contains("rsi 12.35"));
        assert!(msg.contains("k 0.79"));
        assert!(msg.contains("vol_explosive true"));
        assert!(msg.contains("2024-03-01 09:00"));
    }

    #[test]
    fn alert_text_handles_undefined_fields() {
        let mut p = point();
        p.rsi = None;
        p.stochrsi_k = None;
        let msg = format_alert("XRPUSDT", SignalKind::RLow, &p);
        assert!(msg.contains("rsi -"));
        assert!(msg.contains("k -"));
    }
}
