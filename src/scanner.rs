// =============================================================================
// Scanner — per-symbol fetch, compute, alert cycle
// =============================================================================
//
// One cycle per symbol: fetch klines, validate into a CandleSeries, run the
// indicator engine, publish the report, and raise alerts for rules that fired
// on the newest bar. A failure for one symbol is logged and recorded but never
// aborts the cycle for the others.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::app_state::{AlertRecord, AppState, ScanReport, REPORT_TAIL_LEN};
use crate::binance::BinanceFuturesClient;
use crate::indicators::IndicatorEngine;
use crate::market_data::CandleSeries;
use crate::notify::{format_alert, LineNotifier};

pub struct Scanner {
    state: Arc<AppState>,
    client: BinanceFuturesClient,
    notifier: LineNotifier,
}

impl Scanner {
    pub fn new(state: Arc<AppState>, client: BinanceFuturesClient, notifier: LineNotifier) -> Self {
        Self {
            state,
            client,
            notifier,
        }
    }

    /// Run scan cycles forever, one every `scan_interval_secs`.
    pub async fn run(self) {
        let interval_secs = self.state.runtime_config.read().scan_interval_secs;
        let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));

        info!(interval_secs, "scan loop starting");
        loop {
            ticker.tick().await;
            self.scan_cycle().await;
        }
    }

    /// Scan every configured symbol once.
    pub async fn scan_cycle(&self) {
        let symbols = self.state.runtime_config.read().symbols.clone();

        for symbol in &symbols {
            if let Err(e) = self.scan_symbol(symbol).await {
                warn!(symbol = %symbol, error = %e, "scan failed for symbol");
                self.state.push_error(format!("{symbol}: {e:#}"));
            }
        }
    }

    /// Fetch, compute and alert for a single symbol.
    async fn scan_symbol(&self, symbol: &str) -> Result<()> {
        let (interval, limit) = {
            let config = self.state.runtime_config.read();
            (config.interval.clone(), config.kline_limit)
        };

        let candles = self
            .client
            .get_klines(symbol, &interval, limit)
            .await
            .with_context(|| format!("kline fetch for {symbol}"))?;

        let series = CandleSeries::new(symbol, &interval, candles)
            .context("exchange returned a malformed candle batch")?;

        let engine = IndicatorEngine::new(self.state.runtime_config.read().signal_params.clone());
        let computed = engine.compute(&series);

        debug!(
            symbol,
            candles = computed.len(),
            "indicator series computed"
        );

        let tail_start = computed.len().saturating_sub(REPORT_TAIL_LEN);
        let report = ScanReport {
            symbol: symbol.to_string(),
            interval: interval.clone(),
            series_len: computed.len(),
            tail: computed.points()[tail_start..].to_vec(),
            scanned_at: Utc::now().to_rfc3339(),
        };

        if let Some(latest) = computed.latest() {
            for rule in latest.flags.triggered() {
                if !self
                    .state
                    .should_alert(symbol, rule, latest.candle.open_time)
                {
                    debug!(symbol, rule = %rule, "alert already raised for this bar");
                    continue;
                }

                let message = format_alert(symbol, rule, latest);
                self.state.push_alert(AlertRecord::new(
                    symbol,
                    rule,
                    latest.candle.open_time,
                    message.clone(),
                ));

                if self.state.runtime_config.read().notifications_enabled {
                    if let Err(e) = self.notifier.send(&message).await {
                        warn!(symbol, rule = %rule, error = %e, "alert delivery failed");
                        self.state.push_error(format!("notify {symbol}/{rule}: {e:#}"));
                    }
                } else {
                    info!(symbol, rule = %rule, "notifications disabled — alert recorded only");
                }
            }
        }

        self.state.store_report(report);
        Ok(())
    }
}
