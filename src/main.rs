// =============================================================================
// Nadir Reversal Scanner — Main Entry Point
// =============================================================================
//
// Watches perpetual futures candles for oversold-reversal setups (b_low /
// r_low / t_low) and raises alerts when a rule fires on the newest closed bar.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod binance;
mod indicators;
mod market_data;
mod notify;
mod runtime_config;
mod scanner;
mod signals;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::binance::BinanceFuturesClient;
use crate::notify::LineNotifier;
use crate::runtime_config::RuntimeConfig;
use crate::scanner::Scanner;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Nadir Reversal Scanner — starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override symbols from env if available.
    if let Ok(syms) = std::env::var("NADIR_SYMBOLS") {
        config.symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if config.symbols.is_empty() {
        config.symbols = vec!["BTCUSDT".into(), "XRPUSDT".into()];
    }

    info!(
        symbols = ?config.symbols,
        interval = %config.interval,
        scan_interval_secs = config.scan_interval_secs,
        "scanner configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let utc_offset_hours = config.utc_offset_hours;
    let state = Arc::new(AppState::new(config));

    // ── 3. Exchange client & notifier ────────────────────────────────────
    let api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
    let client = BinanceFuturesClient::new(api_key, utc_offset_hours);
    let notifier = LineNotifier::from_env();

    // ── 4. Start the status API ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr = std::env::var("NADIR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr, "API server listening");
        axum::serve(listener, app).await.expect("API server failed");
    });

    // ── 5. Scan loop ─────────────────────────────────────────────────────
    let scan_state = state.clone();
    tokio::spawn(async move {
        Scanner::new(scan_state, client, notifier).run().await;
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Nadir Reversal Scanner shut down complete.");
    Ok(())
}
