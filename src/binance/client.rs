// =============================================================================
// Binance Futures REST Client — public kline endpoint
// =============================================================================
//
// The scanner only needs public market data, so there are no signed requests.
// An API key, when configured, is still sent via X-MBX-APIKEY: keyed requests
// get a higher request-weight allowance from Binance.
//
// Kline open times come back in UTC milliseconds; they are shifted by the
// configured offset here so that every consumer downstream (engine, alerts,
// API) sees timestamps in the deployment's local convention.
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::market_data::Candle;

const FUTURES_BASE_URL: &str = "https://fapi.binance.com";

/// Binance USDⓈ-M futures REST client. The API key, when provided, lives
/// only inside the client's default headers.
#[derive(Clone)]
pub struct BinanceFuturesClient {
    base_url: String,
    utc_offset: Duration,
    client: reqwest::Client,
}

impl BinanceFuturesClient {
    /// Create a new client. `api_key` may be empty (all endpoints used here
    /// are public); `utc_offset_hours` shifts kline open times before the
    /// candles are handed to the rest of the system.
    pub fn new(api_key: impl Into<String>, utc_offset_hours: i64) -> Self {
        let api_key = api_key.into();

        let mut default_headers = HeaderMap::new();
        if !api_key.is_empty() {
            if let Ok(val) = HeaderValue::from_str(&api_key) {
                default_headers.insert("X-MBX-APIKEY", val);
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!(base_url = FUTURES_BASE_URL, "BinanceFuturesClient initialised");

        Self {
            base_url: FUTURES_BASE_URL.to_string(),
            utc_offset: Duration::hours(utc_offset_hours),
            client,
        }
    }

    /// GET /fapi/v1/klines (public).
    ///
    /// Returns closed-plus-current candles parsed from Binance's
    /// array-of-arrays response format, oldest first.
    ///
    /// Array indices:
    ///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
    ///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades,
    ///   [9] takerBuyBaseVolume, [10] takerBuyQuoteVolume
    #[instrument(skip(self), name = "binance::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /fapi/v1/klines request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("Binance GET /fapi/v1/klines returned {}: {}", status, body);
        }

        let raw = body.as_array().context("klines response is not an array")?;

        let mut candles = Vec::with_capacity(raw.len());

        for entry in raw {
            if let Some(candle) = parse_kline_entry(entry, self.utc_offset)? {
                candles.push(candle);
            }
        }

        debug!(symbol, interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }
}

/// Map one kline entry (the array-of-values form documented above) to a
/// [`Candle`], shifting `openTime` by `utc_offset`.
///
/// Entries with fewer than the 11 documented elements are skipped with a
/// warning (`Ok(None)`); a structurally wrong entry is an error.
fn parse_kline_entry(
    entry: &serde_json::Value,
    utc_offset: Duration,
) -> Result<Option<Candle>> {
    let arr = entry.as_array().context("kline entry is not an array")?;

    if arr.len() < 11 {
        warn!("skipping malformed kline entry with {} elements", arr.len());
        return Ok(None);
    }

    let open_time_ms = arr[0].as_i64().context("kline openTime is not an integer")?;
    let open_time = parse_open_time(open_time_ms)? + utc_offset;

    Ok(Some(Candle {
        open_time,
        open: parse_str_f64(&arr[1])?,
        high: parse_str_f64(&arr[2])?,
        low: parse_str_f64(&arr[3])?,
        close: parse_str_f64(&arr[4])?,
        volume: parse_str_f64(&arr[5])?,
    }))
}

/// Convert an exchange millisecond timestamp to a `DateTime<Utc>`.
fn parse_open_time(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .with_context(|| format!("kline openTime {ms} out of range"))
}

/// Parse a JSON value that may be either a string or a number into `f64`.
/// Binance sends kline prices and volumes as JSON strings.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

impl std::fmt::Debug for BinanceFuturesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceFuturesClient")
            .field("base_url", &self.base_url)
            .field("utc_offset", &self.utc_offset)
            .finish()
    }
}
