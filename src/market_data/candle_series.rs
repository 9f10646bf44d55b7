// =============================================================================
// Candle data model — validated OHLCV series per (symbol, interval)
// =============================================================================
//
// A `CandleSeries` is the only input the indicator engine accepts. All
// structural invariants (strictly increasing timestamps, prices positive and
// finite, volume non-negative and finite) are enforced once at construction,
// so downstream computation never has to re-check or partially fail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Candle
// ---------------------------------------------------------------------------

/// A single closed OHLCV candle. `open_time` is already shifted to the
/// consumer's expected time zone by whoever fetched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Rejection reasons for a malformed candle batch. Raised once, at
/// [`CandleSeries::new`]; a constructed series is always well-formed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("candle {index}: open_time {current} is not after previous {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("candle {index}: {field} = {value} is outside its valid domain")]
    FieldOutOfDomain {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// CandleSeries
// ---------------------------------------------------------------------------

/// An ordered, immutable batch of candles for a single (symbol, interval).
///
/// Zero-length series are valid -- exchanges return short histories for new
/// listings, and the engine degrades to undefined outputs rather than erroring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    symbol: String,
    interval: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate and wrap a candle batch.
    ///
    /// Checks, in order per candle:
    /// * `open`, `high`, `low`, `close` are finite and strictly positive
    /// * `volume` is finite and non-negative
    /// * `open_time` is strictly greater than the previous candle's
    ///
    /// The first violation is returned and no series is produced.
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        candles: Vec<Candle>,
    ) -> Result<Self, InvalidInput> {
        for (index, candle) in candles.iter().enumerate() {
            for (field, value) in [
                ("open", candle.open),
                ("high", candle.high),
                ("low", candle.low),
                ("close", candle.close),
            ] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(InvalidInput::FieldOutOfDomain {
                        index,
                        field,
                        value,
                    });
                }
            }

            if !candle.volume.is_finite() || candle.volume < 0.0 {
                return Err(InvalidInput::FieldOutOfDomain {
                    index,
                    field: "volume",
                    value: candle.volume,
                });
            }

            if index > 0 {
                let previous = candles[index - 1].open_time;
                if candle.open_time <= previous {
                    return Err(InvalidInput::NonMonotonicTimestamp {
                        index,
                        previous,
                        current: candle.open_time,
                    });
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            interval: interval.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// A copy of this series truncated to its first `n` candles. Truncation
    /// preserves every invariant, so no re-validation is needed.
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            symbol: self.symbol.clone(),
            interval: self.interval.clone(),
            candles: self.candles[..n.min(self.candles.len())].to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
