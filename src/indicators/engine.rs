// =============================================================================
// Indicator Engine — full derivation pipeline over a candle series
// =============================================================================
//
// One batch pass per call, no hidden state, no I/O. Stages run in dependency
// order and every stage is causal: the value at index i derives from indices
// 0..=i only. Insufficient history shows up as `None` fields and false flags,
// never as an error — a `CandleSeries` is already validated at construction,
// so `compute` cannot fail.
//
// Stage order:
//   closes  -> RSI (Wilder, rsi_period)
//   RSI     -> StochRSI (stoch_window min/max) -> K (k_smoothing SMA)
//   volumes -> rolling baseline (volume_window) -> explosive flag
//   all     -> rule flags (b_low / r_low / t_low)

use serde::Serialize;

use crate::indicators::{rsi, stoch_rsi, volume};
use crate::market_data::{Candle, CandleSeries};
use crate::signals::{RuleFlags, SignalParams};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One candle together with every value derived from it. Fields are `None`
/// while the corresponding look-back window is still filling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    #[serde(flatten)]
    pub candle: Candle,

    pub rsi: Option<f64>,
    pub stochrsi_k: Option<f64>,
    pub vol_avg: Option<f64>,
    pub vol_explosive: bool,

    #[serde(flatten)]
    pub flags: RuleFlags,
}

/// The engine's output: same length and order as the input series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    symbol: String,
    interval: String,
    points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn points(&self) -> &[IndicatorPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent point — the one the rule verdicts are read from.
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }
}

// ---------------------------------------------------------------------------
// IndicatorEngine
// ---------------------------------------------------------------------------

/// Batch indicator computer. Holds only the tunable parameters; every
/// `compute` call is independent and deterministic, so one engine may serve
/// any number of symbols concurrently.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: SignalParams,
}

impl IndicatorEngine {
    pub fn new(params: SignalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SignalParams {
        &self.params
    }

    /// Derive the full indicator series for `series`.
    ///
    /// The output has exactly one [`IndicatorPoint`] per input candle, in the
    /// same order. Short series (including empty ones) are fine: the derived
    /// fields just stay `None` and the flags false.
    pub fn compute(&self, series: &CandleSeries) -> IndicatorSeries {
        let candles = series.candles();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        let rsi = rsi::wilder_rsi(&closes, self.params.rsi_period);
        let stoch = stoch_rsi::stoch_rsi(&rsi, self.params.stoch_window);
        let k = stoch_rsi::smooth_k(&stoch, self.params.k_smoothing);
        let vol_avg = volume::rolling_mean(&volumes, self.params.volume_window);

        let points = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let vol_explosive = volume::is_explosive(
                    candle.volume,
                    vol_avg[i],
                    self.params.volume_multiplier,
                );
                let flags =
                    RuleFlags::evaluate(rsi[i], k[i], vol_explosive, &self.params);

                IndicatorPoint {
                    candle: candle.clone(),
                    rsi: rsi[i],
                    stochrsi_k: k[i],
                    vol_avg: vol_avg[i],
                    vol_explosive,
                    flags,
                }
            })
            .collect();

        IndicatorSeries {
            symbol: series.symbol().to_string(),
            interval: series.interval().to_string(),
            points,
        }
    }
}

// =============================================================================
// Tests — end-to-end properties of the whole pipeline
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(closes: &[f64], volumes: &[f64]) -> CandleSeries {
        assert_eq!(closes.len(), volumes.len());
        let candles = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| Candle {
                open_time: Utc
                    .timestamp_opt(1_700_000_000 + i as i64 * 43_200, 0)
                    .unwrap(),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume,
            })
            .collect();
        CandleSeries::new("BTCUSDT", "12h", candles).unwrap()
    }

    fn engine() -> IndicatorEngine {
        IndicatorEngine::default()
    }

    #[test]
    fn empty_series_yields_empty_output() {
        let out = engine().compute(&series(&[], &[]));
        assert!(out.is_empty());
        assert!(out.latest().is_none());
        assert_eq!(out.symbol(), "BTCUSDT");
    }

    #[test]
    fn short_history_has_no_rsi_and_no_flags() {
        // Fewer than 15 candles: every rsi is None, every flag false.
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let volumes = vec![10.0; 14];
        let out = engine().compute(&series(&closes, &volumes));

        assert_eq!(out.len(), 14);
        for p in out.points() {
            assert!(p.rsi.is_none());
            assert!(p.stochrsi_k.is_none());
            assert!(p.vol_avg.is_none());
            assert!(!p.vol_explosive);
            assert!(!p.flags.any());
        }
    }

    #[test]
    fn field_definition_boundaries() {
        // RSI first at 14; StochRSI needs 14 defined RSI values (first at 27);
        // K needs 3 consecutive StochRSI values (first at 29); the volume
        // baseline needs a full 120-bar window (first at 119).
        let n = 130;
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let volumes = vec![10.0; n];
        let out = engine().compute(&series(&closes, &volumes));

        let points = out.points();
        assert!(points[13].rsi.is_none());
        assert!(points[14].rsi.is_some());
        assert!(points[28].stochrsi_k.is_none());
        assert!(points[29].stochrsi_k.is_some());
        assert!(points[118].vol_avg.is_none());
        assert!(points[119].vol_avg.is_some());
    }

    #[test]
    fn constant_volume_is_never_explosive() {
        let n = 150;
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.3).cos()).collect();
        let volumes = vec![42.0; n];
        let out = engine().compute(&series(&closes, &volumes));

        for p in out.points() {
            assert!(!p.vol_explosive);
        }
    }

    #[test]
    fn compute_is_deterministic() {
        let n = 140;
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 1.3).sin() * 5.0).collect();
        let volumes: Vec<f64> = (0..n).map(|i| 10.0 + (i % 7) as f64).collect();
        let s = series(&closes, &volumes);

        let eng = engine();
        assert_eq!(eng.compute(&s), eng.compute(&s));
    }

    #[test]
    fn compute_is_causal() {
        // The first n output points must not change when future candles are
        // dropped — no stage may look ahead.
        let total = 140;
        let closes: Vec<f64> = (0..total)
            .map(|i| 100.0 + (i as f64 * 0.9).sin() * 8.0)
            .collect();
        let volumes: Vec<f64> = (0..total).map(|i| 10.0 + (i % 11) as f64 * 3.0).collect();
        let full = series(&closes, &volumes);

        let eng = engine();
        let full_out = eng.compute(&full);

        for n in [0, 1, 14, 15, 29, 30, 119, 120, 139] {
            let head_out = eng.compute(&full.truncated(n));
            assert_eq!(head_out.points(), &full_out.points()[..n], "prefix {n}");
        }
    }

    #[test]
    fn flat_closes_give_zero_stoch_rsi() {
        // Enough history to establish RSI, then a fully flat stretch: the
        // RSI window goes flat, StochRSI must be 0, not NaN.
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend(std::iter::repeat(109.0).take(40));
        let volumes = vec![10.0; closes.len()];
        let out = engine().compute(&series(&closes, &volumes));

        let last = out.latest().unwrap();
        let k = last.stochrsi_k.unwrap();
        assert!(k.is_finite());
        assert!(k.abs() < 1e-10, "expected 0.0, got {k}");
    }

    #[test]
    fn downtrend_with_volume_spike_fires_b_low() {
        // 150 bars: sideways, then 20 strictly falling closes, and a single
        // 5x volume spike on the final bar.
        let n = 150;
        let mut closes: Vec<f64> = (0..n - 20).map(|i| 100.0 + (i % 3) as f64 * 0.1).collect();
        let mut price = 100.0;
        for _ in 0..20 {
            price -= 2.0;
            closes.push(price);
        }
        let mut volumes = vec![10.0; n - 1];
        volumes.push(50.0);

        let out = engine().compute(&series(&closes, &volumes));
        let last = out.latest().unwrap();

        let rsi = last.rsi.unwrap();
        assert!(rsi < 25.0, "rsi = {rsi}");
        assert!(last.vol_explosive);

        let k = last.stochrsi_k.unwrap();
        assert!(k < 5.0, "k = {k}");
        assert!(last.flags.b_low);
        // A 20-bar relentless slide also drags RSI under the stricter caps.
        assert!(last.flags.r_low);
        assert!(last.flags.t_low);
    }

    #[test]
    fn output_length_always_matches_input() {
        for n in [0, 1, 5, 14, 15, 30, 119, 120, 121] {
            let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 0.1).collect();
            let volumes = vec![10.0; n];
            let out = engine().compute(&series(&closes, &volumes));
            assert_eq!(out.len(), n);
        }
    }
}
