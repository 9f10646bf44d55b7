// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// The output is aligned 1:1 with the input: `out[i]` is the RSI of `closes[i]`
// or `None` while the look-back is still filling. The first defined value sits
// at index `period` (the seed needs `period` deltas).

/// Compute the full aligned RSI series for the given `closes` and `period`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - Fewer than `period + 1` closes => all `None`
/// - Average loss zero with gains present => RSI = 100.0
/// - Both averages zero (flat market) => RSI = 50.0
pub fn wilder_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed averages with the SMA of the first `period` deltas.
    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // Wilder's smoothing for all subsequent closes.
    for (offset, &delta) in deltas[period..].iter().enumerate() {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        out[period + 1 + offset] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    out
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// The zero-division cases are fixed explicitly rather than left to
/// floating-point NaN:
/// - both averages zero => 50.0 (flat market, neutral)
/// - average loss zero  => 100.0 (only gains)
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
