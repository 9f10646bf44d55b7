// =============================================================================
// Stochastic RSI — RSI normalized within its own recent range
// =============================================================================
//
// StochRSI re-scales RSI to where it sits inside its trailing min/max window:
//
//   stochrsi = (rsi - min(rsi, window)) / (max(rsi, window) - min(rsi, window)) * 100
//
// The raw line is noisy, so consumers read the K line: a short SMA of StochRSI.
// Both functions operate on aligned `Option` series and stay causal — index i
// only ever looks at indices <= i.

/// Compute the aligned StochRSI series from an aligned RSI series.
///
/// `out[i]` is defined only when the RSI is defined at `i` and at all
/// `window - 1` preceding indices. A flat RSI window (max == min) yields 0.0
/// rather than a division by zero.
pub fn stoch_rsi(rsi: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; rsi.len()];
    if window == 0 {
        return out;
    }

    for i in (window - 1)..rsi.len() {
        let trailing = &rsi[i + 1 - window..=i];
        if trailing.iter().any(Option::is_none) {
            continue;
        }

        let current = rsi[i].unwrap();
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for v in trailing.iter().flatten() {
            lowest = lowest.min(*v);
            highest = highest.max(*v);
        }

        let value = if highest == lowest {
            0.0
        } else {
            (current - lowest) / (highest - lowest) * 100.0
        };
        out[i] = Some(value);
    }

    out
}

/// Smooth a StochRSI series into its K line: an `n`-period simple moving
/// average, defined only where `n` consecutive inputs are defined.
pub fn smooth_k(stoch: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; stoch.len()];
    if n == 0 {
        return out;
    }

    for i in (n - 1)..stoch.len() {
        let trailing = &stoch[i + 1 - n..=i];
        if trailing.iter().any(Option::is_none) {
            continue;
        }
        let sum: f64 = trailing.iter().flatten().sum();
        out[i] = Some(sum / n as f64);
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stoch_rsi_needs_full_window() {
        // RSI defined from index 2; window 3 => first StochRSI at index 4.
        let rsi = vec![None, None, Some(40.0), Some(50.0), Some(60.0), Some(55.0)];
        let stoch = stoch_rsi(&rsi, 3);
        assert_eq!(stoch.len(), rsi.len());
        assert!(stoch[..4].iter().all(Option::is_none));
        assert!(stoch[4].is_some());
        assert!(stoch[5].is_some());
    }

    #[test]
    fn stoch_rsi_at_window_extremes() {
        let rsi = vec![Some(40.0), Some(50.0), Some(60.0)];
        let stoch = stoch_rsi(&rsi, 3);
        // Current RSI equals the window max => 100.
        assert!((stoch[2].unwrap() - 100.0).abs() < 1e-10);

        let falling = vec![Some(60.0), Some(50.0), Some(40.0)];
        let stoch = stoch_rsi(&falling, 3);
        // Current RSI equals the window min => 0.
        assert!(stoch[2].unwrap().abs() < 1e-10);
    }

    #[test]
    fn stoch_rsi_mid_range() {
        let rsi = vec![Some(40.0), Some(60.0), Some(50.0)];
        let stoch = stoch_rsi(&rsi, 3);
        assert!((stoch[2].unwrap() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn stoch_rsi_flat_window_is_zero_not_nan() {
        // Identical RSI values across the whole window => max == min.
        let rsi = vec![Some(50.0); 14];
        let stoch = stoch_rsi(&rsi, 14);
        let v = stoch[13].unwrap();
        assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
    }

    #[test]
    fn stoch_rsi_zero_window() {
        assert!(stoch_rsi(&[Some(50.0)], 0).iter().all(Option::is_none));
    }

    #[test]
    fn smooth_k_is_simple_average() {
        let stoch = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let k = smooth_k(&stoch, 3);
        assert!(k[0].is_none());
        assert!(k[1].is_none());
        assert!((k[2].unwrap() - 20.0).abs() < 1e-10);
        assert!((k[3].unwrap() - 30.0).abs() < 1e-10);
    }

    #[test]
    fn smooth_k_gap_resets_window() {
        // A None inside the trailing window keeps the output undefined.
        let stoch = vec![Some(10.0), None, Some(30.0), Some(40.0), Some(50.0)];
        let k = smooth_k(&stoch, 3);
        assert!(k[2].is_none());
        assert!(k[3].is_none());
        assert!((k[4].unwrap() - 40.0).abs() < 1e-10);
    }
}
