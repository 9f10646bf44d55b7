// =============================================================================
// Volume baseline — rolling average and explosion detection
// =============================================================================
//
// A bar is "explosive" when its volume greatly exceeds the trailing rolling
// average (the current bar itself is part of the window, matching a standard
// rolling mean). With no full window yet there is no baseline, so the flag
// stays false rather than guessing.

/// Rolling simple mean of `volumes` over the trailing `window` bars, current
/// bar included. `out[i]` is `None` until `window` bars are available.
pub fn rolling_mean(volumes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; volumes.len()];
    if window == 0 || volumes.len() < window {
        return out;
    }

    // Running-sum update instead of re-summing the window at every index.
    let mut sum: f64 = volumes[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);

    for i in window..volumes.len() {
        sum += volumes[i] - volumes[i - window];
        out[i] = Some(sum / window as f64);
    }

    out
}

/// Whether `volume` exceeds `avg * multiplier`. False when the baseline is
/// still undefined.
pub fn is_explosive(volume: f64, avg: Option<f64>, multiplier: f64) -> bool {
    match avg {
        Some(avg) => volume > avg * multiplier,
        None => false,
    }
}
