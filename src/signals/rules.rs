// =============================================================================
// Reversal rules — threshold checks on the derived indicator values
// =============================================================================
//
// Each rule is a conjunction of threshold comparisons. A rule can only fire
// when every indicator it references is defined; while the look-back windows
// are still filling the flag is false, not an error.

use serde::{Deserialize, Serialize};

use crate::types::SignalKind;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rsi_period() -> usize {
    14
}

fn default_stoch_window() -> usize {
    14
}

fn default_k_smoothing() -> usize {
    3
}

fn default_volume_window() -> usize {
    120
}

fn default_volume_multiplier() -> f64 {
    3.0
}

fn default_b_low_rsi() -> f64 {
    25.0
}

fn default_b_low_k() -> f64 {
    5.0
}

fn default_r_low_rsi() -> f64 {
    15.0
}

fn default_t_low_rsi() -> f64 {
    20.0
}

fn default_t_low_k() -> f64 {
    1.0
}

// =============================================================================
// SignalParams
// =============================================================================

/// Tunable parameters for the indicator pipeline and the rule thresholds.
/// Defaults reproduce the canonical rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Wilder RSI look-back.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// StochRSI min/max window over the RSI series.
    #[serde(default = "default_stoch_window")]
    pub stoch_window: usize,

    /// SMA length for the StochRSI K line.
    #[serde(default = "default_k_smoothing")]
    pub k_smoothing: usize,

    /// Rolling volume baseline window.
    #[serde(default = "default_volume_window")]
    pub volume_window: usize,

    /// A bar is explosive when volume > baseline * this multiplier.
    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: f64,

    /// b_low: RSI ceiling.
    #[serde(default = "default_b_low_rsi")]
    pub b_low_rsi: f64,

    /// b_low: StochRSI K ceiling.
    #[serde(default = "default_b_low_k")]
    pub b_low_k: f64,

    /// r_low: RSI ceiling.
    #[serde(default = "default_r_low_rsi")]
    pub r_low_rsi: f64,

    /// t_low: RSI ceiling.
    #[serde(default = "default_t_low_rsi")]
    pub t_low_rsi: f64,

    /// t_low: StochRSI K ceiling.
    #[serde(default = "default_t_low_k")]
    pub t_low_k: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            stoch_window: default_stoch_window(),
            k_smoothing: default_k_smoothing(),
            volume_window: default_volume_window(),
            volume_multiplier: default_volume_multiplier(),
            b_low_rsi: default_b_low_rsi(),
            b_low_k: default_b_low_k(),
            r_low_rsi: default_r_low_rsi(),
            t_low_rsi: default_t_low_rsi(),
            t_low_k: default_t_low_k(),
        }
    }
}

// =============================================================================
// RuleFlags
// =============================================================================

/// Verdict of the three reversal rules for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlags {
    pub b_low: bool,
    pub r_low: bool,
    pub t_low: bool,
}

impl RuleFlags {
    /// Evaluate all three rules for one bar.
    ///
    /// * `b_low` needs RSI, K and the volume flag.
    /// * `r_low` needs only RSI.
    /// * `t_low` needs RSI and K.
    pub fn evaluate(
        rsi: Option<f64>,
        stochrsi_k: Option<f64>,
        vol_explosive: bool,
        params: &SignalParams,
    ) -> Self {
        let b_low = match (rsi, stochrsi_k) {
            (Some(rsi), Some(k)) => {
                rsi < params.b_low_rsi && k < params.b_low_k && vol_explosive
            }
            _ => false,
        };

        let r_low = rsi.is_some_and(|rsi| rsi < params.r_low_rsi);

        let t_low = match (rsi, stochrsi_k) {
            (Some(rsi), Some(k)) => rsi < params.t_low_rsi && k < params.t_low_k,
            _ => false,
        };

        Self {
            b_low,
            r_low,
            t_low,
        }
    }

    /// Whether a specific rule fired.
    pub fn is_set(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::BLow => self.b_low,
            SignalKind::RLow => self.r_low,
            SignalKind::TLow => self.t_low,
        }
    }

    /// Every rule that fired for this bar, in canonical order.
    pub fn triggered(&self) -> Vec<SignalKind> {
        SignalKind::ALL
            .into_iter()
            .filter(|kind| self.is_set(*kind))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.b_low || self.r_low || self.t_low
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SignalParams {
        SignalParams::default()
    }

    #[test]
    fn all_flags_false_without_rsi() {
        let flags = RuleFlags::evaluate(None, Some(0.5), true, &params());
        assert_eq!(flags, RuleFlags::default());
        assert!(!flags.any());
    }

    #[test]
    fn r_low_needs_only_rsi() {
        let flags = RuleFlags::evaluate(Some(10.0), None, false, &params());
        assert!(flags.r_low);
        assert!(!flags.b_low);
        assert!(!flags.t_low);
    }

    #[test]
    fn b_low_needs_all_three_inputs() {
        let p = params();
        assert!(RuleFlags::evaluate(Some(20.0), Some(2.0), true, &p).b_low);
        assert!(!RuleFlags::evaluate(Some(20.0), Some(2.0), false, &p).b_low);
        assert!(!RuleFlags::evaluate(Some(20.0), None, true, &p).b_low);
        assert!(!RuleFlags::evaluate(Some(26.0), Some(2.0), true, &p).b_low);
        assert!(!RuleFlags::evaluate(Some(20.0), Some(6.0), true, &p).b_low);
    }

    #[test]
    fn t_low_thresholds() {
        let p = params();
        assert!(RuleFlags::evaluate(Some(19.0), Some(0.5), false, &p).t_low);
        assert!(!RuleFlags::evaluate(Some(19.0), Some(1.0), false, &p).t_low);
        assert!(!RuleFlags::evaluate(Some(20.0), Some(0.5), false, &p).t_low);
    }

    #[test]
    fn thresholds_are_strict_comparisons() {
        // RSI exactly at a ceiling does not fire the rule.
        let p = params();
        assert!(!RuleFlags::evaluate(Some(15.0), None, false, &p).r_low);
        assert!(RuleFlags::evaluate(Some(14.999), None, false, &p).r_low);
    }

    #[test]
    fn triggered_returns_canonical_order() {
        let flags = RuleFlags {
            b_low: true,
            r_low: true,
            t_low: true,
        };
        assert_eq!(
            flags.triggered(),
            vec![SignalKind::BLow, SignalKind::RLow, SignalKind::TLow]
        );
    }

    #[test]
    fn params_deserialise_with_defaults() {
        let p: SignalParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, SignalParams::default());

        let p: SignalParams = serde_json::from_str(r#"{ "r_low_rsi": 12.0 }"#).unwrap();
        assert!((p.r_low_rsi - 12.0).abs() < f64::EPSILON);
        assert_eq!(p.volume_window, 120);
    }
}
