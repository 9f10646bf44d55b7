// =============================================================================
// Shared types used across the Nadir reversal scanner
// =============================================================================

use serde::{Deserialize, Serialize};

/// The three reversal rules the scanner evaluates on the latest closed bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    BLow,
    RLow,
    TLow,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [Self::BLow, Self::RLow, Self::TLow];

    /// Short human-readable description of the rule, used in alert messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BLow => "RSI < 25, StochRSI K < 5, volume explosive",
            Self::RLow => "RSI < 15",
            Self::TLow => "RSI < 20, StochRSI K < 1",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BLow => write!(f, "b_low"),
            Self::RLow => write!(f, "r_low"),
            Self::TLow => write!(f, "t_low"),
        }
    }
}
