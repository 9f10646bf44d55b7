// =============================================================================
// Signals Module
// =============================================================================
//
// Rule layer of the scanner: threshold parameters and the three composite
// reversal flags evaluated on derived indicator values.

pub mod rules;

pub use rules::{RuleFlags, SignalParams};
