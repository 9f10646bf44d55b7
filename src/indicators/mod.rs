// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator stages plus the engine that composes them.
// Stage functions return series aligned 1:1 with their input, with `None`
// while the look-back window is still filling, so callers are forced to
// handle insufficient-history explicitly.

pub mod engine;
pub mod rsi;
pub mod stoch_rsi;
pub mod volume;

pub use engine::{IndicatorEngine, IndicatorPoint, IndicatorSeries};
