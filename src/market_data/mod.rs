pub mod candle_series;

// Re-export the core data types (e.g. `use crate::market_data::Candle`).
pub use candle_series::{Candle, CandleSeries, InvalidInput};
