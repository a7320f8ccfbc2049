//! Technical indicators used by the rotation engines.
//!
//! - Exponential moving averages, both SMA-seeded and the adjusted
//!   (weight-normalised) form that yields a value from the first sample
//! - Bollinger Bands over a rolling window
//!
//! Window statistics for the latest band value go through SIMD kernels, since
//! minute-sampled windows span tens of thousands of points.

pub mod moving_average;
pub mod simd;
pub mod volatility;

pub use moving_average::Ema;
pub use volatility::{BollingerBands, BollingerOutput};
