//! CLI command implementations.

pub mod backtest;
pub mod engines;
pub mod validate;
