//! Iteration runner and historical replay.
//!
//! [`IterationRunner`] is the host scheduler: it owns one engine and its
//! state and invokes one iteration per tick. [`BacktestEngine`] drives a
//! runner over CSV history through the paper gateway.

mod chart;
mod engine;
mod report;
mod runner;
mod statistics;

pub use chart::ChartLog;
pub use engine::{BacktestConfig, BacktestEngine};
pub use report::BacktestReport;
pub use runner::{IterationRunner, TickOutcome};
pub use statistics::{BacktestStats, TradeRecord};
