//! Decision engines.
//!
//! Two engines are provided:
//! - Signal engine: rotates between a risk asset and a fixed-income asset
//!   using Bollinger Bands and a fast/slow EMA trend streak
//! - Rebalance engine: every N iterations, moves a weighted basket back to
//!   its target weights
//!
//! Engines hold only configuration. Everything that survives between
//! iterations lives in [`EngineState`] and is passed in by the host.

mod context;
mod engine;
mod rebalance;
mod registry;
mod report;
mod settlement;
mod signal;
mod state;

#[cfg(test)]
mod mock;

pub use context::IterationContext;
pub use engine::Engine;
pub use rebalance::{
    fit_buys_to_cash, plan_rebalance, truncate_quantity, PlannedOrder, PortfolioEntry,
    RebalanceConfig, RebalanceEngine, RebalanceInput, RebalancePlan,
};
pub use registry::{EngineInfo, EngineRegistry};
pub use report::{ChartMarker, ChartPoint, IterationReport, OrderFailure};
pub use settlement::{FixedDelay, PollOrderStatus, SettlementStrategy};
pub use signal::{decide, BuyReason, Decision, IndicatorSnapshot, SignalConfig, SignalEngine};
pub use state::{EngineState, RebalanceState, SignalState};
