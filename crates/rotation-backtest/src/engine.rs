//! Historical replay through the paper gateway.

use chrono::DateTime;
use rotation_core::error::EngineError;
use rotation_core::types::{Asset, Bar, OrderStatus};
use rotation_engines::OrderFailure;
use rotation_gateway::PaperGateway;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::chart::ChartLog;
use crate::report::BacktestReport;
use crate::runner::{IterationRunner, TickOutcome};
use crate::statistics::{BacktestStats, TradeRecord};

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Commission as a percentage of fill value
    pub commission_pct: Decimal,
    /// Slippage percentage
    pub slippage_pct: Decimal,
    /// Timestamps replayed before the first tick
    pub warmup_bars: usize,
    /// Asset for the buy-and-hold comparison
    pub benchmark: Option<Asset>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission_pct: dec!(0.1),
            slippage_pct: dec!(0.05),
            warmup_bars: 0,
            benchmark: None,
        }
    }
}

/// Backtesting engine.
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Replay `data` one timestamp at a time, ticking the runner after the
    /// warm-up period.
    ///
    /// Orders fill at the close of the tick that placed them, either when the
    /// engine waits for settlement or once the tick returns.
    pub async fn run(
        &self,
        runner: &mut IterationRunner,
        data: HashMap<Asset, Vec<Bar>>,
    ) -> Result<BacktestReport, EngineError> {
        let gateway = PaperGateway::new(self.config.initial_capital)
            .with_slippage(self.config.slippage_pct)
            .with_commission(self.config.commission_pct);

        let timestamps: Vec<i64> = data
            .values()
            .flat_map(|bars| bars.iter().map(|b| b.timestamp))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for (asset, bars) in &data {
            gateway.load_history(asset.clone(), bars.clone());
        }

        if timestamps.len() <= self.config.warmup_bars {
            return Err(EngineError::MissingData(format!(
                "{} timestamps loaded, warm-up needs more than {}",
                timestamps.len(),
                self.config.warmup_bars
            )));
        }

        let mut stats = BacktestStats::new(self.config.initial_capital);
        let mut chart = ChartLog::new();
        let mut failures: Vec<OrderFailure> = Vec::new();
        let mut actions = Vec::new();

        for &timestamp in &timestamps[..self.config.warmup_bars] {
            gateway.advance_to(timestamp);
        }

        info!(
            engine = runner.engine_name(),
            ticks = timestamps.len() - self.config.warmup_bars,
            warmup = self.config.warmup_bars,
            "starting backtest"
        );

        for &timestamp in &timestamps[self.config.warmup_bars..] {
            gateway.advance_to(timestamp);
            let now = DateTime::from_timestamp_millis(timestamp).unwrap_or_default();

            match runner.tick(now, &gateway).await {
                Ok(TickOutcome::Completed(report)) => {
                    chart.record(&report);
                    if let Some(action) = &report.action {
                        actions.push((timestamp, action.clone()));
                    }
                    failures.extend(report.failures);
                }
                Ok(TickOutcome::Skipped(_)) => {}
                Err(e) => warn!(error = %e, timestamp, "iteration error, continuing"),
            }
            gateway.settle_pending();

            stats.record_equity(timestamp, gateway.portfolio_snapshot().equity);
        }

        for order in gateway.order_history() {
            match order.status {
                OrderStatus::Rejected => stats.rejected_orders += 1,
                _ => TradeRecord::from_order(&order)
                    .into_iter()
                    .for_each(|t| stats.add_trade(t)),
            }
        }
        stats.rejected_orders += failures.len();
        stats.iterations = runner.ticks();
        stats.skipped_iterations = runner.skipped();
        stats.benchmark_return_pct = self.benchmark_return(&data, &timestamps);

        let final_portfolio = gateway.portfolio_snapshot();
        stats.finalize(&final_portfolio);

        info!(
            final_equity = %stats.final_equity,
            return_pct = %stats.total_return_pct.round_dp(2),
            trades = stats.total_trades,
            "backtest complete"
        );

        Ok(BacktestReport {
            engine: runner.engine_name().to_string(),
            config: self.config.clone(),
            stats,
            final_portfolio,
            chart,
            actions,
            failures,
        })
    }

    /// Buy-and-hold return of the benchmark from the first tick to the end.
    fn benchmark_return(
        &self,
        data: &HashMap<Asset, Vec<Bar>>,
        timestamps: &[i64],
    ) -> Option<Decimal> {
        let bars = data.get(self.config.benchmark.as_ref()?)?;
        let start = *timestamps.get(self.config.warmup_bars)?;
        let first = bars.iter().find(|b| b.timestamp >= start)?.close;
        let last = bars.last()?.close;
        if first <= 0.0 {
            return None;
        }
        Decimal::from_f64((last / first - 1.0) * 100.0)
    }
}
