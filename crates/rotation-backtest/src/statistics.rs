//! Backtest statistics.

use chrono::{DateTime, Utc};
use rotation_core::types::{Asset, Order, Portfolio, Side};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

const MILLIS_PER_YEAR: f64 = 365.25 * 86_400_000.0;

/// Record of a single fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub asset: Asset,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// One record per fill of the order.
    pub fn from_order(order: &Order) -> Vec<Self> {
        order
            .fills
            .iter()
            .map(|fill| Self {
                asset: order.asset.clone(),
                side: order.side,
                quantity: fill.quantity,
                price: fill.price,
                commission: fill.commission,
                timestamp: fill.timestamp,
            })
            .collect()
    }
}

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Final equity
    pub final_equity: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Annualized return percentage
    pub annualized_return_pct: Decimal,
    /// Buy-and-hold return of the benchmark asset over the same span
    pub benchmark_return_pct: Option<Decimal>,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio (assuming risk-free rate of 0)
    pub sharpe_ratio: f64,
    /// Sortino ratio
    pub sortino_ratio: f64,
    /// Realized profit/loss
    pub realized_pnl: Decimal,
    /// Commission paid
    pub total_commission: Decimal,
    /// Number of fills
    pub total_trades: usize,
    /// Orders refused at submission or rejected at settlement
    pub rejected_orders: usize,
    /// Engine iterations run
    pub iterations: u64,
    /// Iterations skipped for missing data
    pub skipped_iterations: u64,
    /// Equity curve
    pub equity_curve: Vec<(i64, Decimal)>,
    /// All fills
    pub trades: Vec<TradeRecord>,
    /// Peak equity (for drawdown)
    peak_equity: Decimal,
    /// Per-step returns for Sharpe calculation
    returns: Vec<f64>,
}

impl BacktestStats {
    /// Create new stats tracker.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            total_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            benchmark_return_pct: None,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            realized_pnl: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            total_trades: 0,
            rejected_orders: 0,
            iterations: 0,
            skipped_iterations: 0,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: initial_capital,
            returns: Vec::new(),
        }
    }

    /// Record equity at a timestamp.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal) {
        if let Some((_, prev_equity)) = self.equity_curve.last() {
            if *prev_equity > Decimal::ZERO {
                let ret = ((equity - *prev_equity) / *prev_equity)
                    .to_f64()
                    .unwrap_or(0.0);
                self.returns.push(ret);
            }
        }

        self.equity_curve.push((timestamp, equity));

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }

        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }
    }

    /// Add a trade record.
    pub fn add_trade(&mut self, trade: TradeRecord) {
        self.total_commission += trade.commission;
        self.trades.push(trade);
        self.total_trades += 1;
    }

    /// Years covered by the equity curve.
    fn years(&self) -> Option<f64> {
        let (first, _) = self.equity_curve.first()?;
        let (last, _) = self.equity_curve.last()?;
        let years = (last - first) as f64 / MILLIS_PER_YEAR;
        (years > 0.0).then_some(years)
    }

    /// Calculate final statistics.
    pub fn finalize(&mut self, portfolio: &Portfolio) {
        self.final_equity = portfolio.equity;
        self.realized_pnl = portfolio.total_realized_pnl;

        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct =
                (self.final_equity - self.initial_capital) / self.initial_capital * dec!(100);
        }

        let years = self.years();
        if let Some(years) = years {
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(1.0 / years) - 1.0) * 100.0;
            self.annualized_return_pct =
                Decimal::try_from(annualized).unwrap_or(Decimal::ZERO);
        }

        if self.returns.len() < 2 {
            return;
        }
        // Annualize with the observed sampling rate
        let periods_per_year = years
            .map(|y| self.returns.len() as f64 / y)
            .unwrap_or(365.0);
        let scale = periods_per_year.sqrt();

        let mean = self.returns.iter().mean();
        let std_dev = self.returns.iter().population_std_dev();
        if std_dev > 0.0 {
            self.sharpe_ratio = mean * scale / std_dev;
        }

        let downside: Vec<f64> = self.returns.iter().map(|r| r.min(0.0)).collect();
        let downside_dev = downside.iter().map(|r| r * r).mean().sqrt();
        if downside_dev > 0.0 {
            self.sortino_ratio = mean * scale / downside_dev;
        }
    }
}
