//! Backtest report generation.

use rotation_core::types::Portfolio;
use rotation_engines::OrderFailure;
use serde::{Deserialize, Serialize};

use crate::{BacktestConfig, BacktestStats, ChartLog};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Engine that was replayed
    pub engine: String,
    /// Configuration used
    pub config: BacktestConfig,
    /// Statistics
    pub stats: BacktestStats,
    /// Final portfolio state
    pub final_portfolio: Portfolio,
    /// Indicator lines and trade markers
    pub chart: ChartLog,
    /// (unix millis, action) for every iteration that took one
    pub actions: Vec<(i64, String)>,
    /// Orders refused at submission
    pub failures: Vec<OrderFailure>,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");
        s.push_str(&format!("  Engine:              {}\n\n", self.engine));

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Initial Capital:     ${:.2}\n",
            self.stats.initial_capital
        ));
        s.push_str(&format!(
            "  Final Equity:        ${:.2}\n",
            self.stats.final_equity
        ));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            self.stats.total_return_pct
        ));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            self.stats.annualized_return_pct
        ));
        if let Some(benchmark) = self.stats.benchmark_return_pct {
            s.push_str(&format!("  Buy & Hold Return:   {:.2}%\n", benchmark));
        }
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            self.stats.max_drawdown_pct
        ));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Sharpe Ratio:        {:.2}\n",
            self.stats.sharpe_ratio
        ));
        s.push_str(&format!(
            "  Sortino Ratio:       {:.2}\n",
            self.stats.sortino_ratio
        ));
        s.push('\n');

        s.push_str("TRADING\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Fills:               {}\n",
            self.stats.total_trades
        ));
        s.push_str(&format!(
            "  Rejected Orders:     {}\n",
            self.stats.rejected_orders
        ));
        s.push_str(&format!(
            "  Realized P&L:        ${:.2}\n",
            self.stats.realized_pnl
        ));
        s.push_str(&format!(
            "  Commission Paid:     ${:.2}\n",
            self.stats.total_commission
        ));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Iterations:          {}\n",
            self.stats.iterations
        ));
        s.push_str(&format!(
            "  Skipped:             {}\n",
            self.stats.skipped_iterations
        ));
        s.push_str(&format!(
            "  Actions Taken:       {}\n",
            self.actions.len()
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            csv.push_str(&format!("{},{}\n", ts, equity));
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report() -> BacktestReport {
        let mut stats = BacktestStats::new(dec!(100000));
        stats.final_equity = dec!(110000);
        stats.total_return_pct = dec!(10);
        stats.max_drawdown_pct = dec!(5);
        stats.total_trades = 10;
        stats.record_equity(0, dec!(100000));
        stats.record_equity(86_400_000, dec!(110000));

        BacktestReport {
            engine: "Band Rotation".to_string(),
            config: BacktestConfig::default(),
            stats,
            final_portfolio: Portfolio::new(dec!(110000)),
            chart: ChartLog::new(),
            actions: vec![(0, "hold".to_string())],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = report().summary();
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("10.00%"));
        assert!(summary.contains("Band Rotation"));
        assert!(!summary.contains("Buy & Hold"));
    }

    #[test]
    fn test_equity_csv() {
        let csv = report().equity_to_csv();
        assert_eq!(csv, "timestamp,equity\n0,100000\n86400000,110000\n");
    }

    #[test]
    fn test_json_export() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"engine\": \"Band Rotation\""));
    }
}
