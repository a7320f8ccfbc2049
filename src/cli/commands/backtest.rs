//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use rotation_backtest::{BacktestEngine, IterationRunner};
use rotation_config::load_config;
use rotation_engines::EngineRegistry;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    info!("Starting backtest for engine: {}", args.engine);

    // Engine settings come from the configuration file, keyed by engine name
    let (engine_config, assets, warmup_bars) = match args.engine.as_str() {
        "signal" => (
            serde_json::to_value(&config.signal)?,
            vec![
                config.signal.asset.clone(),
                config.signal.secondary_asset.clone(),
                config.signal.fixed_income.clone(),
            ],
            config.signal.lookback_bars(),
        ),
        "rebalance" => (
            serde_json::to_value(&config.rebalance)?,
            config
                .rebalance
                .portfolio
                .iter()
                .map(|entry| entry.asset.clone())
                .collect::<Vec<_>>(),
            0,
        ),
        other => bail!("Unknown engine '{}'. Run `rotation engines` to list them.", other),
    };

    let registry = EngineRegistry::new();
    let engine = registry
        .create(&args.engine, engine_config)
        .context("Failed to create engine")?;

    if !args.data.is_dir() {
        bail!(
            "Data path '{}' is not a directory. Provide a directory containing <SYMBOL>.csv files (e.g. --data ./data)",
            args.data.display()
        );
    }
    let data = rotation_data::load_directory(&args.data, &assets)
        .with_context(|| format!("Failed to load price history from {}", args.data.display()))?;
    info!("Loaded data for {} assets", data.len());

    let benchmark = match &args.benchmark {
        Some(symbol) => Some(
            assets
                .iter()
                .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
                .cloned()
                .with_context(|| format!("Benchmark '{}' is not one of the engine's assets", symbol))?,
        ),
        None => assets.first().cloned(),
    };

    let mut backtest_config = config.backtest.to_config(warmup_bars, benchmark);
    if let Some(capital) = args.capital {
        backtest_config.initial_capital =
            Decimal::try_from(capital).context("Invalid initial capital")?;
    }

    let mut runner = IterationRunner::new(engine, config.settlement.build());
    let report = BacktestEngine::new(backtest_config)
        .run(&mut runner, data)
        .await
        .context("Backtest failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(save_path) = &args.save {
        std::fs::write(save_path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Results saved to {:?}", save_path);
    }

    if let Some(equity_path) = &args.equity_csv {
        std::fs::write(equity_path, report.equity_to_csv())
            .with_context(|| format!("Failed to write {}", equity_path.display()))?;
        info!("Equity curve saved to {:?}", equity_path);
    }

    if let Some(chart_path) = &args.chart_csv {
        let lines_path = sibling(chart_path, "lines");
        let markers_path = sibling(chart_path, "markers");
        std::fs::write(&lines_path, report.chart.lines_to_csv())
            .with_context(|| format!("Failed to write {}", lines_path.display()))?;
        std::fs::write(&markers_path, report.chart.markers_to_csv())
            .with_context(|| format!("Failed to write {}", markers_path.display()))?;
        info!("Chart data saved to {:?} and {:?}", lines_path, markers_path);
    }

    Ok(())
}

/// `out/chart.csv` + `lines` -> `out/chart_lines.csv`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chart".to_string());
    path.with_file_name(format!("{}_{}.csv", stem, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_sibling_paths() {
        assert_eq!(
            sibling(Path::new("out/chart.csv"), "lines"),
            PathBuf::from("out/chart_lines.csv")
        );
        assert_eq!(
            sibling(Path::new("chart"), "markers"),
            PathBuf::from("chart_markers.csv")
        );
    }
}
