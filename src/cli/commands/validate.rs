//! Validate configuration command.

use anyhow::Result;
use rotation_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!(
                "Signal: {} / {} / {}",
                config.signal.asset, config.signal.secondary_asset, config.signal.fixed_income
            );
            println!(
                "Bands: {} days x {} std, EMA {}/{} days",
                config.signal.bbands_length_days,
                config.signal.bbands_std_dev,
                config.signal.fast_ema_length_days,
                config.signal.slow_ema_length_days
            );
            println!(
                "Rebalance: every {} iterations across {} assets",
                config.rebalance.period,
                config.rebalance.portfolio.len()
            );
            println!("Settlement: {:?}", config.settlement.mode);
            println!();
            println!("Effective configuration:");
            println!("{}", config.to_toml()?);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
