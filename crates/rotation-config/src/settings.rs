//! Configuration structures.

use rotation_backtest::BacktestConfig;
use rotation_core::types::Asset;
use rotation_engines::{
    FixedDelay, PollOrderStatus, RebalanceConfig, SettlementStrategy, SignalConfig,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ConfigError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub settlement: SettlementSettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    /// Check every section, failing on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.signal
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[signal] {}", e)))?;
        self.rebalance
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[rebalance] {}", e)))?;
        self.settlement.validate()?;
        self.backtest.validate()
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "rotation".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Whether JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "[logging] unknown format '{}', expected pretty or json",
                other
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// How engines wait for submitted orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    /// Sleep for a fixed delay
    #[default]
    Fixed,
    /// Poll order status until every order is terminal
    Poll,
}

/// Settlement wait settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementSettings {
    pub mode: SettlementMode,
    pub delay_secs: u64,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl SettlementSettings {
    /// Build the configured strategy.
    pub fn build(&self) -> Box<dyn SettlementStrategy> {
        match self.mode {
            SettlementMode::Fixed => Box::new(FixedDelay::new(Duration::from_secs(self.delay_secs))),
            SettlementMode::Poll => Box::new(PollOrderStatus::new(
                Duration::from_millis(self.poll_interval_ms),
                self.max_attempts,
            )),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == SettlementMode::Poll && (self.max_attempts == 0 || self.poll_interval_ms == 0)
        {
            return Err(ConfigError::Invalid(
                "[settlement] poll mode needs a positive interval and attempt count".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            mode: SettlementMode::Fixed,
            delay_secs: 5,
            poll_interval_ms: 500,
            max_attempts: 10,
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: Decimal,
    /// Percentage of fill value
    pub commission_pct: Decimal,
    pub slippage_pct: Decimal,
}

impl BacktestSettings {
    /// Backtest configuration for one run.
    pub fn to_config(&self, warmup_bars: usize, benchmark: Option<Asset>) -> BacktestConfig {
        BacktestConfig {
            initial_capital: self.initial_capital,
            commission_pct: self.commission_pct,
            slippage_pct: self.slippage_pct,
            warmup_bars,
            benchmark,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "[backtest] initial_capital must be positive".to_string(),
            ));
        }
        if self.commission_pct < Decimal::ZERO || self.slippage_pct < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "[backtest] commission and slippage cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        let defaults = BacktestConfig::default();
        Self {
            initial_capital: defaults.initial_capital,
            commission_pct: defaults.commission_pct,
            slippage_pct: defaults.slippage_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overweight_basket_rejected() {
        let mut config = AppConfig::default();
        config.rebalance.portfolio[0].weight = dec!(0.8);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[rebalance]"));
    }

    #[test]
    fn test_poll_needs_attempts() {
        let mut config = AppConfig::default();
        config.settlement.mode = SettlementMode::Poll;
        config.settlement.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settlement_build() {
        let fixed = SettlementSettings::default().build();
        assert_eq!(fixed.name(), "fixed");

        let poll = SettlementSettings {
            mode: SettlementMode::Poll,
            ..Default::default()
        }
        .build();
        assert_eq!(poll.name(), "poll");
    }

    #[test]
    fn test_backtest_settings_to_config() {
        let settings = BacktestSettings {
            initial_capital: dec!(5000),
            ..Default::default()
        };
        let config = settings.to_config(15, Some(Asset::crypto("BTC")));
        assert_eq!(config.initial_capital, dec!(5000));
        assert_eq!(config.warmup_bars, 15);
        assert_eq!(config.commission_pct, dec!(0.1));
    }

    #[test]
    fn test_toml_round_trip_keeps_sections() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[signal]"));
        assert!(rendered.contains("[settlement]"));
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.signal, SignalConfig::default());
    }
}
