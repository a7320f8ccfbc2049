//! Engine registry for selecting an engine by name.

use crate::{Engine, RebalanceConfig, RebalanceEngine, SignalConfig, SignalEngine};
use rotation_core::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Information about a registered engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine name
    pub name: String,
    /// Engine description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry of the built-in engines.
pub struct EngineRegistry {
    engines: HashMap<String, EngineInfo>,
}

impl EngineRegistry {
    /// Create a registry with all built-in engines.
    pub fn new() -> Self {
        let mut engines = HashMap::new();

        engines.insert(
            "signal".to_string(),
            EngineInfo {
                name: "Band Rotation".to_string(),
                description: "Rotates between a risk asset and fixed income on Bollinger Band breaks and EMA trend streaks".to_string(),
                default_config: serde_json::to_value(SignalConfig::default()).unwrap_or_default(),
            },
        );

        engines.insert(
            "rebalance".to_string(),
            EngineInfo {
                name: "Periodic Rebalance".to_string(),
                description: "Rebalances a weighted basket back to its target weights every N iterations".to_string(),
                default_config: serde_json::to_value(RebalanceConfig::default()).unwrap_or_default(),
            },
        );

        Self { engines }
    }

    /// List all available engines.
    pub fn list(&self) -> Vec<(&String, &EngineInfo)> {
        let mut entries: Vec<_> = self.engines.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Get engine info by key.
    pub fn get(&self, key: &str) -> Option<&EngineInfo> {
        self.engines.get(key)
    }

    /// Check if an engine exists.
    pub fn exists(&self, key: &str) -> bool {
        self.engines.contains_key(key)
    }

    /// Create a validated engine from JSON configuration.
    pub fn create(
        &self,
        key: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Engine>, EngineError> {
        match key {
            "signal" => {
                let config: SignalConfig = serde_json::from_value(config)
                    .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(SignalEngine::new(config)))
            }
            "rebalance" => {
                let config: RebalanceConfig = serde_json::from_value(config)
                    .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
                config.validate()?;
                Ok(Box::new(RebalanceEngine::new(config)))
            }
            _ => Err(EngineError::NotFound(key.to_string())),
        }
    }

    /// Create an engine with its default configuration.
    pub fn create_default(&self, key: &str) -> Result<Box<dyn Engine>, EngineError> {
        let info = self
            .get(key)
            .ok_or_else(|| EngineError::NotFound(key.to_string()))?;
        self.create(key, info.default_config.clone())
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
