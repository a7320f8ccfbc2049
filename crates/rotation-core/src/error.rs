//! Error types for the rotation engines.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while running an engine iteration.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A price or series lookup came back empty. The iteration is skipped.
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Engine not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

impl EngineError {
    /// Whether the iteration should be skipped rather than treated as a failure.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            EngineError::MissingData(_)
                | EngineError::Gateway(GatewayError::MissingPrice(_))
                | EngineError::Gateway(GatewayError::MissingHistory(_))
                | EngineError::Indicator(IndicatorError::InsufficientData { .. })
        )
    }
}

/// Execution/market-data gateway errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("No price available for {0}")]
    MissingPrice(String),

    #[error("No price history for {0}")]
    MissingHistory(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for rotation operations.
pub type RotationResult<T> = Result<T, RotationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_is_skippable() {
        assert!(EngineError::MissingData("BTC".into()).is_skippable());
        assert!(EngineError::Gateway(GatewayError::MissingPrice("BTC".into())).is_skippable());
        assert!(EngineError::Gateway(GatewayError::MissingHistory("BTC".into())).is_skippable());
        assert!(EngineError::Indicator(IndicatorError::InsufficientData {
            required: 20,
            available: 3
        })
        .is_skippable());
    }

    #[test]
    fn test_gateway_failure_is_not_skippable() {
        let err = EngineError::Gateway(GatewayError::Connection("timeout".into()));
        assert!(!err.is_skippable());
        assert!(!EngineError::InvalidConfig("period".into()).is_skippable());
    }
}
