//! Tradable asset identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Crypto currency, quoted against a fiat or another coin
    Crypto,
    /// Equity or ETF
    #[default]
    #[serde(alias = "equity")]
    Stock,
    /// Fiat currency
    Forex,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Stock => "stock",
            AssetClass::Forex => "forex",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crypto" => Ok(AssetClass::Crypto),
            "stock" | "equity" | "etf" => Ok(AssetClass::Stock),
            "forex" | "fx" | "fiat" => Ok(AssetClass::Forex),
            _ => Err(format!("Invalid asset class: {}", s)),
        }
    }
}

/// An asset: symbol plus asset class. Immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol
    pub symbol: String,
    /// Asset class
    #[serde(default, alias = "asset_type")]
    pub class: AssetClass,
}

impl Asset {
    /// Create a new asset.
    pub fn new(symbol: impl Into<String>, class: AssetClass) -> Self {
        Self {
            symbol: symbol.into(),
            class,
        }
    }

    /// Create a crypto asset.
    pub fn crypto(symbol: impl Into<String>) -> Self {
        Self::new(symbol, AssetClass::Crypto)
    }

    /// Create a stock/ETF asset.
    pub fn stock(symbol: impl Into<String>) -> Self {
        Self::new(symbol, AssetClass::Stock)
    }

    /// Create a forex asset.
    pub fn forex(symbol: impl Into<String>) -> Self {
        Self::new(symbol, AssetClass::Forex)
    }

    /// Symbol of the pair when quoted against `quote`, e.g. `BTC/USD`.
    pub fn pair_symbol(&self, quote: Option<&Asset>) -> String {
        match quote {
            Some(q) => format!("{}/{}", self.symbol, q.symbol),
            None => self.symbol.clone(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_symbol() {
        let btc = Asset::crypto("BTC");
        let usd = Asset::forex("USD");

        assert_eq!(btc.pair_symbol(Some(&usd)), "BTC/USD");
        assert_eq!(btc.pair_symbol(None), "BTC");
    }

    #[test]
    fn test_asset_class_parse() {
        assert_eq!(AssetClass::from_str("crypto").unwrap(), AssetClass::Crypto);
        assert_eq!(AssetClass::from_str("Equity").unwrap(), AssetClass::Stock);
        assert_eq!(AssetClass::from_str("forex").unwrap(), AssetClass::Forex);
        assert!(AssetClass::from_str("bond").is_err());
    }

    #[test]
    fn test_asset_equality_includes_class() {
        assert_ne!(Asset::crypto("USFR"), Asset::stock("USFR"));
        assert_eq!(Asset::stock("USFR"), Asset::stock("USFR"));
    }

    #[test]
    fn test_asset_deserialize_defaults_to_stock() {
        let asset: Asset = serde_json::from_str(r#"{"symbol": "USFR"}"#).unwrap();
        assert_eq!(asset.class, AssetClass::Stock);

        let asset: Asset =
            serde_json::from_str(r#"{"symbol": "BTC", "asset_type": "crypto"}"#).unwrap();
        assert_eq!(asset, Asset::crypto("BTC"));
    }
}
