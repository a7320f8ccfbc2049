//! Core data types for the rotation engines.

mod asset;
mod ohlcv;
mod order;
mod position;
mod timeframe;

pub use asset::{Asset, AssetClass};
pub use ohlcv::{Bar, BarSeries};
pub use order::{Fill, Order, OrderRequest, OrderStatus, Side};
pub use position::{Portfolio, Position};
pub use timeframe::Timeframe;
