//! Core types and traits for the rotation engines.
//!
//! This crate provides the foundational building blocks including:
//! - Assets and market data types (Asset, Bar, BarSeries)
//! - Order, position and portfolio types
//! - The execution/market-data gateway contract
//! - Indicator traits shared by the indicator library

pub mod types;
pub mod traits;
pub mod error;

pub use error::{RotationError, RotationResult};
pub use types::*;
pub use traits::*;
