//! Core traits for the rotation engines.

mod gateway;
mod indicator;

pub use gateway::Gateway;
pub use indicator::{Indicator, MultiOutputIndicator};
