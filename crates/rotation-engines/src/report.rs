//! Per-iteration output: orders placed, failures and chart data.

use chrono::{DateTime, Utc};
use rotation_core::error::GatewayError;
use rotation_core::types::{Asset, Order, OrderRequest, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sample of a named chart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A buy/sell marker on the price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMarker {
    pub asset: Asset,
    pub side: Side,
    /// Price of the asset when the marker was placed
    pub price: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// An order the gateway refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFailure {
    pub asset: Asset,
    pub side: Side,
    pub quantity: Decimal,
    pub error: String,
}

impl OrderFailure {
    fn new(request: &OrderRequest, error: &GatewayError) -> Self {
        Self {
            asset: request.asset.clone(),
            side: request.side,
            quantity: request.quantity,
            error: error.to_string(),
        }
    }
}

/// What one engine iteration did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationReport {
    /// Engine that produced the report
    pub engine: String,
    pub timestamp: DateTime<Utc>,
    /// Human-readable outcome, e.g. the signal decision
    pub action: Option<String>,
    /// Orders accepted by the gateway
    pub orders: Vec<Order>,
    /// Orders the gateway refused
    pub failures: Vec<OrderFailure>,
    pub lines: Vec<ChartPoint>,
    pub markers: Vec<ChartMarker>,
}

impl IterationReport {
    pub fn new(engine: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            engine: engine.into(),
            timestamp,
            action: None,
            orders: Vec::new(),
            failures: Vec::new(),
            lines: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = Some(action.into());
    }

    /// Record a chart line sample at the report timestamp.
    pub fn add_line(&mut self, name: impl Into<String>, value: f64) {
        self.lines.push(ChartPoint {
            name: name.into(),
            value,
            timestamp: self.timestamp,
        });
    }

    pub fn add_marker(&mut self, asset: &Asset, side: Side, price: Option<Decimal>) {
        self.markers.push(ChartMarker {
            asset: asset.clone(),
            side,
            price,
            timestamp: self.timestamp,
        });
    }

    /// Record the outcome of a batch submission. Returns the accepted orders.
    pub fn record_submissions(
        &mut self,
        requests: &[OrderRequest],
        results: Vec<Result<Order, GatewayError>>,
    ) -> Vec<Order> {
        let mut accepted = Vec::new();
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(order) => {
                    accepted.push(order.clone());
                    self.orders.push(order);
                }
                Err(e) => self.failures.push(OrderFailure::new(request, &e)),
            }
        }
        accepted
    }

    /// Check whether anything was traded or attempted.
    pub fn has_activity(&self) -> bool {
        !self.orders.is_empty() || !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_submissions_splits_failures() {
        let mut report = IterationReport::new("test", Utc::now());
        let requests = vec![
            OrderRequest::market(Asset::crypto("BTC"), Side::Sell, dec!(1)),
            OrderRequest::market(Asset::crypto("ETH"), Side::Buy, dec!(2)),
        ];
        let results = vec![
            Ok(Order::from_request(&requests[0], Utc::now())),
            Err(GatewayError::OrderRejected("halted".into())),
        ];

        let accepted = report.record_submissions(&requests, results);

        assert_eq!(accepted.len(), 1);
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset, Asset::crypto("ETH"));
        assert_eq!(report.failures[0].quantity, dec!(2));
        assert!(report.has_activity());
    }

    #[test]
    fn test_lines_use_report_timestamp() {
        let now = Utc::now();
        let mut report = IterationReport::new("test", now);
        report.add_line("current_price", 101.5);

        assert_eq!(report.lines[0].timestamp, now);
        assert!(!report.has_activity());
    }
}
