//! Everything an iteration needs from the host.

use chrono::{DateTime, Utc};
use rotation_core::traits::Gateway;
use rotation_core::types::{Order, OrderRequest};

use crate::report::IterationReport;
use crate::settlement::SettlementStrategy;

/// Inputs for one engine iteration.
pub struct IterationContext<'a> {
    /// Time of the tick
    pub now: DateTime<Utc>,
    /// True only for the very first tick of the run
    pub is_first_call: bool,
    pub gateway: &'a dyn Gateway,
    pub settlement: &'a dyn SettlementStrategy,
}

impl<'a> IterationContext<'a> {
    pub fn new(
        now: DateTime<Utc>,
        is_first_call: bool,
        gateway: &'a dyn Gateway,
        settlement: &'a dyn SettlementStrategy,
    ) -> Self {
        Self {
            now,
            is_first_call,
            gateway,
            settlement,
        }
    }

    /// Submit a batch and record the results. Returns the accepted orders.
    pub async fn submit(
        &self,
        requests: Vec<OrderRequest>,
        report: &mut IterationReport,
    ) -> Vec<Order> {
        if requests.is_empty() {
            return Vec::new();
        }
        let results = self.gateway.submit_orders(requests.clone()).await;
        report.record_submissions(&requests, results)
    }

    /// Wait for `orders` to settle using the configured strategy.
    pub async fn settle(&self, orders: &[Order]) {
        self.settlement.wait(self.gateway, orders).await;
    }
}
