//! Waiting for submitted orders to settle before dependent orders go out.

use async_trait::async_trait;
use rotation_core::traits::Gateway;
use rotation_core::types::Order;
use std::time::Duration;
use tracing::{debug, warn};

/// Strategy for waiting between a batch of orders and the batch that
/// depends on its proceeds.
#[async_trait]
pub trait SettlementStrategy: Send + Sync {
    /// Wait for `orders` to settle.
    async fn wait(&self, gateway: &dyn Gateway, orders: &[Order]);

    fn name(&self) -> &str;
}

/// Pause for a fixed duration. Gives no guarantee the orders settled.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl SettlementStrategy for FixedDelay {
    async fn wait(&self, gateway: &dyn Gateway, _orders: &[Order]) {
        debug!(delay_ms = self.delay.as_millis() as u64, "settlement delay");
        gateway.sleep(self.delay).await;
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Poll the gateway until every order is terminal or attempts run out.
#[derive(Debug, Clone, Copy)]
pub struct PollOrderStatus {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollOrderStatus {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    async fn all_terminal(gateway: &dyn Gateway, orders: &[Order]) -> bool {
        for order in orders {
            match gateway.get_order(&order.id.to_string()).await {
                Ok(current) if current.status.is_terminal() => {}
                Ok(_) => return false,
                Err(e) => {
                    // An order the gateway no longer knows cannot settle further
                    warn!(order_id = %order.id, error = %e, "order lookup failed");
                }
            }
        }
        true
    }
}

#[async_trait]
impl SettlementStrategy for PollOrderStatus {
    async fn wait(&self, gateway: &dyn Gateway, orders: &[Order]) {
        for attempt in 1..=self.max_attempts {
            gateway.sleep(self.interval).await;
            if Self::all_terminal(gateway, orders).await {
                debug!(attempt, "orders settled");
                return;
            }
        }
        warn!(
            orders = orders.len(),
            attempts = self.max_attempts,
            "orders still open after polling, continuing"
        );
    }

    fn name(&self) -> &str {
        "poll"
    }
}
