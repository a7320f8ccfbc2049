//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Asset;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side implied by a signed quantity delta. `None` when the delta is zero.
    pub fn from_delta(delta: Decimal) -> Option<Self> {
        if delta > Decimal::ZERO {
            Some(Side::Buy)
        } else if delta < Decimal::ZERO {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted by the gateway, not yet settled
    Pending,
    /// Order partially filled
    PartiallyFilled,
    /// Order completely filled
    Filled,
    /// Order canceled
    Canceled,
    /// Order rejected at settlement
    Rejected,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }

    /// Check if the order is active (can still be filled).
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }
}

/// Market order request, created transiently and handed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Asset to trade
    pub asset: Asset,
    /// Quote asset the quantity is priced in, if not the account currency
    pub quote: Option<Asset>,
    /// Buy or sell
    pub side: Side,
    /// Quantity to trade
    pub quantity: Decimal,
    /// Client-provided order ID
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a market order request.
    pub fn market(asset: Asset, side: Side, quantity: Decimal) -> Self {
        Self {
            asset,
            quote: None,
            side,
            quantity,
            client_order_id: None,
        }
    }

    /// Set the quote asset.
    pub fn with_quote(mut self, quote: Option<Asset>) -> Self {
        self.quote = quote;
        self
    }
}

/// A fill represents a partial or complete execution of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Quantity filled
    pub quantity: Decimal,
    /// Price at which the fill occurred
    pub price: Decimal,
    /// Commission charged
    pub commission: Decimal,
    /// Timestamp of the fill
    pub timestamp: DateTime<Utc>,
}

/// Order handle returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Client-provided order ID
    pub client_order_id: String,
    /// Asset traded
    pub asset: Asset,
    /// Quote asset, if any
    pub quote: Option<Asset>,
    /// Buy or sell
    pub side: Side,
    /// Requested quantity
    pub quantity: Decimal,
    /// Current status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub filled_quantity: Decimal,
    /// Average fill price
    pub filled_avg_price: Option<Decimal>,
    /// List of fills
    pub fills: Vec<Fill>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was filled
    pub filled_at: Option<DateTime<Utc>>,
    /// Why the order was rejected, if it was
    pub reject_reason: Option<String>,
}

impl Order {
    /// Create a new pending order from a request.
    pub fn from_request(request: &OrderRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_order_id: request
                .client_order_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            asset: request.asset.clone(),
            quote: request.quote.clone(),
            side: request.side,
            quantity: request.quantity,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            filled_avg_price: None,
            fills: Vec::new(),
            created_at,
            filled_at: None,
            reject_reason: None,
        }
    }

    /// Get the remaining quantity to be filled.
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// Add a fill to the order.
    pub fn add_fill(&mut self, fill: Fill) {
        let total_qty = self.filled_quantity + fill.quantity;
        let total_value = self.filled_avg_price.unwrap_or(Decimal::ZERO) * self.filled_quantity
            + fill.price * fill.quantity;

        if total_qty > Decimal::ZERO {
            self.filled_avg_price = Some(total_value / total_qty);
        }
        self.filled_quantity = total_qty;

        if self.filled_quantity >= self.quantity {
            self.status = OrderStatus::Filled;
            self.filled_at = Some(fill.timestamp);
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }
        self.fills.push(fill);
    }

    /// Mark the order rejected.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.status = OrderStatus::Rejected;
        self.reject_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_request_market() {
        let request = OrderRequest::market(Asset::crypto("BTC"), Side::Buy, dec!(0.5))
            .with_quote(Some(Asset::forex("USD")));
        assert_eq!(request.asset.symbol, "BTC");
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.quantity, dec!(0.5));
        assert_eq!(request.quote, Some(Asset::forex("USD")));
    }

    #[test]
    fn test_side_from_delta() {
        assert_eq!(Side::from_delta(dec!(1.5)), Some(Side::Buy));
        assert_eq!(Side::from_delta(dec!(-0.01)), Some(Side::Sell));
        assert_eq!(Side::from_delta(Decimal::ZERO), None);
    }

    #[test]
    fn test_order_add_fill() {
        let request = OrderRequest::market(Asset::stock("USFR"), Side::Buy, dec!(100));
        let mut order = Order::from_request(&request, Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);

        order.add_fill(Fill {
            quantity: dec!(50),
            price: dec!(50.00),
            commission: Decimal::ZERO,
            timestamp: Utc::now(),
        });
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_quantity(), dec!(50));

        order.add_fill(Fill {
            quantity: dec!(50),
            price: dec!(52.00),
            commission: Decimal::ZERO,
            timestamp: Utc::now(),
        });
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_avg_price, Some(dec!(51.00)));
    }

    #[test]
    fn test_reject_is_terminal() {
        let request = OrderRequest::market(Asset::crypto("ETH"), Side::Buy, dec!(1));
        let mut order = Order::from_request(&request, Utc::now());
        order.reject("insufficient funds");

        assert!(order.status.is_terminal());
        assert!(!order.status.is_active());
        assert_eq!(order.reject_reason.as_deref(), Some("insufficient funds"));
    }
}
