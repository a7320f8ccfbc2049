//! Execution/market-data gateway trait.

use crate::error::GatewayError;
use crate::types::{Asset, BarSeries, Order, OrderRequest, Position, Side, Timeframe};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::warn;

/// Trait for the market-data and execution boundary.
///
/// Engines only read prices and positions through this trait and hand it
/// order requests; everything behind it (venue, settlement, bookkeeping)
/// belongs to the implementation.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch the most recent `count` bars for an asset, oldest first.
    async fn get_historical_prices(
        &self,
        asset: &Asset,
        count: usize,
        timeframe: Timeframe,
    ) -> Result<BarSeries, GatewayError>;

    /// Last traded price of `asset`, expressed in `quote` when given.
    ///
    /// # Returns
    /// `None` when no price is available.
    async fn get_last_price(
        &self,
        asset: &Asset,
        quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError>;

    /// Position for an asset, or `None` if nothing is held.
    async fn get_position(&self, asset: &Asset) -> Result<Option<Position>, GatewayError>;

    /// Held quantity plus the net quantity of orders not yet filled.
    async fn get_asset_potential_total(&self, asset: &Asset) -> Result<Decimal, GatewayError>;

    /// Cash needed to buy one unit of `asset` right now, slippage and
    /// commission included, expressed like [`Gateway::get_last_price`].
    ///
    /// Buys sized as `cash / cost` are always affordable. Gateways that do
    /// not charge anything on top of the last price can rely on the default.
    async fn get_buy_cost(
        &self,
        asset: &Asset,
        quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError> {
        self.get_last_price(asset, quote).await
    }

    /// Total portfolio value (cash plus marked positions).
    async fn get_portfolio_value(&self) -> Result<Decimal, GatewayError>;

    /// Cash available to spend.
    async fn get_cash(&self) -> Result<Decimal, GatewayError>;

    /// Build a market order request.
    fn create_order(
        &self,
        asset: &Asset,
        quantity: Decimal,
        side: Side,
        quote: Option<&Asset>,
    ) -> OrderRequest {
        OrderRequest::market(asset.clone(), side, quantity).with_quote(quote.cloned())
    }

    /// Submit a single order.
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, GatewayError>;

    /// Submit a batch of orders in sequence.
    ///
    /// A failed submission is reported in its slot and does not stop the
    /// rest of the batch.
    async fn submit_orders(&self, requests: Vec<OrderRequest>) -> Vec<Result<Order, GatewayError>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.submit_order(request).await;
            if let Err(e) = &result {
                warn!(error = %e, "order submission failed");
            }
            results.push(result);
        }
        results
    }

    /// Get the current state of an order.
    async fn get_order(&self, order_id: &str) -> Result<Order, GatewayError>;

    /// Blocking pause, used as the fixed settlement wait.
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Get the gateway name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Rejects every order for one symbol, accepts the rest.
    struct RejectingGateway {
        reject_symbol: String,
        submitted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Gateway for RejectingGateway {
        async fn get_historical_prices(
            &self,
            asset: &Asset,
            _count: usize,
            timeframe: Timeframe,
        ) -> Result<BarSeries, GatewayError> {
            Ok(BarSeries::new(asset.clone(), timeframe))
        }

        async fn get_last_price(
            &self,
            _asset: &Asset,
            _quote: Option<&Asset>,
        ) -> Result<Option<Decimal>, GatewayError> {
            Ok(None)
        }

        async fn get_position(&self, _asset: &Asset) -> Result<Option<Position>, GatewayError> {
            Ok(None)
        }

        async fn get_asset_potential_total(&self, _asset: &Asset) -> Result<Decimal, GatewayError> {
            Ok(Decimal::ZERO)
        }

        async fn get_portfolio_value(&self) -> Result<Decimal, GatewayError> {
            Ok(Decimal::ZERO)
        }

        async fn get_cash(&self) -> Result<Decimal, GatewayError> {
            Ok(Decimal::ZERO)
        }

        async fn submit_order(&self, request: OrderRequest) -> Result<Order, GatewayError> {
            if request.asset.symbol == self.reject_symbol {
                return Err(GatewayError::OrderRejected(request.asset.symbol));
            }
            self.submitted.lock().unwrap().push(request.asset.symbol.clone());
            Ok(Order::from_request(&request, Utc::now()))
        }

        async fn get_order(&self, order_id: &str) -> Result<Order, GatewayError> {
            Err(GatewayError::OrderNotFound(order_id.to_string()))
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    #[tokio::test]
    async fn test_submit_orders_continues_after_failure() {
        let gateway = RejectingGateway {
            reject_symbol: "ETH".to_string(),
            submitted: Mutex::new(Vec::new()),
        };

        let requests = vec![
            gateway.create_order(&Asset::crypto("BTC"), dec!(1), Side::Buy, None),
            gateway.create_order(&Asset::crypto("ETH"), dec!(1), Side::Buy, None),
            gateway.create_order(&Asset::crypto("SOL"), dec!(1), Side::Buy, None),
        ];
        let results = gateway.submit_orders(requests).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(*gateway.submitted.lock().unwrap(), vec!["BTC", "SOL"]);
    }

    #[tokio::test]
    async fn test_buy_cost_defaults_to_last_price() {
        let gateway = RejectingGateway {
            reject_symbol: String::new(),
            submitted: Mutex::new(Vec::new()),
        };
        let cost = gateway.get_buy_cost(&Asset::crypto("BTC"), None).await.unwrap();
        assert_eq!(cost, None);
    }

    #[test]
    fn test_create_order_carries_quote() {
        let gateway = RejectingGateway {
            reject_symbol: String::new(),
            submitted: Mutex::new(Vec::new()),
        };
        let usd = Asset::forex("USD");
        let request = gateway.create_order(&Asset::crypto("BTC"), dec!(0.25), Side::Sell, Some(&usd));

        assert_eq!(request.side, Side::Sell);
        assert_eq!(request.quote, Some(usd));
    }
}
