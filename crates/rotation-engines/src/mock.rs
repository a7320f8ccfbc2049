//! Recording gateway for engine tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rotation_core::error::GatewayError;
use rotation_core::traits::Gateway;
use rotation_core::types::{
    Asset, Bar, BarSeries, Fill, Order, OrderRequest, OrderStatus, Position, Side, Timeframe,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Submit {
        side: Side,
        symbol: String,
        quantity: Decimal,
    },
    Sleep(Duration),
}

#[derive(Default)]
struct Inner {
    prices: HashMap<Asset, Decimal>,
    positions: HashMap<Asset, Decimal>,
    potential: HashMap<Asset, Decimal>,
    history: HashMap<Asset, Vec<f64>>,
    portfolio_value: Decimal,
    cash: Decimal,
    rejected: HashSet<String>,
    price_errors: HashSet<String>,
    buy_costs: HashMap<Asset, Decimal>,
    orders: HashMap<String, Order>,
    events: Vec<Event>,
    fill_on_sleep: bool,
}

/// Gateway with canned market state that records every submission and sleep.
#[derive(Default)]
pub struct MockGateway {
    inner: Mutex<Inner>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, asset: &Asset, price: Decimal) -> Self {
        self.inner.lock().unwrap().prices.insert(asset.clone(), price);
        self
    }

    pub fn with_position(self, asset: &Asset, quantity: Decimal) -> Self {
        self.inner
            .lock()
            .unwrap()
            .positions
            .insert(asset.clone(), quantity);
        self
    }

    /// Potential total for an asset, if it differs from the held quantity.
    pub fn with_potential(self, asset: &Asset, quantity: Decimal) -> Self {
        self.inner
            .lock()
            .unwrap()
            .potential
            .insert(asset.clone(), quantity);
        self
    }

    pub fn with_history(self, asset: &Asset, closes: Vec<f64>) -> Self {
        self.inner.lock().unwrap().history.insert(asset.clone(), closes);
        self
    }

    pub fn with_portfolio_value(self, value: Decimal) -> Self {
        self.inner.lock().unwrap().portfolio_value = value;
        self
    }

    pub fn with_cash(self, cash: Decimal) -> Self {
        self.inner.lock().unwrap().cash = cash;
        self
    }

    pub fn rejecting(self, symbol: &str) -> Self {
        self.inner.lock().unwrap().rejected.insert(symbol.to_string());
        self
    }

    /// Make `get_last_price` fail with `MissingPrice` for this symbol.
    pub fn failing_price(self, symbol: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .price_errors
            .insert(symbol.to_string());
        self
    }

    /// All-in unit buy cost, if it differs from the last price.
    pub fn with_buy_cost(self, asset: &Asset, cost: Decimal) -> Self {
        self.inner.lock().unwrap().buy_costs.insert(asset.clone(), cost);
        self
    }

    pub fn fill_on_sleep(&self, enabled: bool) {
        self.inner.lock().unwrap().fill_on_sleep = enabled;
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Submissions only, as (side, symbol, quantity).
    pub fn submissions(&self) -> Vec<(Side, String, Decimal)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Submit {
                    side,
                    symbol,
                    quantity,
                } => Some((side, symbol, quantity)),
                Event::Sleep(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_historical_prices(
        &self,
        asset: &Asset,
        count: usize,
        timeframe: Timeframe,
    ) -> Result<BarSeries, GatewayError> {
        let inner = self.inner.lock().unwrap();
        let closes = inner.history.get(asset).cloned().unwrap_or_default();
        let start = closes.len().saturating_sub(count);
        let bars = closes[start..]
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar::flat(i as i64 * timeframe.as_millis() as i64, close));
        Ok(BarSeries::from_bars(asset.clone(), timeframe, bars))
    }

    async fn get_last_price(
        &self,
        asset: &Asset,
        _quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError> {
        let inner = self.inner.lock().unwrap();
        if inner.price_errors.contains(&asset.symbol) {
            return Err(GatewayError::MissingPrice(asset.symbol.clone()));
        }
        Ok(inner.prices.get(asset).copied())
    }

    async fn get_buy_cost(
        &self,
        asset: &Asset,
        quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError> {
        let cost = self.inner.lock().unwrap().buy_costs.get(asset).copied();
        match cost {
            Some(cost) => Ok(Some(cost)),
            None => self.get_last_price(asset, quote).await,
        }
    }

    async fn get_position(&self, asset: &Asset) -> Result<Option<Position>, GatewayError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.positions.get(asset).map(|&quantity| {
            let price = inner.prices.get(asset).copied().unwrap_or_default();
            Position::new(asset.clone(), quantity, price)
        }))
    }

    async fn get_asset_potential_total(&self, asset: &Asset) -> Result<Decimal, GatewayError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .potential
            .get(asset)
            .or_else(|| inner.positions.get(asset))
            .copied()
            .unwrap_or_default())
    }

    async fn get_portfolio_value(&self) -> Result<Decimal, GatewayError> {
        Ok(self.inner.lock().unwrap().portfolio_value)
    }

    async fn get_cash(&self) -> Result<Decimal, GatewayError> {
        Ok(self.inner.lock().unwrap().cash)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, GatewayError> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(Event::Submit {
            side: request.side,
            symbol: request.asset.symbol.clone(),
            quantity: request.quantity,
        });
        if inner.rejected.contains(&request.asset.symbol) {
            return Err(GatewayError::OrderRejected(request.asset.symbol));
        }
        let created_at = Utc.timestamp_opt(0, 0).unwrap();
        let order = Order::from_request(&request, created_at);
        inner.orders.insert(order.id.to_string(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> Result<Order, GatewayError> {
        self.inner
            .lock()
            .unwrap()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.to_string()))
    }

    async fn sleep(&self, duration: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(Event::Sleep(duration));
        if inner.fill_on_sleep {
            for order in inner.orders.values_mut() {
                if order.status == OrderStatus::Pending {
                    let fill = Fill {
                        quantity: order.quantity,
                        price: Decimal::ONE,
                        commission: Decimal::ZERO,
                        timestamp: order.created_at,
                    };
                    order.add_fill(fill);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
