//! Paper gateway for backtesting and simulation.
//!
//! Orders are accepted as `Pending` and fill at the current close when the
//! gateway settles, which happens on every [`Gateway::sleep`] and on every
//! [`PaperGateway::advance_to`]. A sleep therefore costs no wall-clock time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rotation_core::error::GatewayError;
use rotation_core::traits::Gateway;
use rotation_core::types::{
    Asset, Bar, BarSeries, Fill, Order, OrderRequest, OrderStatus, Portfolio, Position, Side,
    Timeframe,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Loaded price history and the simulated clock.
#[derive(Default)]
struct Market {
    history: HashMap<Asset, Vec<Bar>>,
    /// Current time, unix millis
    now: i64,
}

impl Market {
    /// Bars at or before the clock.
    fn visible(&self, asset: &Asset) -> Option<&[Bar]> {
        let bars = self.history.get(asset)?;
        let end = bars.partition_point(|b| b.timestamp <= self.now);
        Some(&bars[..end])
    }

    fn price(&self, asset: &Asset) -> Option<Decimal> {
        let bar = self.visible(asset)?.last()?;
        Decimal::from_f64(bar.close).map(|p| p.round_dp(8))
    }

    fn prices(&self) -> HashMap<Asset, Decimal> {
        self.history
            .keys()
            .filter_map(|asset| self.price(asset).map(|p| (asset.clone(), p)))
            .collect()
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now).unwrap_or_default()
    }
}

/// Paper gateway for simulation.
pub struct PaperGateway {
    portfolio: Arc<Mutex<Portfolio>>,
    orders: Arc<Mutex<HashMap<Uuid, Order>>>,
    market: Arc<Mutex<Market>>,
    slippage_pct: Decimal,
    commission_pct: Decimal,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PaperGateway {
    /// Create a new paper gateway with initial capital.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            portfolio: Arc::new(Mutex::new(Portfolio::new(initial_capital))),
            orders: Arc::new(Mutex::new(HashMap::new())),
            market: Arc::new(Mutex::new(Market::default())),
            slippage_pct: dec!(0.05), // 0.05% slippage
            commission_pct: Decimal::ZERO,
        }
    }

    /// Set slippage percentage.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Set commission as a percentage of fill value.
    pub fn with_commission(mut self, commission_pct: Decimal) -> Self {
        self.commission_pct = commission_pct;
        self
    }

    /// Load price history for an asset. Bars are served at the granularity
    /// they are loaded with.
    pub fn load_history(&self, asset: Asset, mut bars: Vec<Bar>) {
        bars.sort_by_key(|b| b.timestamp);
        lock(&self.market).history.insert(asset, bars);
    }

    /// Move the clock forward, settle pending orders and mark positions.
    pub fn advance_to(&self, timestamp: i64) -> Vec<Order> {
        lock(&self.market).now = timestamp;
        let settled = self.settle_pending();
        self.mark_to_market();
        settled
    }

    /// Current simulated time.
    pub fn now(&self) -> DateTime<Utc> {
        lock(&self.market).now()
    }

    /// Get a snapshot of the portfolio.
    pub fn portfolio_snapshot(&self) -> Portfolio {
        lock(&self.portfolio).clone()
    }

    /// All orders seen so far, oldest first.
    pub fn order_history(&self) -> Vec<Order> {
        let mut orders: Vec<_> = lock(&self.orders).values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    fn mark_to_market(&self) {
        let prices = lock(&self.market).prices();
        lock(&self.portfolio).update_prices(&prices);
    }

    fn fill_price(&self, side: Side, market_price: Decimal) -> Decimal {
        match side {
            Side::Buy => market_price * (dec!(1) + self.slippage_pct / dec!(100)),
            Side::Sell => market_price * (dec!(1) - self.slippage_pct / dec!(100)),
        }
    }

    fn commission(&self, value: Decimal) -> Decimal {
        value * self.commission_pct / dec!(100)
    }

    /// All-in cash cost of one unit bought at `market_price`.
    fn unit_buy_cost(&self, market_price: Decimal) -> Decimal {
        let fill_price = self.fill_price(Side::Buy, market_price);
        fill_price + self.commission(fill_price)
    }

    /// Fill every pending order at the current close. Sells settle first so
    /// their proceeds fund buys from the same batch.
    pub fn settle_pending(&self) -> Vec<Order> {
        let (prices, now) = {
            let market = lock(&self.market);
            (market.prices(), market.now())
        };

        let mut orders = lock(&self.orders);
        let mut pending: Vec<&mut Order> = orders
            .values_mut()
            .filter(|o| o.status.is_active())
            .collect();
        pending.sort_by_key(|o| (o.side == Side::Buy, o.created_at));

        let mut portfolio = lock(&self.portfolio);
        let mut settled = Vec::with_capacity(pending.len());

        for order in pending {
            let Some(&market_price) = prices.get(&order.asset) else {
                warn!(asset = %order.asset, "no price at settlement, rejecting order");
                order.reject(GatewayError::MissingPrice(order.asset.symbol.clone()).to_string());
                settled.push(order.clone());
                continue;
            };

            let quantity = order.remaining_quantity();
            let fill_price = self.fill_price(order.side, market_price);
            let commission = self.commission(fill_price * quantity);

            if order.side == Side::Sell {
                let held = portfolio
                    .get_position(&order.asset)
                    .map(|p| p.quantity)
                    .unwrap_or_default();
                if quantity > held {
                    warn!(asset = %order.asset, %quantity, %held, "sell exceeds holdings, rejecting");
                    order.reject(GatewayError::PositionNotFound(order.asset.symbol.clone()).to_string());
                    settled.push(order.clone());
                    continue;
                }
            } else {
                let cost = self.unit_buy_cost(market_price) * quantity;
                if cost > portfolio.cash {
                    let err = GatewayError::InsufficientFunds {
                        required: cost,
                        available: portfolio.cash,
                    };
                    warn!(asset = %order.asset, error = %err, "rejecting buy at settlement");
                    order.reject(err.to_string());
                    settled.push(order.clone());
                    continue;
                }
            }

            order.add_fill(Fill {
                quantity,
                price: fill_price,
                commission,
                timestamp: now,
            });
            portfolio.apply_fill(&order.asset, order.side, quantity, fill_price, commission);
            debug!(
                asset = %order.asset,
                side = %order.side,
                %quantity,
                price = %fill_price,
                "order filled"
            );
            settled.push(order.clone());
        }

        portfolio.update_prices(&prices);
        settled
    }

    /// Cash committed to buys that have not settled yet.
    fn pending_buy_cost(&self, prices: &HashMap<Asset, Decimal>) -> Decimal {
        lock(&self.orders)
            .values()
            .filter(|o| o.status.is_active() && o.side == Side::Buy)
            .filter_map(|o| Some(self.unit_buy_cost(*prices.get(&o.asset)?) * o.remaining_quantity()))
            .sum()
    }

    /// Net unfilled quantity, positive for buys.
    fn pending_quantity(&self, asset: &Asset) -> Decimal {
        lock(&self.orders)
            .values()
            .filter(|o| o.status.is_active() && &o.asset == asset)
            .map(|o| o.side.sign() * o.remaining_quantity())
            .sum()
    }
}

#[async_trait]
impl Gateway for PaperGateway {
    async fn get_historical_prices(
        &self,
        asset: &Asset,
        count: usize,
        timeframe: Timeframe,
    ) -> Result<BarSeries, GatewayError> {
        let market = lock(&self.market);
        let bars = market
            .visible(asset)
            .ok_or_else(|| GatewayError::MissingHistory(asset.symbol.clone()))?;
        let start = bars.len().saturating_sub(count);
        Ok(BarSeries::from_bars(
            asset.clone(),
            timeframe,
            bars[start..].iter().copied(),
        ))
    }

    async fn get_last_price(
        &self,
        asset: &Asset,
        quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError> {
        let market = lock(&self.market);
        let Some(price) = market.price(asset) else {
            return Ok(None);
        };

        // Untracked quotes are the account currency
        match quote.filter(|q| market.history.contains_key(*q)) {
            Some(quote) => Ok(market
                .price(quote)
                .filter(|q| !q.is_zero())
                .map(|q| price / q)),
            None => Ok(Some(price)),
        }
    }

    async fn get_buy_cost(
        &self,
        asset: &Asset,
        quote: Option<&Asset>,
    ) -> Result<Option<Decimal>, GatewayError> {
        Ok(self
            .get_last_price(asset, quote)
            .await?
            .map(|price| self.unit_buy_cost(price)))
    }

    async fn get_position(&self, asset: &Asset) -> Result<Option<Position>, GatewayError> {
        Ok(lock(&self.portfolio).get_position(asset).cloned())
    }

    async fn get_asset_potential_total(&self, asset: &Asset) -> Result<Decimal, GatewayError> {
        let held = lock(&self.portfolio)
            .get_position(asset)
            .map(|p| p.quantity)
            .unwrap_or_default();
        Ok(held + self.pending_quantity(asset))
    }

    async fn get_portfolio_value(&self) -> Result<Decimal, GatewayError> {
        Ok(lock(&self.portfolio).equity)
    }

    async fn get_cash(&self) -> Result<Decimal, GatewayError> {
        Ok(lock(&self.portfolio).cash)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, GatewayError> {
        if request.quantity <= Decimal::ZERO {
            return Err(GatewayError::OrderRejected(format!(
                "non-positive quantity {} for {}",
                request.quantity, request.asset
            )));
        }

        let (prices, now) = {
            let market = lock(&self.market);
            (market.prices(), market.now())
        };
        let market_price = prices
            .get(&request.asset)
            .copied()
            .ok_or_else(|| GatewayError::MissingPrice(request.asset.symbol.clone()))?;

        if request.side == Side::Buy {
            let required = self.unit_buy_cost(market_price) * request.quantity;
            let available = lock(&self.portfolio).cash - self.pending_buy_cost(&prices);
            if required > available {
                return Err(GatewayError::InsufficientFunds {
                    required,
                    available,
                });
            }
        }

        let order = Order::from_request(&request, now);
        debug!(
            order_id = %order.id,
            pair = %request.asset.pair_symbol(request.quote.as_ref()),
            side = %request.side,
            quantity = %request.quantity,
            "order accepted"
        );
        lock(&self.orders).insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> Result<Order, GatewayError> {
        let uuid = Uuid::parse_str(order_id)
            .map_err(|_| GatewayError::OrderNotFound(order_id.to_string()))?;

        lock(&self.orders)
            .get(&uuid)
            .cloned()
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.to_string()))
    }

    async fn sleep(&self, _duration: Duration) {
        self.settle_pending();
    }

    fn name(&self) -> &str {
        "Paper Gateway"
    }
}
