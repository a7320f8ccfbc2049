//! Band/EMA rotation engine.
//!
//! Each iteration computes Bollinger Bands and a fast/slow EMA pair over the
//! primary asset's history, updates the trend streak, and then takes at most
//! one action in priority order:
//! 1. streak above threshold: hold primary and secondary side by side
//! 2. first iteration: buy primary
//! 3. price below lower band: buy primary
//! 4. price above upper band: rotate primary into fixed income
//! 5. otherwise hold

use async_trait::async_trait;
use rotation_core::error::{EngineError, IndicatorError};
use rotation_core::traits::{Indicator, MultiOutputIndicator};
use rotation_core::types::{Asset, Side, Timeframe};
use rotation_indicators::{BollingerBands, Ema};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::context::IterationContext;
use crate::engine::Engine;
use crate::report::IterationReport;
use crate::state::{EngineState, SignalState};

/// Configuration for the signal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Primary risk asset
    pub asset: Asset,
    /// Asset bought alongside the primary during a trend streak
    pub secondary_asset: Asset,
    /// Cash-equivalent held while out of the primary
    pub fixed_income: Asset,
    /// Bollinger window in days
    pub bbands_length_days: usize,
    /// Bollinger standard deviation multiplier
    pub bbands_std_dev: f64,
    /// Fast EMA span in days
    pub fast_ema_length_days: usize,
    /// Slow EMA span in days
    pub slow_ema_length_days: usize,
    /// Streak length the trend counter must exceed
    pub days_length_supertrend: u32,
    /// Bar granularity of the history
    pub timeframe: Timeframe,
    /// Share of portfolio value for an ordinary primary buy
    pub primary_weight: Decimal,
    /// Share of portfolio value per asset during a trend streak
    pub supertrend_weight: Decimal,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            asset: Asset::crypto("BTC"),
            secondary_asset: Asset::crypto("ETH"),
            fixed_income: Asset::stock("USFR"),
            bbands_length_days: 20,
            bbands_std_dev: 2.0,
            fast_ema_length_days: 20,
            slow_ema_length_days: 50,
            days_length_supertrend: 5,
            timeframe: Timeframe::Daily,
            primary_weight: dec!(0.9),
            supertrend_weight: dec!(0.45),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.bbands_length_days == 0
            || self.fast_ema_length_days == 0
            || self.slow_ema_length_days == 0
        {
            return Err(EngineError::InvalidConfig(
                "Band and EMA lengths must be at least one day".into(),
            ));
        }
        if self.bbands_window() < 2 {
            return Err(EngineError::InvalidConfig(
                "Band window must cover at least 2 bars".into(),
            ));
        }
        if self.bbands_std_dev <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "Band std dev must be positive".into(),
            ));
        }
        for (name, weight) in [
            ("primary_weight", self.primary_weight),
            ("supertrend_weight", self.supertrend_weight),
        ] {
            if weight < Decimal::ZERO || weight > Decimal::ONE {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        if self.supertrend_weight * dec!(2) > Decimal::ONE {
            return Err(EngineError::InvalidConfig(
                "supertrend_weight is applied to two assets and must not exceed 0.5".into(),
            ));
        }
        if self.asset == self.fixed_income || self.secondary_asset == self.fixed_income {
            return Err(EngineError::InvalidConfig(
                "Fixed income asset must differ from the traded assets".into(),
            ));
        }
        Ok(())
    }

    /// Bars of history fetched per iteration.
    pub fn lookback_bars(&self) -> usize {
        let days = self
            .bbands_length_days
            .max(self.fast_ema_length_days)
            .max(self.slow_ema_length_days);
        self.timeframe.bars_for_days(days)
    }

    pub fn bbands_window(&self) -> usize {
        self.timeframe.bars_for_days(self.bbands_length_days)
    }

    pub fn fast_ema_span(&self) -> usize {
        self.timeframe.bars_for_days(self.fast_ema_length_days)
    }

    pub fn slow_ema_span(&self) -> usize {
        self.timeframe.bars_for_days(self.slow_ema_length_days)
    }
}

/// Indicator values for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub upper: f64,
    pub lower: f64,
    pub fast_ema: f64,
    pub slow_ema: f64,
}

impl IndicatorSnapshot {
    /// Compute the snapshot from closes (oldest first) and the current price.
    pub fn compute(
        closes: &[f64],
        price: f64,
        config: &SignalConfig,
    ) -> Result<Self, IndicatorError> {
        let bands = BollingerBands::with_params(config.bbands_window(), config.bbands_std_dev)
            .latest(closes)?;
        let fast_ema = Ema::adjusted(config.fast_ema_span()).latest(closes)?;
        let slow_ema = Ema::adjusted(config.slow_ema_span()).latest(closes)?;

        Ok(Self {
            price,
            upper: bands.upper,
            lower: bands.lower,
            fast_ema,
            slow_ema,
        })
    }
}

/// Why the primary asset is being bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyReason {
    FirstIteration,
    BelowLowerBand,
}

/// Outcome of the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Trend streak above threshold: buy primary and secondary
    Supertrend { streak: u32 },
    BuyPrimary { reason: BuyReason },
    SellPrimary,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Supertrend { streak } => write!(f, "supertrend ({} bars)", streak),
            Decision::BuyPrimary {
                reason: BuyReason::FirstIteration,
            } => write!(f, "buy primary (first iteration)"),
            Decision::BuyPrimary {
                reason: BuyReason::BelowLowerBand,
            } => write!(f, "buy primary (below lower band)"),
            Decision::SellPrimary => write!(f, "sell primary (above upper band)"),
            Decision::Hold => write!(f, "hold"),
        }
    }
}

/// Update the trend streak and pick the action for this iteration.
pub fn decide(
    state: &mut SignalState,
    snapshot: &IndicatorSnapshot,
    is_first_call: bool,
    config: &SignalConfig,
) -> Decision {
    state.observe_trend(snapshot.fast_ema > snapshot.slow_ema);

    if state.supertrend_counter > config.days_length_supertrend {
        Decision::Supertrend {
            streak: state.supertrend_counter,
        }
    } else if is_first_call {
        Decision::BuyPrimary {
            reason: BuyReason::FirstIteration,
        }
    } else if snapshot.price < snapshot.lower {
        Decision::BuyPrimary {
            reason: BuyReason::BelowLowerBand,
        }
    } else if snapshot.price > snapshot.upper {
        Decision::SellPrimary
    } else {
        Decision::Hold
    }
}

/// Band/EMA rotation engine.
pub struct SignalEngine {
    config: SignalConfig,
}

impl SignalEngine {
    /// Create a new signal engine.
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    async fn snapshot(&self, ctx: &IterationContext<'_>) -> Result<IndicatorSnapshot, EngineError> {
        let asset = &self.config.asset;
        let series = ctx
            .gateway
            .get_historical_prices(asset, self.config.lookback_bars(), self.config.timeframe)
            .await?;
        if series.is_empty() {
            return Err(EngineError::MissingData(format!("no history for {}", asset)));
        }

        let price = ctx
            .gateway
            .get_last_price(asset, None)
            .await?
            .and_then(|p| p.to_f64())
            .ok_or_else(|| EngineError::MissingData(format!("no price for {}", asset)))?;

        Ok(IndicatorSnapshot::compute(&series.closes(), price, &self.config)?)
    }

    /// Sell the whole fixed income position and wait for it to settle.
    async fn liquidate_fixed_income(
        &self,
        ctx: &IterationContext<'_>,
        report: &mut IterationReport,
    ) -> Result<(), EngineError> {
        let gateway = ctx.gateway;
        let fixed_income = &self.config.fixed_income;
        if let Some(position) = gateway.get_position(fixed_income).await? {
            info!(asset = %fixed_income, quantity = %position.quantity, "liquidating fixed income");
            let request = gateway.create_order(fixed_income, position.quantity, Side::Sell, None);
            let orders = ctx.submit(vec![request], report).await;
            ctx.settle(&orders).await;
        }
        Ok(())
    }

    /// Buy `weight` of portfolio value in each asset not already held.
    ///
    /// Fixed income is liquidated once, before the first buy.
    async fn buy_assets(
        &self,
        ctx: &IterationContext<'_>,
        assets: &[&Asset],
        weight: Decimal,
        report: &mut IterationReport,
    ) -> Result<(), EngineError> {
        let gateway = ctx.gateway;

        let mut to_buy = Vec::with_capacity(assets.len());
        for &asset in assets {
            if gateway.get_position(asset).await?.is_some() {
                info!(asset = %asset, "position already held, not buying");
            } else {
                to_buy.push(asset);
            }
        }
        if to_buy.is_empty() {
            return Ok(());
        }

        self.liquidate_fixed_income(ctx, report).await?;
        let portfolio_value = gateway.get_portfolio_value().await?;

        for asset in to_buy {
            let price = gateway.get_last_price(asset, None).await?;
            let cost = match gateway.get_buy_cost(asset, None).await? {
                Some(cost) if cost > Decimal::ZERO => cost,
                _ => {
                    warn!(asset = %asset, "no price, skipping buy");
                    continue;
                }
            };

            let quantity = portfolio_value * weight / cost;
            if quantity > Decimal::ZERO {
                info!(asset = %asset, quantity = %quantity, unit_cost = %cost, "buying");
                let request = gateway.create_order(asset, quantity, Side::Buy, None);
                if !ctx.submit(vec![request], report).await.is_empty() {
                    report.add_marker(asset, Side::Buy, price);
                }
            }
        }
        Ok(())
    }

    /// Liquidate `asset` and park the proceeds in fixed income.
    async fn sell_asset(
        &self,
        ctx: &IterationContext<'_>,
        asset: &Asset,
        report: &mut IterationReport,
    ) -> Result<(), EngineError> {
        let gateway = ctx.gateway;
        let price = gateway.get_last_price(asset, None).await?;

        let Some(position) = gateway.get_position(asset).await? else {
            debug!(asset = %asset, "no position to sell");
            return Ok(());
        };

        info!(asset = %asset, quantity = %position.quantity, "selling");
        let request = gateway.create_order(asset, position.quantity, Side::Sell, None);
        let orders = ctx.submit(vec![request], report).await;
        if orders.is_empty() {
            warn!(asset = %asset, "liquidation refused, keeping cash where it is");
            return Ok(());
        }
        report.add_marker(asset, Side::Sell, price);
        ctx.settle(&orders).await;

        let fixed_income = &self.config.fixed_income;
        let cash = gateway.get_cash().await?;
        let cost = match gateway.get_buy_cost(fixed_income, None).await? {
            Some(cost) if cost > Decimal::ZERO => cost,
            _ => {
                warn!(asset = %fixed_income, "no price, leaving proceeds in cash");
                return Ok(());
            }
        };

        let quantity = (cash / cost).floor();
        if quantity > Decimal::ZERO {
            info!(asset = %fixed_income, quantity = %quantity, "buying fixed income");
            let request = gateway.create_order(fixed_income, quantity, Side::Buy, None);
            ctx.submit(vec![request], report).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for SignalEngine {
    fn name(&self) -> &str {
        "Band Rotation"
    }

    fn description(&self) -> &str {
        "Rotates between a risk asset and fixed income on Bollinger Band breaks and EMA trend streaks"
    }

    async fn on_iteration(
        &self,
        ctx: &IterationContext<'_>,
        state: &mut EngineState,
    ) -> Result<IterationReport, EngineError> {
        let snapshot = self.snapshot(ctx).await?;

        let mut report = IterationReport::new(self.name(), ctx.now);
        report.add_line("current_price", snapshot.price);
        report.add_line("current_upper", snapshot.upper);
        report.add_line("current_lower", snapshot.lower);
        report.add_line("current_slow_ema", snapshot.slow_ema);
        report.add_line("current_fast_ema", snapshot.fast_ema);

        let decision = decide(&mut state.signal, &snapshot, ctx.is_first_call, &self.config);
        info!(
            decision = %decision,
            price = snapshot.price,
            lower = snapshot.lower,
            upper = snapshot.upper,
            streak = state.signal.supertrend_counter,
            "signal evaluated"
        );
        report.set_action(decision.to_string());

        match decision {
            Decision::Supertrend { .. } => {
                let assets = [&self.config.asset, &self.config.secondary_asset];
                self.buy_assets(ctx, &assets, self.config.supertrend_weight, &mut report)
                    .await?;
            }
            Decision::BuyPrimary { .. } => {
                let assets = [&self.config.asset];
                self.buy_assets(ctx, &assets, self.config.primary_weight, &mut report)
                    .await?;
            }
            Decision::SellPrimary => {
                self.sell_asset(ctx, &self.config.asset, &mut report).await?;
            }
            Decision::Hold => {}
        }

        Ok(report)
    }
}
