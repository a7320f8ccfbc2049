//! Fixed-period portfolio rebalancer.

use async_trait::async_trait;
use rotation_core::error::{EngineError, GatewayError};
use rotation_core::types::{Asset, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::IterationContext;
use crate::engine::Engine;
use crate::report::IterationReport;
use crate::state::EngineState;

/// One basket member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub asset: Asset,
    /// Asset the price is quoted in; account currency when absent
    #[serde(default)]
    pub quote: Option<Asset>,
    /// Target share of portfolio value, in [0, 1]
    pub weight: Decimal,
}

/// Configuration for the rebalance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Iterations between rebalances
    pub period: u32,
    /// Target basket, processed in order
    pub portfolio: Vec<PortfolioEntry>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        let usd = Asset::forex("USD");
        Self {
            period: 10,
            portfolio: vec![
                PortfolioEntry {
                    asset: Asset::crypto("BTC"),
                    quote: Some(usd.clone()),
                    weight: dec!(0.5),
                },
                PortfolioEntry {
                    asset: Asset::crypto("ETH"),
                    quote: Some(usd),
                    weight: dec!(0.5),
                },
            ],
        }
    }
}

impl RebalanceConfig {
    /// Weights are used as given. A basket summing above 1 would ask for
    /// more than the portfolio is worth and is rejected.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.period == 0 {
            return Err(EngineError::InvalidConfig(
                "Rebalance period must be at least 1".into(),
            ));
        }
        if self.portfolio.is_empty() {
            return Err(EngineError::InvalidConfig(
                "At least one portfolio entry required".into(),
            ));
        }
        for entry in &self.portfolio {
            if entry.weight < Decimal::ZERO || entry.weight > Decimal::ONE {
                return Err(EngineError::InvalidConfig(format!(
                    "Weight for {} must be between 0 and 1",
                    entry.asset
                )));
            }
        }
        let total: Decimal = self.portfolio.iter().map(|e| e.weight).sum();
        if total > Decimal::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "Portfolio weights sum to {}, above 1",
                total
            )));
        }
        Ok(())
    }
}

/// Market state for one basket member.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceInput {
    pub asset: Asset,
    pub quote: Option<Asset>,
    pub weight: Decimal,
    /// Last price in terms of `quote`
    pub price: Decimal,
    /// Cash needed per unit bought, fees included
    pub buy_cost: Decimal,
    /// Held plus pending quantity
    pub current_quantity: Decimal,
}

/// An order the plan calls for.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOrder {
    pub asset: Asset,
    pub quote: Option<Asset>,
    pub side: Side,
    pub quantity: Decimal,
    /// Cash per unit for buys, last price for sells
    pub unit_cost: Decimal,
}

/// Orders needed to reach the target weights, split by side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalancePlan {
    pub sells: Vec<PlannedOrder>,
    pub buys: Vec<PlannedOrder>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.sells.is_empty() && self.buys.is_empty()
    }
}

/// Absolute quantity truncated toward zero at two decimals.
pub fn truncate_quantity(quantity: Decimal) -> Decimal {
    (quantity.abs() * dec!(100)).trunc() / dec!(100)
}

/// Compute the orders that move each member to `portfolio_value * weight`.
///
/// The side comes from the target at the last price. Buys are then sized on
/// `buy_cost`, so the cash spent on a member, fees included, stays within its
/// share of the portfolio.
pub fn plan_rebalance(portfolio_value: Decimal, inputs: &[RebalanceInput]) -> RebalancePlan {
    let mut plan = RebalancePlan::default();

    for input in inputs {
        if input.price <= Decimal::ZERO {
            continue;
        }
        let allocation = portfolio_value * input.weight;
        let delta = allocation / input.price - input.current_quantity;

        let Some(side) = Side::from_delta(delta) else {
            continue;
        };
        let (quantity, unit_cost) = match side {
            Side::Sell => (truncate_quantity(delta), input.price),
            Side::Buy => {
                let unit_cost = input.buy_cost.max(input.price);
                let wanted = allocation / unit_cost - input.current_quantity;
                if wanted <= Decimal::ZERO {
                    continue;
                }
                (truncate_quantity(wanted), unit_cost)
            }
        };
        if quantity.is_zero() {
            continue;
        }

        let order = PlannedOrder {
            asset: input.asset.clone(),
            quote: input.quote.clone(),
            side,
            quantity,
            unit_cost,
        };
        match side {
            Side::Sell => plan.sells.push(order),
            Side::Buy => plan.buys.push(order),
        }
    }

    plan
}

/// Cap planned buys, in order, to the cash on hand.
///
/// A buy that no longer fits is shrunk to what is left; one that shrinks to
/// zero is dropped.
pub fn fit_buys_to_cash(buys: &[PlannedOrder], cash: Decimal) -> Vec<PlannedOrder> {
    let mut remaining = cash.max(Decimal::ZERO);
    let mut fitted = Vec::with_capacity(buys.len());

    for order in buys {
        let mut order = order.clone();
        if order.unit_cost * order.quantity > remaining {
            let affordable = truncate_quantity(remaining / order.unit_cost);
            warn!(
                asset = %order.asset,
                planned = %order.quantity,
                affordable = %affordable,
                "not enough cash for planned buy, shrinking"
            );
            if affordable.is_zero() {
                continue;
            }
            order.quantity = affordable;
        }
        remaining -= order.unit_cost * order.quantity;
        fitted.push(order);
    }

    fitted
}

/// Unwrap a per-entry gateway lookup, turning skippable errors into `None`.
fn skip_missing<T>(
    result: Result<Option<T>, GatewayError>,
    pair: &str,
) -> Result<Option<T>, EngineError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            let err = EngineError::from(e);
            if !err.is_skippable() {
                return Err(err);
            }
            warn!(pair, error = %err, "lookup failed, skipping entry");
            Ok(None)
        }
    }
}

/// Fixed-period rebalance engine.
pub struct RebalanceEngine {
    config: RebalanceConfig,
}

impl RebalanceEngine {
    /// Create a new rebalance engine.
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    async fn gather_inputs(
        &self,
        ctx: &IterationContext<'_>,
    ) -> Result<Vec<RebalanceInput>, EngineError> {
        let mut inputs = Vec::with_capacity(self.config.portfolio.len());

        for entry in &self.config.portfolio {
            let quote = entry.quote.as_ref();
            let pair = entry.asset.pair_symbol(quote);

            let price = ctx.gateway.get_last_price(&entry.asset, quote).await;
            let Some(price) = skip_missing(price, &pair)? else {
                warn!(pair = %pair, "no price, skipping entry");
                continue;
            };
            let buy_cost = ctx.gateway.get_buy_cost(&entry.asset, quote).await;
            let buy_cost = skip_missing(buy_cost, &pair)?.unwrap_or(price);

            let current_quantity = ctx
                .gateway
                .get_asset_potential_total(&entry.asset)
                .await
                .map(Some);
            let Some(current_quantity) = skip_missing(current_quantity, &pair)? else {
                continue;
            };

            inputs.push(RebalanceInput {
                asset: entry.asset.clone(),
                quote: entry.quote.clone(),
                weight: entry.weight,
                price,
                buy_cost,
                current_quantity,
            });
        }

        Ok(inputs)
    }

    async fn rebalance(
        &self,
        ctx: &IterationContext<'_>,
        report: &mut IterationReport,
    ) -> Result<(), EngineError> {
        let portfolio_value = ctx.gateway.get_portfolio_value().await?;
        let inputs = self.gather_inputs(ctx).await?;
        let plan = plan_rebalance(portfolio_value, &inputs);

        if plan.is_empty() {
            info!("portfolio already on target, no orders");
            report.set_action("rebalance: no orders");
            return Ok(());
        }

        info!(
            sells = plan.sells.len(),
            buys = plan.buys.len(),
            portfolio_value = %portfolio_value,
            "rebalancing"
        );
        report.set_action(format!(
            "rebalance: {} sells, {} buys",
            plan.sells.len(),
            plan.buys.len()
        ));

        let to_requests = |orders: &[PlannedOrder]| {
            orders
                .iter()
                .map(|o| {
                    ctx.gateway
                        .create_order(&o.asset, o.quantity, o.side, o.quote.as_ref())
                })
                .collect::<Vec<_>>()
        };

        let sells = ctx.submit(to_requests(&plan.sells), report).await;
        if plan.buys.is_empty() {
            return Ok(());
        }
        if !plan.sells.is_empty() {
            ctx.settle(&sells).await;
        }

        let cash = ctx.gateway.get_cash().await?;
        let buys = fit_buys_to_cash(&plan.buys, cash);
        ctx.submit(to_requests(&buys), report).await;

        Ok(())
    }
}

#[async_trait]
impl Engine for RebalanceEngine {
    fn name(&self) -> &str {
        "Periodic Rebalance"
    }

    fn description(&self) -> &str {
        "Rebalances a weighted basket back to its target weights every N iterations"
    }

    async fn on_iteration(
        &self,
        ctx: &IterationContext<'_>,
        state: &mut EngineState,
    ) -> Result<IterationReport, EngineError> {
        let mut report = IterationReport::new(self.name(), ctx.now);
        let period = self.config.period;

        let result = if state.rebalance.begin(period) {
            self.rebalance(ctx, &mut report).await
        } else {
            info!(
                counter = state.rebalance.counter.unwrap_or_default(),
                period, "waiting for next rebalance"
            );
            Ok(())
        };
        state.rebalance.finish();

        result.map(|_| report)
    }
}
