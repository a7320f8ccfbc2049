//! Position and portfolio types.

use num_traits::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Asset, Side};

/// A position in a single asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Asset held
    pub asset: Asset,
    /// Quantity held (positive for long, negative for short)
    pub quantity: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Current market price
    pub current_price: Decimal,
    /// Market value (quantity * current_price)
    pub market_value: Decimal,
    /// Realized profit/loss from closed portions
    pub realized_pnl: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(asset: Asset, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            asset,
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: quantity * avg_entry_price,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Check if the position is flat.
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Unrealized profit/loss at the current price.
    pub fn unrealized_pnl(&self) -> Decimal {
        (self.current_price - self.avg_entry_price) * self.quantity
    }

    /// Update the current market price and recalculate values.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
    }

    /// Apply a fill to the position.
    /// Returns the realized P&L if the position is being reduced.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        let fill_qty = side.sign() * quantity;
        let mut realized = Decimal::ZERO;

        let same_direction = (self.quantity > Decimal::ZERO && fill_qty > Decimal::ZERO)
            || (self.quantity < Decimal::ZERO && fill_qty < Decimal::ZERO);

        if same_direction || self.quantity == Decimal::ZERO {
            let total_cost = self.quantity * self.avg_entry_price + fill_qty * price;
            let new_quantity = self.quantity + fill_qty;

            if new_quantity != Decimal::ZERO {
                self.avg_entry_price = total_cost / new_quantity;
            }
            self.quantity = new_quantity;
        } else {
            let close_qty = fill_qty.abs().min(self.quantity.abs());

            realized = if self.quantity > Decimal::ZERO {
                close_qty * (price - self.avg_entry_price)
            } else {
                close_qty * (self.avg_entry_price - price)
            };
            self.realized_pnl += realized;

            let remaining = fill_qty.abs() - close_qty;
            if remaining > Decimal::ZERO {
                // Position reversed
                self.quantity = fill_qty.signum() * remaining;
                self.avg_entry_price = price;
            } else {
                self.quantity += fill_qty;
            }
        }

        self.update_price(price);
        realized
    }
}

/// Portfolio containing cash and positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Available cash
    pub cash: Decimal,
    /// Total equity (cash + market value of positions)
    pub equity: Decimal,
    /// Map of asset to position
    pub positions: HashMap<Asset, Position>,
    /// Total realized P&L across all positions
    pub total_realized_pnl: Decimal,
    /// Initial capital (for calculating returns)
    pub initial_capital: Decimal,
}

impl Portfolio {
    /// Create a new portfolio with initial cash.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            positions: HashMap::new(),
            total_realized_pnl: Decimal::ZERO,
            initial_capital,
        }
    }

    /// Get a position by asset. Flat positions are reported as absent.
    pub fn get_position(&self, asset: &Asset) -> Option<&Position> {
        self.positions.get(asset).filter(|p| !p.is_flat())
    }

    /// Apply a fill: move cash, update the position, drop it once flat.
    pub fn apply_fill(
        &mut self,
        asset: &Asset,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        commission: Decimal,
    ) -> Decimal {
        let value = quantity * price;
        match side {
            Side::Buy => self.cash -= value + commission,
            Side::Sell => self.cash += value - commission,
        }

        let position = self
            .positions
            .entry(asset.clone())
            .or_insert_with(|| Position::new(asset.clone(), Decimal::ZERO, Decimal::ZERO));
        let realized = position.apply_fill(side, quantity, price);
        self.total_realized_pnl += realized;

        if position.is_flat() {
            self.positions.remove(asset);
        }

        self.update_equity();
        realized
    }

    /// Update the equity from cash and position values.
    pub fn update_equity(&mut self) {
        let market_value: Decimal = self.positions.values().map(|p| p.market_value).sum();
        self.equity = self.cash + market_value;
    }

    /// Update all positions with current market prices.
    pub fn update_prices(&mut self, prices: &HashMap<Asset, Decimal>) {
        for (asset, position) in self.positions.iter_mut() {
            if let Some(&price) = prices.get(asset) {
                position.update_price(price);
            }
        }
        self.update_equity();
    }

    /// Calculate total return percentage.
    pub fn total_return(&self) -> Decimal {
        if self.initial_capital == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.equity - self.initial_capital) / self.initial_capital * Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_apply_fill_increase() {
        let mut position = Position::new(Asset::crypto("BTC"), dec!(1), dec!(150.00));

        let realized = position.apply_fill(Side::Buy, dec!(1), dec!(160.00));
        assert_eq!(realized, Decimal::ZERO);
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.avg_entry_price, dec!(155.00));
    }

    #[test]
    fn test_position_apply_fill_close() {
        let mut position = Position::new(Asset::stock("USFR"), dec!(100), dec!(50.00));

        let realized = position.apply_fill(Side::Sell, dec!(100), dec!(50.10));
        assert_eq!(realized, dec!(10.00));
        assert!(position.is_flat());
    }

    #[test]
    fn test_portfolio_apply_fill_moves_cash() {
        let btc = Asset::crypto("BTC");
        let mut portfolio = Portfolio::new(dec!(10000));

        portfolio.apply_fill(&btc, Side::Buy, dec!(0.5), dec!(10000), dec!(5));
        assert_eq!(portfolio.cash, dec!(4995));
        assert_eq!(portfolio.get_position(&btc).unwrap().quantity, dec!(0.5));
        assert_eq!(portfolio.equity, dec!(9995));

        portfolio.apply_fill(&btc, Side::Sell, dec!(0.5), dec!(12000), Decimal::ZERO);
        assert!(portfolio.get_position(&btc).is_none());
        assert_eq!(portfolio.cash, dec!(10995));
        assert_eq!(portfolio.total_realized_pnl, dec!(1000));
    }

    #[test]
    fn test_portfolio_update_prices() {
        let eth = Asset::crypto("ETH");
        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.apply_fill(&eth, Side::Buy, dec!(1), dec!(500), Decimal::ZERO);

        let prices = HashMap::from([(eth.clone(), dec!(700))]);
        portfolio.update_prices(&prices);

        assert_eq!(portfolio.equity, dec!(1200));
        assert_eq!(portfolio.total_return(), dec!(20));
    }
}
