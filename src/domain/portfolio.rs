//! Portfolio state and equity tracking.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Cash plus signed positions. Short sales credit cash and buys debit it, so
/// equity is always `cash + sum(quantity * price)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: HashMap<String, Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    /// Signed quantity held in `symbol`, 0 when flat.
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map_or(0.0, |p| p.quantity)
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    /// Cash plus the position in `symbol` valued at `price`.
    pub fn mark_to_market(&self, symbol: &str, price: f64) -> f64 {
        self.cash + self.get_position(symbol).map_or(0.0, |pos| pos.market_value(price))
    }
}
