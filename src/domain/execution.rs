//! Fill simulation for the backtest broker.
//!
//! Orders are expressed as a signed quantity delta against the current
//! position. A fill may open, grow, shrink, close or flip a position; closing
//! or flipping records a [`ClosedTrade`].

use chrono::{DateTime, Utc};

use super::portfolio::Portfolio;
use super::position::{stop_price, ClosedTrade, Position};

/// Quantities below this are treated as zero.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Cost model applied to simulated fills.
#[derive(Debug, Clone, PartialEq)]
pub struct FillConfig {
    /// Commission as a fraction of traded value.
    pub commission: f64,
    /// Slippage as a fraction of price.
    pub slippage: f64,
    /// Stop distance applied to newly opened positions, 0 disables it.
    pub stop_loss_pct: f64,
}

impl Default for FillConfig {
    fn default() -> Self {
        FillConfig {
            commission: 0.001,
            slippage: 0.0,
            stop_loss_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    pub fn of_delta(delta: f64) -> Self {
        if delta >= 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    /// Absolute quantity.
    pub quantity: f64,
    pub price: f64,
    pub commission: f64,
}

pub fn calculate_commission(trade_value: f64, config: &FillConfig) -> f64 {
    trade_value.abs() * config.commission
}

/// Buys pay more, sells receive less.
pub fn apply_slippage(market_price: f64, side: OrderSide, slippage: f64) -> f64 {
    match side {
        OrderSide::Buy => market_price * (1.0 + slippage),
        OrderSide::Sell => market_price * (1.0 - slippage),
    }
}

/// Signed quantity that puts `target_fraction` of `equity` into the symbol.
pub fn target_quantity(equity: f64, target_fraction: f64, price: f64) -> f64 {
    if price <= 0.0 || !price.is_finite() {
        return 0.0;
    }
    equity * target_fraction / price
}

/// Largest buy quantity affordable from `cash` at `price` including commission.
pub fn affordable_quantity(cash: f64, price: f64, config: &FillConfig) -> f64 {
    if cash <= 0.0 || price <= 0.0 {
        return 0.0;
    }
    cash / (price * (1.0 + config.commission))
}

/// Execute `delta` units of `symbol` at `market_price` against the portfolio.
///
/// Buys are capped by available cash. Returns `None` when nothing traded.
pub fn execute_order(
    portfolio: &mut Portfolio,
    symbol: &str,
    delta: f64,
    market_price: f64,
    timestamp: DateTime<Utc>,
    config: &FillConfig,
) -> Option<Fill> {
    if delta.abs() < QUANTITY_EPSILON || market_price <= 0.0 {
        return None;
    }
    let side = OrderSide::of_delta(delta);
    let price = apply_slippage(market_price, side, config.slippage);

    let delta = if side == OrderSide::Buy {
        // Covering a short is never capped; only new long exposure is.
        let covering = (-portfolio.quantity(symbol)).max(0.0).min(delta);
        let cash_after_cover = portfolio.cash - covering * price * (1.0 + config.commission);
        covering + (delta - covering).min(affordable_quantity(cash_after_cover, price, config))
    } else {
        delta
    };
    if delta.abs() < QUANTITY_EPSILON {
        return None;
    }

    let commission = calculate_commission(delta * price, config);
    portfolio.cash -= delta * price + commission;
    apply_to_position(portfolio, symbol, delta, price, commission, timestamp, config);

    Some(Fill {
        timestamp,
        symbol: symbol.to_string(),
        side,
        quantity: delta.abs(),
        price,
        commission,
    })
}

fn apply_to_position(
    portfolio: &mut Portfolio,
    symbol: &str,
    delta: f64,
    price: f64,
    commission: f64,
    timestamp: DateTime<Utc>,
    config: &FillConfig,
) {
    let Some(mut pos) = portfolio.remove_position(symbol) else {
        portfolio.add_position(open_position(symbol, delta, price, commission, timestamp, config));
        return;
    };

    let current = pos.quantity;
    let new_qty = current + delta;
    let same_direction = current.signum() == delta.signum();

    if same_direction {
        let total = current.abs() + delta.abs();
        pos.entry_price = (pos.entry_price * current.abs() + price * delta.abs()) / total;
        pos.quantity = new_qty;
        pos.realized_pnl -= commission;
        pos.stop_loss = stop_price(pos.entry_price, pos.is_long(), config.stop_loss_pct);
        portfolio.add_position(pos);
        return;
    }

    let closed_qty = delta.abs().min(current.abs());
    let closing_commission = commission * closed_qty / delta.abs();
    pos.realized_pnl += current.signum() * closed_qty * (price - pos.entry_price) - closing_commission;

    if new_qty.abs() < QUANTITY_EPSILON {
        close_trade(portfolio, pos, price, timestamp);
    } else if new_qty.signum() == current.signum() {
        pos.quantity = new_qty;
        portfolio.add_position(pos);
    } else {
        close_trade(portfolio, pos, price, timestamp);
        let opening_commission = commission - closing_commission;
        portfolio.add_position(open_position(
            symbol,
            new_qty,
            price,
            opening_commission,
            timestamp,
            config,
        ));
    }
}

fn open_position(
    symbol: &str,
    quantity: f64,
    price: f64,
    commission: f64,
    timestamp: DateTime<Utc>,
    config: &FillConfig,
) -> Position {
    Position {
        symbol: symbol.to_string(),
        quantity,
        entry_price: price,
        entry_time: timestamp,
        stop_loss: stop_price(price, quantity > 0.0, config.stop_loss_pct),
        realized_pnl: -commission,
    }
}

fn close_trade(portfolio: &mut Portfolio, pos: Position, exit_price: f64, exit_time: DateTime<Utc>) {
    portfolio.record_trade(ClosedTrade {
        symbol: pos.symbol,
        quantity: pos.quantity,
        entry_price: pos.entry_price,
        exit_price,
        entry_time: pos.entry_time,
        exit_time,
        pnl: pos.realized_pnl,
    });
}

/// Close the position in `symbol` at `close_price` if its stop is hit.
///
/// Stop exits fill at the close itself; slippage is not applied.
pub fn check_stop_loss(
    portfolio: &mut Portfolio,
    symbol: &str,
    close_price: f64,
    timestamp: DateTime<Utc>,
    config: &FillConfig,
) -> Option<Fill> {
    let quantity = portfolio
        .get_position(symbol)
        .filter(|pos| pos.should_stop_loss(close_price))?
        .quantity;
    tracing::debug!(symbol, close_price, quantity, "stop loss triggered");
    let at_close = FillConfig {
        slippage: 0.0,
        ..config.clone()
    };
    execute_order(portfolio, symbol, -quantity, close_price, timestamp, &at_close)
}
