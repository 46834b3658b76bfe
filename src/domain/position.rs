//! Position tracking.

use chrono::{DateTime, Utc};

/// Open position in one symbol. Quantity is signed: positive long, negative
/// short. Fractional quantities are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    /// Volume-weighted average entry price.
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    /// Stop price, 0.0 when disabled.
    pub stop_loss: f64,
    /// PnL realised so far on partial reductions, net of all commissions
    /// paid on this position.
    pub realized_pnl: f64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    /// Signed value of the position at `price`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        if self.stop_loss == 0.0 {
            return false;
        }
        if self.is_long() {
            price <= self.stop_loss
        } else {
            price >= self.stop_loss
        }
    }
}

/// Stop price for a position entered at `entry_price`. Zero disables it.
pub fn stop_price(entry_price: f64, long: bool, stop_loss_pct: f64) -> f64 {
    if stop_loss_pct <= 0.0 {
        return 0.0;
    }
    if long {
        entry_price * (1.0 - stop_loss_pct)
    } else {
        entry_price * (1.0 + stop_loss_pct)
    }
}

/// A round trip: opened from flat, closed back to flat (or flipped).
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    /// Signed quantity held at the moment of closing.
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Net of commissions.
    pub pnl: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    fn sample_long_position() -> Position {
        Position {
            symbol: "BTC/USDT".into(),
            quantity: 0.5,
            entry_price: 40_000.0,
            entry_time: ts(),
            stop_loss: 38_000.0,
            realized_pnl: 0.0,
        }
    }

    fn sample_short_position() -> Position {
        Position {
            symbol: "ETH/USDT".into(),
            quantity: -2.0,
            entry_price: 2_000.0,
            entry_time: ts(),
            stop_loss: 2_100.0,
            realized_pnl: 0.0,
        }
    }

    #[test]
    fn direction_from_quantity_sign() {
        assert!(sample_long_position().is_long());
        assert!(!sample_short_position().is_long());
    }

    #[test]
    fn market_value_is_signed() {
        assert!((sample_long_position().market_value(42_000.0) - 21_000.0).abs() < 1e-9);
        assert!((sample_short_position().market_value(1_900.0) - (-3_800.0)).abs() < 1e-9);
    }

    #[test]
    fn stop_loss_long_triggered() {
        let pos = sample_long_position();
        assert!(pos.should_stop_loss(37_000.0));
        assert!(pos.should_stop_loss(38_000.0));
        assert!(!pos.should_stop_loss(38_001.0));
    }

    #[test]
    fn stop_loss_short_triggered() {
        let pos = sample_short_position();
        assert!(pos.should_stop_loss(2_150.0));
        assert!(pos.should_stop_loss(2_100.0));
        assert!(!pos.should_stop_loss(2_099.0));
    }

    #[test]
    fn stop_loss_disabled() {
        let mut pos = sample_long_position();
        pos.stop_loss = 0.0;
        assert!(!pos.should_stop_loss(0.0));
    }

    #[test]
    fn stop_price_directions() {
        assert!((stop_price(100.0, true, 0.05) - 95.0).abs() < 1e-9);
        assert!((stop_price(100.0, false, 0.05) - 105.0).abs() < 1e-9);
        assert_eq!(stop_price(100.0, true, 0.0), 0.0);
    }
}
