//! Moving-average momentum strategy.
//!
//! spread = SMA(close, fast) - SMA(close, slow); buy above +threshold, sell
//! below -threshold, hold otherwise.

use serde::Deserialize;

use super::{Parameters, Strategy};
use crate::domain::error::SilkroadError;
use crate::domain::indicator::sma_last;
use crate::domain::signal::{Side, Signal};
use crate::domain::snapshot::MarketSnapshot;

pub const NAME: &str = "momentum";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MomentumStrategy {
    pub fast_window: usize,
    pub slow_window: usize,
    pub threshold: f64,
    pub order_size: f64,
}

impl Default for MomentumStrategy {
    fn default() -> Self {
        MomentumStrategy {
            fast_window: 20,
            slow_window: 50,
            threshold: 0.0,
            order_size: 0.1,
        }
    }
}

impl MomentumStrategy {
    pub fn from_parameters(params: &Parameters) -> Result<Self, SilkroadError> {
        let strategy: MomentumStrategy =
            serde_json::from_value(serde_json::Value::Object(params.clone())).map_err(|e| {
                SilkroadError::InvalidParameters {
                    component: NAME.to_string(),
                    reason: e.to_string(),
                }
            })?;
        strategy.validate()?;
        Ok(strategy)
    }

    fn validate(&self) -> Result<(), SilkroadError> {
        let invalid = |reason: &str| SilkroadError::InvalidParameters {
            component: NAME.to_string(),
            reason: reason.to_string(),
        };
        if self.fast_window == 0 || self.slow_window == 0 {
            return Err(invalid("windows must be at least 1"));
        }
        if self.fast_window >= self.slow_window {
            return Err(invalid("fast_window must be smaller than slow_window"));
        }
        if self.threshold < 0.0 || !self.threshold.is_finite() {
            return Err(invalid("threshold must be a non-negative number"));
        }
        if self.order_size <= 0.0 || !self.order_size.is_finite() {
            return Err(invalid("order_size must be positive"));
        }
        Ok(())
    }

    /// Fast minus slow moving average over the snapshot's closes.
    pub fn spread(&self, snapshot: &MarketSnapshot) -> Option<f64> {
        let closes = snapshot.closes();
        let fast = sma_last(&closes, self.fast_window)?;
        let slow = sma_last(&closes, self.slow_window)?;
        Some(fast - slow)
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn generate_signal(&self, snapshot: &MarketSnapshot) -> Signal {
        let Some(spread) = self.spread(snapshot) else {
            return Signal::hold()
                .with_meta("reason", "spread-not-computed")
                .with_meta("strategy", NAME);
        };

        let side = if spread > self.threshold {
            Side::Buy
        } else if spread < -self.threshold {
            Side::Sell
        } else {
            Side::Hold
        };
        let size = if side == Side::Hold { 0.0 } else { self.order_size };

        Signal::new(side, size)
            .with_meta("spread", spread)
            .with_meta("strategy", NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn snapshot(closes: &[f64]) -> MarketSnapshot {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start + Duration::hours(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        MarketSnapshot::new(bars)
    }

    fn strategy(fast: usize, slow: usize, threshold: f64) -> MomentumStrategy {
        MomentumStrategy {
            fast_window: fast,
            slow_window: slow,
            threshold,
            order_size: 0.1,
        }
    }

    fn params(value: serde_json::Value) -> Parameters {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn holds_until_slow_window_is_filled() {
        let s = strategy(2, 4, 0.0);
        let sig = s.generate_signal(&snapshot(&[1.0, 2.0, 3.0]));
        assert_eq!(sig.side, Side::Hold);
        assert_eq!(sig.size, 0.0);
        assert_eq!(sig.metadata["reason"], json!("spread-not-computed"));
    }

    #[test]
    fn rising_prices_buy() {
        let s = strategy(2, 4, 0.0);
        let sig = s.generate_signal(&snapshot(&[1.0, 2.0, 3.0, 4.0]));
        // fast = 3.5, slow = 2.5
        assert_eq!(sig.side, Side::Buy);
        assert_eq!(sig.size, 0.1);
        assert_eq!(sig.metadata["spread"], json!(1.0));
        assert_eq!(sig.strategy_name(), "momentum");
    }

    #[test]
    fn falling_prices_sell() {
        let s = strategy(2, 4, 0.0);
        let sig = s.generate_signal(&snapshot(&[4.0, 3.0, 2.0, 1.0]));
        assert_eq!(sig.side, Side::Sell);
        assert_eq!(sig.size, 0.1);
    }

    #[test]
    fn spread_inside_threshold_holds() {
        let s = strategy(2, 4, 5.0);
        let sig = s.generate_signal(&snapshot(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(sig.side, Side::Hold);
        assert_eq!(sig.size, 0.0);
        assert!(sig.metadata.contains_key("spread"));
    }

    #[test]
    fn flat_prices_hold_at_zero_threshold() {
        let s = strategy(2, 4, 0.0);
        let sig = s.generate_signal(&snapshot(&[5.0; 6]));
        assert_eq!(sig.side, Side::Hold);
    }

    #[test]
    fn from_parameters_uses_defaults() {
        let s = MomentumStrategy::from_parameters(&Parameters::new()).unwrap();
        assert_eq!(s, MomentumStrategy::default());
    }

    #[test]
    fn from_parameters_overrides() {
        let s = MomentumStrategy::from_parameters(&params(json!({
            "fast_window": 5,
            "slow_window": 10,
            "threshold": 0.1,
            "order_size": 0.05
        })))
        .unwrap();
        assert_eq!(s.fast_window, 5);
        assert_eq!(s.slow_window, 10);
        assert_eq!(s.threshold, 0.1);
        assert_eq!(s.order_size, 0.05);
    }

    #[test]
    fn from_parameters_rejects_unknown_key() {
        let err = MomentumStrategy::from_parameters(&params(json!({"lookback": 3}))).unwrap_err();
        assert!(matches!(err, SilkroadError::InvalidParameters { .. }));
    }

    #[test]
    fn from_parameters_rejects_inverted_windows() {
        let err = MomentumStrategy::from_parameters(&params(json!({
            "fast_window": 50,
            "slow_window": 20
        })))
        .unwrap_err();
        assert!(err.to_string().contains("fast_window"));
    }
}
