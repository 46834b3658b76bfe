//! Paper trading: announce signals, log them, touch no venue.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::analytics::TradeRecord;
use crate::domain::error::SilkroadError;
use crate::domain::signal::Signal;
use crate::ports::analytics_port::AnalyticsSink;
use crate::ports::execution_port::ExecutionEngine;
use crate::ports::notifier_port::Notifier;

pub const NAME: &str = "paper";

pub struct PaperTradingEngine {
    symbol: String,
    notifier: Arc<dyn Notifier>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl PaperTradingEngine {
    pub fn new(
        symbol: &str,
        notifier: Arc<dyn Notifier>,
        analytics: Option<Arc<dyn AnalyticsSink>>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            notifier,
            analytics,
        }
    }

    pub fn describe(&self, signal: &Signal, price: Option<f64>) -> String {
        let price_display = price.map(|p| format!(" @ {p:.2}")).unwrap_or_default();
        format!(
            "[PAPER] {} {:.4} {}{}",
            signal.side.as_str().to_uppercase(),
            signal.size,
            self.symbol,
            price_display
        )
    }
}

impl ExecutionEngine for PaperTradingEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&mut self, signal: &Signal, price: Option<f64>) -> Result<(), SilkroadError> {
        self.notifier.send(&self.describe(signal, price));
        if let (Some(sink), Some(price)) = (&self.analytics, price) {
            sink.log_trade(&TradeRecord {
                timestamp: Utc::now(),
                symbol: self.symbol.clone(),
                side: signal.side.as_str().to_string(),
                quantity: signal.size,
                price,
                strategy: signal.strategy_name().to_string(),
                source: NAME.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_adapter::AnalyticsStore;
    use crate::domain::signal::Side;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl Notifier for Capture {
        fn send(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn announces_with_price() {
        let capture = Arc::new(Capture::default());
        let mut engine = PaperTradingEngine::new("BTC/USDT", capture.clone(), None);
        engine
            .execute(&Signal::new(Side::Buy, 0.1), Some(42_123.456))
            .unwrap();
        assert_eq!(
            capture.0.lock().unwrap()[0],
            "[PAPER] BUY 0.1000 BTC/USDT @ 42123.46"
        );
    }

    #[test]
    fn announces_without_price_and_holds_too() {
        let capture = Arc::new(Capture::default());
        let mut engine = PaperTradingEngine::new("ETH/USDT", capture.clone(), None);
        engine.execute(&Signal::hold(), None).unwrap();
        assert_eq!(capture.0.lock().unwrap()[0], "[PAPER] HOLD 0.0000 ETH/USDT");
    }

    #[test]
    fn logs_trade_when_price_known() {
        let store = Arc::new(AnalyticsStore::in_memory().unwrap());
        let mut engine = PaperTradingEngine::new(
            "BTC/USDT",
            Arc::new(Capture::default()),
            Some(store.clone()),
        );
        let signal = Signal::new(Side::Sell, 0.05).with_meta("strategy", "momentum");
        engine.execute(&signal, Some(100.0)).unwrap();
        engine.execute(&signal, None).unwrap();

        let trades = store.recent_trades(10).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, "sell");
        assert_eq!(trades[0].quantity, 0.05);
        assert_eq!(trades[0].strategy, "momentum");
        assert_eq!(trades[0].source, "paper");
    }
}
