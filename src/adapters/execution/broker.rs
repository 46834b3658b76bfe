//! Live execution through a broker: signals become target-percent orders.

use std::sync::Arc;

use crate::domain::analytics::TradeRecord;
use crate::domain::error::SilkroadError;
use crate::domain::execution::{target_quantity, OrderSide};
use crate::domain::signal::{Side, Signal};
use crate::ports::analytics_port::AnalyticsSink;
use crate::ports::broker_port::BrokerClient;
use crate::ports::execution_port::ExecutionEngine;
use crate::ports::notifier_port::Notifier;

/// Deltas smaller than this are not worth an order.
const MIN_DELTA: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSizing {
    /// Decimal places kept on order quantities; 0 trades whole units.
    pub quantity_precision: u32,
}

pub fn round_quantity(quantity: f64, precision: u32) -> f64 {
    let scale = 10_f64.powi(precision as i32);
    (quantity * scale).round() / scale
}

pub struct BrokerExecutionEngine<B: BrokerClient> {
    broker: B,
    symbol: String,
    sizing: OrderSizing,
    notifier: Arc<dyn Notifier>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl<B: BrokerClient> BrokerExecutionEngine<B> {
    pub fn new(
        broker: B,
        symbol: &str,
        sizing: OrderSizing,
        notifier: Arc<dyn Notifier>,
        analytics: Option<Arc<dyn AnalyticsSink>>,
    ) -> Self {
        Self {
            broker,
            symbol: symbol.to_string(),
            sizing,
            notifier,
            analytics,
        }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    fn broker_error(&self, reason: &str) -> SilkroadError {
        SilkroadError::Broker {
            broker: self.broker.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl<B: BrokerClient> ExecutionEngine for BrokerExecutionEngine<B> {
    fn name(&self) -> &str {
        self.broker.name()
    }

    fn execute(&mut self, signal: &Signal, price: Option<f64>) -> Result<(), SilkroadError> {
        let target_fraction = match signal.side {
            Side::Hold => return Ok(()),
            Side::Buy => signal.size,
            Side::Sell => -signal.size,
        }
        .clamp(-1.0, 1.0);

        let price = match price {
            Some(p) => p,
            None => self
                .broker
                .last_price(&self.symbol)?
                .ok_or_else(|| self.broker_error("Unable to retrieve market price for order sizing."))?,
        };

        let equity = self.broker.account_equity()?;
        let target = target_quantity(equity, target_fraction, price);
        let current = self.broker.position(&self.symbol)?;
        let delta = target - current;
        tracing::debug!(equity, target, current, delta, "rebalancing toward target");
        if delta.abs() < MIN_DELTA {
            return Ok(());
        }

        let precision = self.sizing.quantity_precision;
        let quantity = round_quantity(delta.abs(), precision);
        if quantity == 0.0 {
            return Ok(());
        }
        let side = OrderSide::of_delta(delta);
        let fills = self
            .broker
            .submit_market_order(&self.symbol, side, quantity)?;

        let fill_price = fills.last().map_or(price, |f| f.price);
        self.notifier.send(&format!(
            "[{}] {} {:.*} {} @ {:.2}",
            self.broker.name().to_uppercase(),
            side.as_str().to_uppercase(),
            precision as usize,
            quantity,
            self.symbol,
            fill_price
        ));

        if let Some(sink) = &self.analytics {
            for fill in &fills {
                sink.log_trade(&TradeRecord {
                    timestamp: fill.timestamp,
                    symbol: self.symbol.clone(),
                    side: fill.side.as_str().to_string(),
                    quantity: fill.quantity.abs(),
                    price: fill.price,
                    strategy: signal.strategy_name().to_string(),
                    source: self.broker.name().to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), SilkroadError> {
        self.broker.disconnect()
    }
}
