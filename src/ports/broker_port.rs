//! Broker port used by live execution engines.

use crate::domain::error::SilkroadError;
use crate::domain::execution::OrderSide;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerFill {
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    /// Absolute filled quantity.
    pub quantity: f64,
    pub price: f64,
}

pub trait BrokerClient: Send {
    /// Short lowercase name, used as the trade source.
    fn name(&self) -> &str;

    /// Net liquidation value of the account.
    fn account_equity(&mut self) -> Result<f64, SilkroadError>;

    /// Signed position in `symbol`, 0 when flat.
    fn position(&mut self, symbol: &str) -> Result<f64, SilkroadError>;

    fn last_price(&mut self, symbol: &str) -> Result<Option<f64>, SilkroadError>;

    /// Submit a market order and wait for its fills.
    fn submit_market_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
    ) -> Result<Vec<BrokerFill>, SilkroadError>;

    fn disconnect(&mut self) -> Result<(), SilkroadError> {
        Ok(())
    }
}
