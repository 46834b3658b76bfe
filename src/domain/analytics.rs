//! Records written to the analytics store.

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// `buy` or `sell` (paper engines may also log `hold`).
    pub side: String,
    pub quantity: f64,
    pub price: f64,
    pub strategy: String,
    /// Engine that produced the trade: `backtest`, `paper` or a broker name.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub metric: String,
    pub value: f64,
    pub metadata: Option<Value>,
}
