//! Trading signals emitted by strategies.

use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    Hold,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
            Side::Hold => "hold",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub side: Side,
    /// Fraction of equity the strategy wants exposed, in [0, 1] for sane
    /// strategies. The risk gate decides whether it is acceptable.
    pub size: f64,
    pub metadata: Map<String, Value>,
}

impl Signal {
    pub fn new(side: Side, size: f64) -> Self {
        Self {
            side,
            size,
            metadata: Map::new(),
        }
    }

    pub fn hold() -> Self {
        Self::new(Side::Hold, 0.0)
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Strategy name recorded in the metadata, or `unknown`.
    pub fn strategy_name(&self) -> &str {
        self.metadata
            .get("strategy")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    }
}
