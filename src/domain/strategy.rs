//! Strategy interface and built-in strategies.
//!
//! A strategy consumes a [`MarketSnapshot`] and emits a [`Signal`]. Concrete
//! strategies are constructed by name through the [`registry`].

pub mod momentum;
pub mod registry;

use crate::domain::ohlcv::Bar;
use crate::domain::signal::Signal;
use crate::domain::snapshot::MarketSnapshot;

/// Free-form parameters as they appear under `parameters:` in the config.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Warm-up hook run once over the initial history before any signal is
    /// requested.
    fn prepare(&mut self, _history: &[Bar]) {}

    fn generate_signal(&self, snapshot: &MarketSnapshot) -> Signal;
}

pub use momentum::MomentumStrategy;
pub use registry::StrategyRegistry;
