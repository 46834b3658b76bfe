//! Execution engines: paper trading and broker-backed live trading.

pub mod alpaca;
pub mod broker;
pub mod paper;
pub mod registry;

pub use registry::{ExecutionContext, ExecutionRegistry};
