//! Port traits: the seams between the domain and its adapters.

pub mod analytics_port;
pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod execution_port;
pub mod notifier_port;
