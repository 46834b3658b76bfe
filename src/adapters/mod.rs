//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod exchange_feed;
pub mod execution;
pub mod feed_factory;
pub mod notifier;
pub mod sqlite_adapter;
pub mod static_feed;
#[cfg(feature = "web")]
pub mod web;
pub mod yaml_config_adapter;
