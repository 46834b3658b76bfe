//! Core domain types and logic.

pub mod analytics;
pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod risk;
pub mod session;
pub mod signal;
pub mod snapshot;
pub mod strategy;
