//! Configuration validation.
//!
//! Runs after parsing; registry names are resolved later by the app.

use chrono::Utc;

use crate::domain::config::{AppConfig, ENVIRONMENTS};
use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::Interval;

pub fn validate_config(config: &AppConfig) -> Result<(), SilkroadError> {
    validate_environment(config)?;
    validate_data(config)?;
    validate_backtest(config)?;
    validate_risk(config)?;
    validate_analytics(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SilkroadError {
    SilkroadError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_environment(config: &AppConfig) -> Result<(), SilkroadError> {
    if !ENVIRONMENTS.contains(&config.environment.as_str()) {
        return Err(invalid(
            "app",
            "environment",
            format!(
                "'{}' is not one of {}",
                config.environment,
                ENVIRONMENTS.join(", ")
            ),
        ));
    }
    Ok(())
}

fn validate_data(config: &AppConfig) -> Result<(), SilkroadError> {
    let data = &config.data;
    if data.symbol.trim().is_empty() {
        return Err(invalid("data", "symbol", "symbol must not be empty"));
    }
    if data.lookback < 1 {
        return Err(invalid("data", "lookback", "lookback must be at least 1"));
    }
    if !(data.poll_interval > 0.0) || !data.poll_interval.is_finite() {
        return Err(invalid("data", "poll_interval", "poll_interval must be positive"));
    }
    let interval = data
        .interval
        .parse::<Interval>()
        .map_err(|reason| invalid("data", "interval", reason))?;
    if interval.steps_before(Utc::now(), data.lookback - 1).is_none() {
        return Err(invalid(
            "data",
            "interval",
            format!(
                "{} bars of {interval} reach past the supported date range",
                data.lookback
            ),
        ));
    }
    Ok(())
}

fn validate_backtest(config: &AppConfig) -> Result<(), SilkroadError> {
    let Some(bt) = &config.backtest else {
        return Ok(());
    };
    if !(bt.starting_cash > 0.0) {
        return Err(invalid("backtest", "starting_cash", "starting_cash must be positive"));
    }
    if !(0.0..1.0).contains(&bt.commission) {
        return Err(invalid("backtest", "commission", "commission must be in [0, 1)"));
    }
    if !(0.0..1.0).contains(&bt.slippage) {
        return Err(invalid("backtest", "slippage", "slippage must be in [0, 1)"));
    }
    Ok(())
}

fn validate_risk(config: &AppConfig) -> Result<(), SilkroadError> {
    let Some(risk) = &config.risk else {
        return Ok(());
    };
    for (key, value) in [
        ("max_position_size", risk.max_position_size),
        ("max_drawdown", risk.max_drawdown),
        ("stop_loss_pct", risk.stop_loss_pct),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid("risk", key, format!("{key} must be in (0, 1]")));
        }
    }
    Ok(())
}

fn validate_analytics(config: &AppConfig) -> Result<(), SilkroadError> {
    let Some(analytics) = config.enabled_analytics() else {
        return Ok(());
    };
    if analytics.backend != "sqlite" {
        return Err(invalid(
            "analytics",
            "backend",
            format!("Unsupported analytics backend '{}'", analytics.backend),
        ));
    }
    if analytics.database.trim().is_empty() {
        return Err(invalid("analytics", "database", "database path must not be empty"));
    }
    Ok(())
}
