//! Askama templates and the view models they render.

use askama::Template;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::chart_svg::line_chart_svg;
use crate::adapters::notifier::active_channels;
use crate::domain::analytics::{PerformanceRecord, TradeRecord};
use crate::domain::backtest::BacktestResult;
use crate::domain::config::AppConfig;

const ACTIVITY_PER_KIND: usize = 5;
const ACTIVITY_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCard {
    pub title: &'static str,
    pub value: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowStep {
    pub label: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl ActivityItem {
    pub fn time_label(&self) -> String {
        self.timestamp.format("%b %d · %H:%M").to_string()
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub htmx: bool,
    pub config_path: String,
    pub config_yaml: String,
    /// Set when the config file does not deserialize.
    pub config_error: Option<String>,
    pub cards: Vec<StatusCard>,
    pub flow: Vec<FlowStep>,
    pub activity: Vec<ActivityItem>,
    pub trades: Vec<TradeRecord>,
    pub metrics: Vec<PerformanceRecord>,
}

#[derive(Template)]
#[template(path = "backtest_result.html")]
pub struct BacktestResultTemplate {
    pub htmx: bool,
    pub strategy: String,
    pub ending_value: String,
    pub pnl: String,
    pub total_return: String,
    pub trades: usize,
    pub sharpe: String,
    pub completed: String,
    pub extra_metrics: Vec<(String, String)>,
    pub equity_svg: String,
    pub price_svg: String,
}

impl BacktestResultTemplate {
    pub fn from_result(result: &BacktestResult, htmx: bool) -> Self {
        let equity: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
        let prices: Vec<f64> = result.price_series.iter().map(|p| p.close).collect();
        Self {
            htmx,
            strategy: result.strategy_name.clone(),
            ending_value: format_currency(result.ending_value),
            pnl: format!("{} vs start", format_currency(result.pnl())),
            total_return: format_percent(result.total_return),
            trades: result.total_trades,
            sharpe: result
                .sharpe_ratio
                .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}")),
            completed: format!("Run completed {}", result.completed_at.format("%b %d · %H:%M")),
            extra_metrics: result
                .extra_metrics
                .iter()
                .map(|(name, value)| (name.clone(), format!("{value:.4}")))
                .collect(),
            equity_svg: line_chart_svg("Equity", &equity, "#66c2ff"),
            price_svg: line_chart_svg("Price", &prices, "#8fffc2"),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub htmx: bool,
    pub message: &'a str,
    pub status: u16,
}

/// `$1,234.56`, with a leading minus for losses.
pub fn format_currency(value: f64) -> String {
    let cents = format!("{:.2}", value.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((&cents, "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

const REDACTED: &str = "********";

/// Keys whose values are credentials and never shown on the dashboard.
fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["secret", "password", "token", "key_id", "api_key"]
        .iter()
        .any(|word| key.contains(word))
}

/// Config text with the values of credential keys masked.
pub fn redact_config_text(text: &str) -> String {
    text.lines()
        .map(|line| match line.split_once(':') {
            Some((key, value))
                if is_sensitive(key.trim().trim_start_matches("- "))
                    && !value.trim().is_empty() =>
            {
                format!("{key}: {REDACTED}")
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn param_summary(params: &Map<String, Value>, empty: &str) -> String {
    if params.is_empty() {
        return empty.to_string();
    }
    params
        .iter()
        .map(|(key, value)| match value {
            _ if is_sensitive(key) => format!("{key}={REDACTED}"),
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn status_cards(config: &AppConfig) -> Vec<StatusCard> {
    let data = &config.data;
    let risk = config.risk.as_ref().map_or_else(
        || "No explicit limits.".to_string(),
        |r| {
            format!(
                "max pos {}, max dd {}, stop {}",
                r.max_position_size, r.max_drawdown, r.stop_loss_pct
            )
        },
    );
    let analytics = config.analytics.clone().unwrap_or_default();
    let monitoring_enabled = config.monitoring.as_ref().is_some_and(|m| m.enabled);

    vec![
        StatusCard {
            title: "Market Data",
            value: format!("{} @ {} via {}", data.symbol, data.interval, data.source),
            detail: format!("lookback {}, poll {}s", data.lookback, data.poll_interval),
        },
        StatusCard {
            title: "Strategy",
            value: config.strategy.name.clone(),
            detail: param_summary(&config.strategy.parameters, "No params provided."),
        },
        StatusCard {
            title: "Execution Mode",
            value: config.execution.name.clone(),
            detail: param_summary(&config.execution.parameters, "Default parameters."),
        },
        StatusCard {
            title: "Risk Limits",
            value: risk,
            detail: "Limits applied before any trade.".to_string(),
        },
        StatusCard {
            title: "Analytics",
            value: format!(
                "{} · {}",
                if analytics.enabled { "Enabled" } else { "Disabled" },
                analytics.backend
            ),
            detail: if analytics.enabled {
                format!("DB: {}", analytics.database)
            } else {
                "Off".to_string()
            },
        },
        StatusCard {
            title: "Alerts",
            value: if monitoring_enabled { "Enabled" } else { "Disabled" }.to_string(),
            detail: format!(
                "Channels: {}",
                active_channels(config.monitoring.as_ref()).join(", ")
            ),
        },
    ]
}

/// data → strategy → risk → execution → analytics.
pub fn flow_steps(config: &AppConfig) -> Vec<FlowStep> {
    let limits = config.risk_limits();
    vec![
        FlowStep {
            label: "Data",
            detail: format!("{}@{}", config.data.symbol, config.data.interval),
        },
        FlowStep {
            label: "Strategy",
            detail: config.strategy.name.clone(),
        },
        FlowStep {
            label: "Risk",
            detail: format!("max pos {}", limits.max_position_fraction),
        },
        FlowStep {
            label: "Execution",
            detail: config.execution.name.clone(),
        },
        FlowStep {
            label: "Analytics",
            detail: if config.enabled_analytics().is_some() { "on" } else { "off" }.to_string(),
        },
    ]
}

/// Latest trades and metrics merged newest first.
pub fn activity_feed(trades: &[TradeRecord], metrics: &[PerformanceRecord]) -> Vec<ActivityItem> {
    let mut feed: Vec<ActivityItem> = trades
        .iter()
        .take(ACTIVITY_PER_KIND)
        .map(|t| ActivityItem {
            timestamp: t.timestamp,
            title: format!("{} {}", t.side.to_uppercase(), t.symbol),
            body: format!("{} @ {}", t.quantity, format_currency(t.price)),
        })
        .chain(metrics.iter().take(ACTIVITY_PER_KIND).map(|m| ActivityItem {
            timestamp: m.timestamp,
            title: format!("Metric: {}", m.metric),
            body: format!("{:.4}", m.value),
        }))
        .collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(ACTIVITY_LIMIT);
    feed
}
