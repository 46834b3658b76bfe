//! HTTP request handlers for the dashboard.
//!
//! Config loading, SQLite reads and backtests are blocking work and run on
//! the blocking pool, never on the async runtime threads.

use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::sqlite_adapter::AnalyticsStore;
use crate::adapters::yaml_config_adapter::YamlConfigAdapter;
use crate::app::SilkroadApp;
use crate::domain::error::SilkroadError;

use super::templates::{
    activity_feed, flow_steps, redact_config_text, status_cards, BacktestResultTemplate,
    DashboardTemplate,
};
use super::{is_htmx_request, AppState, WebError};

/// Rows shown in the trades and performance tables.
const RECENT_LIMIT: usize = 50;

pub async fn dashboard(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let htmx = is_htmx_request(&headers);
    let config_path = state.config_path.clone();
    let rendered = async {
        let template =
            tokio::task::spawn_blocking(move || dashboard_template(&config_path, htmx)).await??;
        Ok::<_, WebError>(Html(template.render()?).into_response())
    };
    rendered.await.unwrap_or_else(|e| e.render(htmx))
}

fn dashboard_template(config_path: &Path, htmx: bool) -> Result<DashboardTemplate, SilkroadError> {
    let adapter = YamlConfigAdapter::from_file(config_path)?;
    let (config, config_error) = match adapter.app_config() {
        Ok(config) => (Some(config), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let store = match config.as_ref().and_then(|c| c.enabled_analytics()) {
        Some(settings) if Path::new(&settings.database).exists() => {
            Some(AnalyticsStore::open(&settings.database)?)
        }
        _ => None,
    };
    let (trades, metrics) = match &store {
        Some(store) => (
            store.recent_trades(RECENT_LIMIT)?,
            store.recent_performance(RECENT_LIMIT)?,
        ),
        None => (Vec::new(), Vec::new()),
    };

    Ok(DashboardTemplate {
        htmx,
        config_path: adapter.source().to_string(),
        config_yaml: redact_config_text(adapter.raw_text()),
        config_error,
        cards: config.as_ref().map(status_cards).unwrap_or_default(),
        flow: config.as_ref().map(flow_steps).unwrap_or_default(),
        activity: activity_feed(&trades, &metrics),
        trades,
        metrics,
    })
}

pub async fn run_backtest(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let htmx = is_htmx_request(&headers);
    let config_path = state.config_path.clone();
    let rendered = async {
        let result = tokio::task::spawn_blocking(move || {
            SilkroadApp::from_file(&config_path)?.run_backtest()
        })
        .await??;
        let template = BacktestResultTemplate::from_result(&result, htmx);
        Ok::<_, WebError>(Html(template.render()?).into_response())
    };
    rendered.await.unwrap_or_else(|e| {
        tracing::warn!(status = %e.status, message = %e.message, "dashboard backtest failed");
        e.render(htmx)
    })
}

pub async fn not_found(headers: HeaderMap) -> Response {
    WebError::not_found("Page not found").render(is_htmx_request(&headers))
}
