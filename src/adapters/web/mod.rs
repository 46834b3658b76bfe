//! Web dashboard adapter.
//!
//! Axum server with an HTMX front-end: a status page over the current config
//! and analytics store, and a button that runs the configured backtest.

mod chart_svg;
mod error;
mod handlers;
mod templates;

pub use chart_svg::line_chart_svg;
pub use error::{status_from_error, WebError};
pub use handlers::*;
pub use templates::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::error::SilkroadError;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8501";

pub struct AppState {
    /// Re-read on every request so edits show up without a restart.
    pub config_path: PathBuf,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/backtest", post(handlers::run_backtest))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), SilkroadError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, config = %state.config_path.display(), "dashboard listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
