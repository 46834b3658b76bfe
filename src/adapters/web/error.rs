//! HTTP error responses for the dashboard.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::SilkroadError;

use super::templates::ErrorTemplate;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Error page, or just the error block for HTMX requests.
    pub fn render(self, htmx: bool) -> Response {
        let template = ErrorTemplate {
            htmx,
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

pub fn status_from_error(err: &SilkroadError) -> StatusCode {
    match err {
        SilkroadError::ConfigNotFound { .. }
        | SilkroadError::ConfigParse { .. }
        | SilkroadError::ConfigInvalid { .. }
        | SilkroadError::NotRegistered { .. }
        | SilkroadError::InvalidParameters { .. }
        | SilkroadError::UnsupportedSource { .. } => StatusCode::BAD_REQUEST,
        SilkroadError::NoData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SilkroadError::InvalidState(_) => StatusCode::CONFLICT,
        SilkroadError::DataFeed { .. } | SilkroadError::Broker { .. } => StatusCode::BAD_GATEWAY,
        SilkroadError::Database { .. }
        | SilkroadError::DatabaseQuery { .. }
        | SilkroadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SilkroadError> for WebError {
    fn from(err: SilkroadError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        Self::internal(format!("template error: {err}"))
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("background task failed: {err}"))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        self.render(false)
    }
}
