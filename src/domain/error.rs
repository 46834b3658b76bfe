//! Domain error types.

/// Top-level error type for silkroad.
#[derive(Debug, thiserror::Error)]
pub enum SilkroadError {
    #[error("Config file '{path}' does not exist")]
    ConfigNotFound { path: String },

    #[error("Invalid configuration format in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("Invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{kind} '{name}' is not registered.")]
    NotRegistered { kind: &'static str, name: String },

    #[error("Invalid parameters for {component}: {reason}")]
    InvalidParameters { component: String, reason: String },

    #[error("Unsupported data source '{source_id}'")]
    UnsupportedSource { source_id: String },

    #[error("Data feed error for {symbol}: {reason}")]
    DataFeed { symbol: String, reason: String },

    #[error("No market data for {symbol}")]
    NoData { symbol: String },

    #[error("Broker error ({broker}): {reason}")]
    Broker { broker: String, reason: String },

    #[error("Database error: {reason}")]
    Database { reason: String },

    #[error("Database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SilkroadError> for std::process::ExitCode {
    fn from(err: &SilkroadError) -> Self {
        let code: u8 = match err {
            SilkroadError::Io(_) => 1,
            SilkroadError::ConfigNotFound { .. }
            | SilkroadError::ConfigParse { .. }
            | SilkroadError::ConfigInvalid { .. } => 2,
            SilkroadError::Database { .. } | SilkroadError::DatabaseQuery { .. } => 3,
            SilkroadError::NotRegistered { .. } | SilkroadError::InvalidParameters { .. } => 4,
            SilkroadError::UnsupportedSource { .. }
            | SilkroadError::DataFeed { .. }
            | SilkroadError::NoData { .. } => 5,
            SilkroadError::Broker { .. } => 6,
            SilkroadError::InvalidState(_) => 7,
        };
        std::process::ExitCode::from(code)
    }
}

impl From<rusqlite::Error> for SilkroadError {
    fn from(e: rusqlite::Error) -> Self {
        SilkroadError::DatabaseQuery {
            reason: e.to_string(),
        }
    }
}

impl From<r2d2::Error> for SilkroadError {
    fn from(e: r2d2::Error) -> Self {
        SilkroadError::Database {
            reason: e.to_string(),
        }
    }
}
