//! SQLite analytics store for trades and performance metrics.

use crate::domain::analytics::{PerformanceRecord, TradeRecord};
use crate::domain::error::SilkroadError;
use crate::ports::analytics_port::AnalyticsSink;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rusqlite::types::Type;
use std::path::Path;

pub struct AnalyticsStore {
    pool: Pool<SqliteConnectionManager>,
}

impl AnalyticsStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SilkroadError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
        });
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e: r2d2::Error| SilkroadError::Database {
                reason: format!("failed to open {}: {e}", path.display()),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        tracing::debug!(path = %path.display(), "analytics store ready");
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, SilkroadError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SilkroadError::Database {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, SilkroadError> {
        self.pool.get().map_err(|e: r2d2::Error| SilkroadError::Database {
            reason: e.to_string(),
        })
    }

    fn initialize_schema(&self) -> Result<(), SilkroadError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                symbol TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity REAL NOT NULL,
                price REAL NOT NULL,
                strategy TEXT NOT NULL,
                source TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS performance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metric TEXT NOT NULL,
                value REAL NOT NULL,
                metadata TEXT
            );",
        )
        .map_err(|e: rusqlite::Error| SilkroadError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Newest trades first.
    pub fn recent_trades(&self, limit: usize) -> Result<Vec<TradeRecord>, SilkroadError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, symbol, side, quantity, price, strategy, source
             FROM trades ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(TradeRecord {
                timestamp: parse_timestamp(&row.get::<_, String>(0)?, 0)?,
                symbol: row.get(1)?,
                side: row.get(2)?,
                quantity: row.get(3)?,
                price: row.get(4)?,
                strategy: row.get(5)?,
                source: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(SilkroadError::from)
    }

    /// Newest metrics first.
    pub fn recent_performance(&self, limit: usize) -> Result<Vec<PerformanceRecord>, SilkroadError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, timestamp, metric, value, metadata
             FROM performance ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let metadata: Option<String> = row.get(4)?;
            Ok(PerformanceRecord {
                run_id: row.get(0)?,
                timestamp: parse_timestamp(&row.get::<_, String>(1)?, 1)?,
                metric: row.get(2)?,
                value: row.get(3)?,
                metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(SilkroadError::from)
    }
}

fn parse_timestamp(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

impl AnalyticsSink for AnalyticsStore {
    fn log_trade(&self, record: &TradeRecord) -> Result<(), SilkroadError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO trades (timestamp, symbol, side, quantity, price, strategy, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.timestamp.to_rfc3339(),
                record.symbol,
                record.side,
                record.quantity,
                record.price,
                record.strategy,
                record.source
            ],
        )
        .map_err(|e: rusqlite::Error| SilkroadError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn log_performance(&self, record: &PerformanceRecord) -> Result<(), SilkroadError> {
        let metadata = record
            .metadata
            .as_ref()
            .filter(|m| !m.is_null())
            .map(|m| m.to_string());
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO performance (run_id, timestamp, metric, value, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.run_id,
                record.timestamp.to_rfc3339(),
                record.metric,
                record.value,
                metadata
            ],
        )
        .map_err(|e: rusqlite::Error| SilkroadError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
