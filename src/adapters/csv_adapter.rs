//! CSV file data feed.
//!
//! Expects a header row `timestamp,open,high,low,close,volume`. Timestamps
//! may be RFC 3339, `%Y-%m-%d %H:%M:%S`, `%Y-%m-%d` or epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::{normalize_bars, Bar, Interval};
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::data_port::MarketDataFeed;

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvFeed {
    path: PathBuf,
    symbol: String,
    interval: Interval,
    lookback: usize,
    streamed: bool,
}

impl CsvFeed {
    pub fn new(path: PathBuf, symbol: &str, interval: Interval, lookback: usize) -> Self {
        Self {
            path,
            symbol: symbol.to_string(),
            interval,
            lookback,
            streamed: false,
        }
    }

    fn feed_error(&self, reason: String) -> SilkroadError {
        SilkroadError::DataFeed {
            symbol: self.symbol.clone(),
            reason,
        }
    }

    fn read_bars(&self) -> Result<Vec<Bar>, SilkroadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| self.feed_error(format!("failed to read {}: {e}", self.path.display())))?;

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| self.feed_error(format!("CSV parse error: {e}")))?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                self.feed_error(format!(
                    "invalid timestamp '{}' on row {}",
                    row.timestamp,
                    line + 1
                ))
            })?;
            bars.push(Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        let mut bars = normalize_bars(bars);
        if bars.len() > self.lookback {
            bars.drain(..bars.len() - self.lookback);
        }
        Ok(bars)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

impl MarketDataFeed for CsvFeed {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn interval(&self) -> Interval {
        self.interval
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn load_history(&mut self) -> Result<Vec<Bar>, SilkroadError> {
        self.read_bars()
    }

    fn next_snapshot(&mut self) -> Result<Option<MarketSnapshot>, SilkroadError> {
        if self.streamed {
            return Ok(None);
        }
        self.streamed = true;
        Ok(Some(MarketSnapshot::new(self.read_bars()?)))
    }
}
