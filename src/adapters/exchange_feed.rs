//! Polling kline feed over an exchange REST API.
//!
//! History is fetched once and cached. The stream yields the cached history,
//! then repeatedly sleeps for the poll interval, fetches the two most recent
//! candles, merges them in (newest wins) and yields the last `lookback` bars.

use serde_json::Value;
use std::time::Duration;

use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::{normalize_bars, Bar, Interval};
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::data_port::MarketDataFeed;

/// Binance caps a single klines request at 1000 candles.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

pub trait KlineClient: Send {
    fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Bar>, SilkroadError>;
}

/// Binance-compatible `/api/v3/klines` client.
pub struct BinanceClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SilkroadError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SilkroadError::DataFeed {
                symbol: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// REST base URL for a known exchange id.
    pub fn base_url_for(exchange_id: &str) -> Option<&'static str> {
        match exchange_id {
            "binance" => Some("https://api.binance.com"),
            "binanceus" => Some("https://api.binance.us"),
            _ => None,
        }
    }
}

/// `BTC/USDT` -> `BTCUSDT`.
pub fn market_id(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

impl KlineClient for BinanceClient {
    fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Bar>, SilkroadError> {
        let feed_error = |reason: String| SilkroadError::DataFeed {
            symbol: symbol.to_string(),
            reason,
        };
        let url = format!("{}/api/v3/klines", self.base_url);
        tracing::debug!(%url, symbol, %interval, limit, "fetching klines");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("symbol", market_id(symbol)),
                ("interval", interval.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .map_err(|e| feed_error(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(feed_error(format!("HTTP {status}: {body}")));
        }
        let payload: Value = response
            .json()
            .map_err(|e| feed_error(format!("invalid JSON: {e}")))?;
        parse_klines(&payload).map_err(feed_error)
    }
}

/// Parse a klines payload: `[[open_time_ms, "o", "h", "l", "c", "v", ...], ...]`.
pub fn parse_klines(payload: &Value) -> Result<Vec<Bar>, String> {
    let rows = payload
        .as_array()
        .ok_or_else(|| "expected an array of klines".to_string())?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_kline(row).ok_or_else(|| format!("malformed kline at index {i}")))
        .collect()
}

fn parse_kline(row: &Value) -> Option<Bar> {
    let cols = row.as_array()?;
    let number = |idx: usize| -> Option<f64> {
        match cols.get(idx)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };
    let open_time = cols.first()?.as_i64()?;
    Some(Bar {
        timestamp: chrono::DateTime::from_timestamp_millis(open_time)?,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}

pub struct ExchangeFeed<C: KlineClient> {
    client: C,
    symbol: String,
    interval: Interval,
    lookback: usize,
    poll_interval: Duration,
    cache: Option<Vec<Bar>>,
    started: bool,
}

impl<C: KlineClient> ExchangeFeed<C> {
    pub fn new(
        client: C,
        symbol: &str,
        interval: Interval,
        lookback: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            symbol: symbol.to_string(),
            interval,
            lookback,
            poll_interval,
            cache: None,
            started: false,
        }
    }

    fn trim(&self, mut bars: Vec<Bar>) -> Vec<Bar> {
        if bars.len() > self.lookback {
            bars.drain(..bars.len() - self.lookback);
        }
        bars
    }

    fn poll(&mut self) -> Result<Vec<Bar>, SilkroadError> {
        std::thread::sleep(self.poll_interval);
        let latest = self.client.fetch_klines(&self.symbol, self.interval, 2)?;
        let mut history = self.cache.take().unwrap_or_default();
        history.extend(latest);
        let history = self.trim(normalize_bars(history));
        self.cache = Some(history.clone());
        Ok(history)
    }
}

impl<C: KlineClient> MarketDataFeed for ExchangeFeed<C> {
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
        let limit = self.lookback.min(MAX_KLINES_PER_REQUEST);
        if limit < self.lookback {
            tracing::warn!(
                lookback = self.lookback,
                limit,
                "lookback exceeds the per-request kline limit, fetching fewer bars"
            );
        }
        let bars = self.trim(normalize_bars(
            self.client.fetch_klines(&self.symbol, self.interval, limit)?,
        ));
        tracing::info!(symbol = %self.symbol, bars = bars.len(), "loaded exchange history");
        self.cache = Some(bars.clone());
        Ok(bars)
    }

    fn next_snapshot(&mut self) -> Result<Option<MarketSnapshot>, SilkroadError> {
        if !self.started {
            self.started = true;
            let history = match &self.cache {
                Some(bars) => bars.clone(),
                None => self.load_history()?,
            };
            return Ok(Some(MarketSnapshot::new(history)));
        }
        let history = self.poll()?;
        Ok(Some(MarketSnapshot::new(history)))
    }
}
