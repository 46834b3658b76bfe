//! Builds a market data feed from the `data` config section.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use super::csv_adapter::CsvFeed;
use super::exchange_feed::{BinanceClient, ExchangeFeed};
use super::static_feed::{StaticFeed, StaticFeedParameters};
use crate::domain::config::DataFeedConfig;
use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::Interval;
use crate::ports::data_port::MarketDataFeed;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExchangeParameters {
    base_url: Option<String>,
    timeout_secs: f64,
}

impl Default for ExchangeParameters {
    fn default() -> Self {
        ExchangeParameters {
            base_url: None,
            timeout_secs: 10.0,
        }
    }
}

/// Data source selected by the `source` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Static,
    Csv(PathBuf),
    Exchange(String),
}

pub fn parse_source(source: &str) -> Result<SourceKind, SilkroadError> {
    let unsupported = || SilkroadError::UnsupportedSource {
        source_id: source.to_string(),
    };
    if source == "static" {
        return Ok(SourceKind::Static);
    }
    match source.split_once(':') {
        Some(("csv", path)) if !path.is_empty() => Ok(SourceKind::Csv(PathBuf::from(path))),
        Some(("exchange" | "ccxt", id)) if BinanceClient::base_url_for(id).is_some() => {
            Ok(SourceKind::Exchange(id.to_string()))
        }
        _ => Err(unsupported()),
    }
}

pub fn build_data_feed(config: &DataFeedConfig) -> Result<Box<dyn MarketDataFeed>, SilkroadError> {
    let interval: Interval =
        config
            .interval
            .parse()
            .map_err(|reason: String| SilkroadError::ConfigInvalid {
                section: "data".to_string(),
                key: "interval".to_string(),
                reason,
            })?;

    let feed: Box<dyn MarketDataFeed> = match parse_source(&config.source)? {
        SourceKind::Static => {
            let params = StaticFeedParameters::from_parameters(&config.parameters)?;
            Box::new(StaticFeed::synthetic(
                &config.symbol,
                interval,
                config.lookback,
                Utc::now(),
                &params,
            )?)
        }
        SourceKind::Csv(path) => Box::new(CsvFeed::new(
            path,
            &config.symbol,
            interval,
            config.lookback,
        )),
        SourceKind::Exchange(id) => {
            let params: ExchangeParameters =
                serde_json::from_value(Value::Object(config.parameters.clone())).map_err(|e| {
                    SilkroadError::InvalidParameters {
                        component: format!("exchange feed '{id}'"),
                        reason: e.to_string(),
                    }
                })?;
            let base_url = match &params.base_url {
                Some(url) => url.as_str(),
                None => BinanceClient::base_url_for(&id).unwrap_or_default(),
            };
            let timeout = seconds("timeout_secs", params.timeout_secs)?;
            let client = BinanceClient::new(base_url, timeout)?;
            Box::new(ExchangeFeed::new(
                client,
                &config.symbol,
                interval,
                config.lookback,
                seconds("poll_interval", config.poll_interval)?,
            ))
        }
    };
    tracing::debug!(source = %config.source, symbol = %config.symbol, "built data feed");
    Ok(feed)
}

fn seconds(key: &str, value: f64) -> Result<Duration, SilkroadError> {
    Duration::try_from_secs_f64(value).map_err(|e| SilkroadError::ConfigInvalid {
        section: "data".to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn data_config(source: &str) -> DataFeedConfig {
        DataFeedConfig {
            source: source.to_string(),
            symbol: "BTC/USDT".to_string(),
            interval: "1h".to_string(),
            lookback: 50,
            poll_interval: 5.0,
            parameters: Map::new(),
        }
    }

    #[test]
    fn parse_known_sources() {
        assert_eq!(parse_source("static").unwrap(), SourceKind::Static);
        assert_eq!(
            parse_source("csv:data/btc.csv").unwrap(),
            SourceKind::Csv(PathBuf::from("data/btc.csv"))
        );
        assert_eq!(
            parse_source("exchange:binance").unwrap(),
            SourceKind::Exchange("binance".into())
        );
        assert_eq!(
            parse_source("ccxt:binanceus").unwrap(),
            SourceKind::Exchange("binanceus".into())
        );
    }

    #[test]
    fn unsupported_sources_rejected() {
        for source in ["yahoo", "csv:", "ccxt:kraken", "exchange:"] {
            let err = parse_source(source).unwrap_err();
            assert_eq!(err.to_string(), format!("Unsupported data source '{source}'"));
        }
    }

    #[test]
    fn static_feed_has_lookback_bars() {
        let mut feed = build_data_feed(&data_config("static")).unwrap();
        assert_eq!(feed.symbol(), "BTC/USDT");
        assert_eq!(feed.load_history().unwrap().len(), 50);
    }

    #[test]
    fn static_feed_parameters_validated() {
        let mut cfg = data_config("static");
        cfg.parameters = json!({"pattern": "zigzag"}).as_object().cloned().unwrap();
        assert!(matches!(
            build_data_feed(&cfg),
            Err(SilkroadError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn exchange_feed_builds_without_network() {
        let feed = build_data_feed(&data_config("ccxt:binance")).unwrap();
        assert_eq!(feed.lookback(), 50);
    }

    #[test]
    fn bad_interval_is_config_error() {
        let mut cfg = data_config("static");
        cfg.interval = "fortnight".into();
        assert!(matches!(
            build_data_feed(&cfg),
            Err(SilkroadError::ConfigInvalid { .. })
        ));
    }
}
