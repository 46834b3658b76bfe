//! In-memory data feed for tests, demos and dry runs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::{normalize_bars, Bar, Interval};
use crate::domain::snapshot::MarketSnapshot;
use crate::ports::data_port::MarketDataFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// Constant bars: open 100, high 101, low 99, close 100.5.
    Flat,
    /// Closes oscillate around 100.
    Sine,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticFeedParameters {
    pub pattern: Pattern,
    pub amplitude: f64,
    /// Bars per full oscillation.
    pub period: usize,
}

impl Default for StaticFeedParameters {
    fn default() -> Self {
        StaticFeedParameters {
            pattern: Pattern::Flat,
            amplitude: 5.0,
            period: 24,
        }
    }
}

impl StaticFeedParameters {
    pub fn from_parameters(params: &Map<String, Value>) -> Result<Self, SilkroadError> {
        let parsed: StaticFeedParameters = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| SilkroadError::InvalidParameters {
                component: "static feed".to_string(),
                reason: e.to_string(),
            })?;
        if parsed.period == 0 {
            return Err(SilkroadError::InvalidParameters {
                component: "static feed".to_string(),
                reason: "period must be at least 1".to_string(),
            });
        }
        Ok(parsed)
    }
}

pub struct StaticFeed {
    symbol: String,
    interval: Interval,
    lookback: usize,
    data: Vec<Bar>,
    streamed: bool,
}

impl StaticFeed {
    /// Feed over explicit bars.
    pub fn with_bars(symbol: &str, interval: Interval, bars: Vec<Bar>) -> Self {
        let data = normalize_bars(bars);
        Self {
            symbol: symbol.to_string(),
            interval,
            lookback: data.len(),
            data,
            streamed: false,
        }
    }

    /// `lookback` synthetic bars spaced by `interval`, the last one at `end`.
    pub fn synthetic(
        symbol: &str,
        interval: Interval,
        lookback: usize,
        end: DateTime<Utc>,
        params: &StaticFeedParameters,
    ) -> Result<Self, SilkroadError> {
        let mut bars = Vec::with_capacity(lookback);
        let mut prev_close = 100.0;
        for i in 0..lookback {
            let timestamp = interval.steps_before(end, lookback - 1 - i).ok_or_else(|| {
                SilkroadError::DataFeed {
                    symbol: symbol.to_string(),
                    reason: format!(
                        "{lookback} bars of {interval} end before the earliest supported date"
                    ),
                }
            })?;
            let bar = match params.pattern {
                Pattern::Flat => Bar {
                    timestamp,
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.5,
                    volume: 1.0,
                },
                Pattern::Sine => {
                    let phase = 2.0 * std::f64::consts::PI * i as f64 / params.period as f64;
                    let close = 100.0 + params.amplitude * phase.sin();
                    let open = prev_close;
                    Bar {
                        timestamp,
                        open,
                        high: open.max(close) + 0.5,
                        low: open.min(close) - 0.5,
                        close,
                        volume: 1.0,
                    }
                }
            };
            prev_close = bar.close;
            bars.push(bar);
        }
        Ok(Self {
            symbol: symbol.to_string(),
            interval,
            lookback,
            data: bars,
            streamed: false,
        })
    }
}

impl MarketDataFeed for StaticFeed {
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
        Ok(self.data.clone())
    }

    fn next_snapshot(&mut self) -> Result<Option<MarketSnapshot>, SilkroadError> {
        if self.streamed {
            return Ok(None);
        }
        self.streamed = true;
        Ok(Some(MarketSnapshot::new(self.data.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn hourly() -> Interval {
        "1h".parse().unwrap()
    }

    #[test]
    fn flat_synthetic_bars() {
        let mut feed =
            StaticFeed::synthetic("BTC/USDT", hourly(), 5, end(), &StaticFeedParameters::default())
                .unwrap();
        let bars = feed.load_history().unwrap();
        assert_eq!(bars.len(), 5);
        assert_eq!(bars[4].timestamp, end());
        assert_eq!(bars[0].timestamp, end() - Duration::hours(4));
        assert!(bars.iter().all(|b| b.open == 100.0 && b.close == 100.5));
        assert!(bars.iter().all(|b| b.high == 101.0 && b.low == 99.0));
    }

    #[test]
    fn sine_pattern_oscillates() {
        let params = StaticFeedParameters::from_parameters(
            json!({"pattern": "sine", "period": 4, "amplitude": 10.0})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        let mut feed = StaticFeed::synthetic("X", hourly(), 8, end(), &params).unwrap();
        let closes: Vec<f64> = feed.load_history().unwrap().iter().map(|b| b.close).collect();
        assert!((closes[1] - 110.0).abs() < 1e-9);
        assert!((closes[3] - 90.0).abs() < 1e-9);
        let bars = feed.load_history().unwrap();
        assert!(bars.iter().all(|b| b.high >= b.close && b.low <= b.close));
    }

    #[test]
    fn out_of_range_start_is_an_error() {
        let weekly: Interval = "1000w".parse().unwrap();
        let result =
            StaticFeed::synthetic("X", weekly, 20_000, end(), &StaticFeedParameters::default());
        assert!(matches!(result, Err(SilkroadError::DataFeed { .. })));
    }

    #[test]
    fn unknown_parameter_rejected() {
        let err =
            StaticFeedParameters::from_parameters(json!({"shape": "sine"}).as_object().unwrap())
                .unwrap_err();
        assert!(matches!(err, SilkroadError::InvalidParameters { .. }));
    }

    #[test]
    fn streams_exactly_once() {
        let mut feed =
            StaticFeed::synthetic("X", hourly(), 3, end(), &StaticFeedParameters::default())
                .unwrap();
        let snap = feed.next_snapshot().unwrap().unwrap();
        assert_eq!(snap.len(), 3);
        assert!(feed.next_snapshot().unwrap().is_none());
    }

    #[test]
    fn with_bars_normalizes() {
        let bar = |h: i64, c: f64| Bar {
            timestamp: end() + Duration::hours(h),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1.0,
        };
        let mut feed =
            StaticFeed::with_bars("X", hourly(), vec![bar(1, 2.0), bar(0, 1.0), bar(1, 3.0)]);
        let closes: Vec<f64> = feed.load_history().unwrap().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 3.0]);
        assert_eq!(feed.lookback(), 2);
    }
}
