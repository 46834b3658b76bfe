#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use silkroad::domain::error::SilkroadError;
use silkroad::domain::signal::Signal;
use silkroad::ports::execution_port::ExecutionEngine;
use silkroad::ports::notifier_port::Notifier;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn write_temp_yaml(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Closes rising by 1 per day for `up` days, then falling by 1.5 per day
/// for `down` days. Open equals close.
pub fn up_then_down_closes(up: usize, down: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..up).map(|i| 100.0 + i as f64).collect();
    let peak = closes.last().copied().unwrap_or(100.0);
    closes.extend((1..=down).map(|i| peak - 1.5 * i as f64));
    closes
}

/// Daily OHLCV CSV with the given closes.
pub fn write_csv(dir: &Path, closes: &[f64]) -> std::path::PathBuf {
    let path = dir.join("prices.csv");
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        let ts = start() + Duration::days(i as i64);
        out.push_str(&format!(
            "{},{close},{},{},{close},1000\n",
            ts.format("%Y-%m-%d"),
            close + 1.0,
            close - 1.0
        ));
    }
    std::fs::write(&path, out).unwrap();
    path
}

/// A config document with the given data source and optional extra
/// top-level sections appended verbatim.
pub fn config_yaml(source: &str, extra: &str) -> String {
    format!(
        r#"environment: development
data:
  source: "{source}"
  symbol: BTC/USDT
  interval: 1d
  lookback: 200
strategy:
  name: momentum
  parameters:
    fast_window: 2
    slow_window: 5
execution:
  name: paper
{extra}"#
    )
}

#[derive(Clone, Default)]
pub struct CaptureNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl CaptureNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for CaptureNotifier {
    fn send(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Records every executed signal and whether it was shut down.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub executed: Arc<Mutex<Vec<(Signal, Option<f64>)>>>,
    pub shut_down: Arc<Mutex<bool>>,
}

impl ExecutionEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn execute(&mut self, signal: &Signal, price: Option<f64>) -> Result<(), SilkroadError> {
        self.executed.lock().unwrap().push((signal.clone(), price));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), SilkroadError> {
        *self.shut_down.lock().unwrap() = true;
        Ok(())
    }
}
