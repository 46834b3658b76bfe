//! Live trading loop: poll the feed, compute a signal, gate it, execute it.

use super::error::SilkroadError;
use super::risk::RiskManager;
use super::strategy::Strategy;
use crate::ports::data_port::MarketDataFeed;
use crate::ports::execution_port::ExecutionEngine;
use crate::ports::notifier_port::Notifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub cycles: usize,
    pub executed: usize,
    pub blocked: usize,
}

pub struct TradingSession<'a> {
    pub feed: &'a mut dyn MarketDataFeed,
    pub strategy: &'a mut dyn Strategy,
    pub risk: &'a RiskManager,
    pub engine: &'a mut dyn ExecutionEngine,
    pub notifier: &'a dyn Notifier,
    /// Stop after this many snapshots; `None` runs until the feed ends.
    pub max_cycles: Option<usize>,
}

impl TradingSession<'_> {
    /// Run until the feed is exhausted or `max_cycles` is reached. The engine
    /// is shut down on every exit path.
    pub fn run(self) -> Result<SessionSummary, SilkroadError> {
        let TradingSession {
            feed,
            strategy,
            risk,
            engine,
            notifier,
            max_cycles,
        } = self;

        tracing::info!(
            symbol = feed.symbol(),
            strategy = strategy.name(),
            engine = engine.name(),
            "starting live session"
        );
        let outcome = drive(feed, strategy, risk, engine, notifier, max_cycles);
        let shutdown = engine.shutdown();

        match (outcome, shutdown) {
            (Ok(summary), Ok(())) => {
                tracing::info!(
                    cycles = summary.cycles,
                    executed = summary.executed,
                    blocked = summary.blocked,
                    "live session finished"
                );
                Ok(summary)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), shutdown) => {
                if let Err(shutdown_err) = shutdown {
                    tracing::error!(error = %shutdown_err, "engine shutdown failed");
                }
                Err(e)
            }
        }
    }
}

fn drive(
    feed: &mut dyn MarketDataFeed,
    strategy: &mut dyn Strategy,
    risk: &RiskManager,
    engine: &mut dyn ExecutionEngine,
    notifier: &dyn Notifier,
    max_cycles: Option<usize>,
) -> Result<SessionSummary, SilkroadError> {
    let history = feed.load_history()?;
    strategy.prepare(&history);

    let mut summary = SessionSummary::default();
    while max_cycles.is_none_or(|max| summary.cycles < max) {
        let Some(snapshot) = feed.next_snapshot()? else {
            break;
        };
        summary.cycles += 1;

        let signal = strategy.generate_signal(&snapshot);
        if let Err(violation) = risk.validate(&signal) {
            tracing::info!(side = %signal.side, %violation, "signal blocked by risk gate");
            notifier.send(&format!("Risk constraints blocked {} signal.", signal.side));
            summary.blocked += 1;
            continue;
        }

        let price = snapshot.latest().map(|bar| bar.close);
        engine.execute(&signal, price)?;
        summary.executed += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::{Bar, Interval};
    use crate::domain::signal::{Side, Signal};
    use crate::domain::snapshot::MarketSnapshot;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    struct RepeatingFeed {
        remaining: usize,
        loaded: bool,
    }

    impl MarketDataFeed for RepeatingFeed {
        fn symbol(&self) -> &str {
            "TEST/USDT"
        }

        fn interval(&self) -> Interval {
            "1h".parse().unwrap()
        }

        fn lookback(&self) -> usize {
            1
        }

        fn load_history(&mut self) -> Result<Vec<Bar>, SilkroadError> {
            self.loaded = true;
            Ok(vec![bar(0, 100.0)])
        }

        fn next_snapshot(&mut self) -> Result<Option<MarketSnapshot>, SilkroadError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(MarketSnapshot::new(vec![bar(1, 101.5)])))
        }
    }

    fn bar(hour: i64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    struct Fixed {
        signal: Signal,
        prepared: usize,
    }

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn prepare(&mut self, history: &[Bar]) {
            self.prepared = history.len();
        }

        fn generate_signal(&self, _snapshot: &MarketSnapshot) -> Signal {
            self.signal.clone()
        }
    }

    #[derive(Default)]
    struct RecordingEngine {
        executed: Vec<(Side, Option<f64>)>,
        shutdowns: usize,
        fail: bool,
    }

    impl ExecutionEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn execute(&mut self, signal: &Signal, price: Option<f64>) -> Result<(), SilkroadError> {
            if self.fail {
                return Err(SilkroadError::Broker {
                    broker: "recording".into(),
                    reason: "rejected".into(),
                });
            }
            self.executed.push((signal.side, price));
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), SilkroadError> {
            self.shutdowns += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Captured(Mutex<Vec<String>>);

    impl Notifier for Captured {
        fn send(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn run_session(
        snapshots: usize,
        signal: Signal,
        engine: &mut RecordingEngine,
        notifier: &Captured,
        max_cycles: Option<usize>,
    ) -> (Result<SessionSummary, SilkroadError>, usize) {
        let mut feed = RepeatingFeed {
            remaining: snapshots,
            loaded: false,
        };
        let mut strategy = Fixed {
            signal,
            prepared: 0,
        };
        let risk = RiskManager::default();
        let result = TradingSession {
            feed: &mut feed,
            strategy: &mut strategy,
            risk: &risk,
            engine,
            notifier,
            max_cycles,
        }
        .run();
        assert!(feed.loaded);
        (result, strategy.prepared)
    }

    #[test]
    fn executes_each_snapshot_at_latest_close() {
        let mut engine = RecordingEngine::default();
        let notifier = Captured::default();
        let (result, prepared) =
            run_session(3, Signal::new(Side::Buy, 0.1), &mut engine, &notifier, None);
        let summary = result.unwrap();
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.executed, 3);
        assert_eq!(prepared, 1);
        assert_eq!(engine.executed, vec![(Side::Buy, Some(101.5)); 3]);
        assert_eq!(engine.shutdowns, 1);
    }

    #[test]
    fn blocked_signals_notify_and_skip() {
        let mut engine = RecordingEngine::default();
        let notifier = Captured::default();
        let (result, _) =
            run_session(2, Signal::new(Side::Sell, 0.9), &mut engine, &notifier, None);
        let summary = result.unwrap();
        assert_eq!(summary.blocked, 2);
        assert!(engine.executed.is_empty());
        let messages = notifier.0.lock().unwrap();
        assert_eq!(messages[0], "Risk constraints blocked sell signal.");
    }

    #[test]
    fn max_cycles_bounds_the_loop() {
        let mut engine = RecordingEngine::default();
        let notifier = Captured::default();
        let (result, _) = run_session(10, Signal::hold(), &mut engine, &notifier, Some(4));
        assert_eq!(result.unwrap().cycles, 4);
        assert_eq!(engine.executed.len(), 4);
    }

    #[test]
    fn engine_error_still_shuts_down() {
        let mut engine = RecordingEngine {
            fail: true,
            ..RecordingEngine::default()
        };
        let notifier = Captured::default();
        let (result, _) =
            run_session(2, Signal::new(Side::Buy, 0.1), &mut engine, &notifier, None);
        assert!(matches!(result, Err(SilkroadError::Broker { .. })));
        assert_eq!(engine.shutdowns, 1);
    }
}
