//! Market snapshot: the history window a strategy sees on each step.

use super::ohlcv::Bar;
use std::sync::Arc;

/// Immutable view over a prefix of a bar history.
///
/// Backtests create one snapshot per bar over the same shared history, so the
/// bars are held behind an `Arc` and the snapshot only records where the
/// window ends.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    bars: Arc<Vec<Bar>>,
    end: usize,
}

impl MarketSnapshot {
    pub fn new(bars: Vec<Bar>) -> Self {
        let end = bars.len();
        Self {
            bars: Arc::new(bars),
            end,
        }
    }

    /// Window over `bars[..end]`. `end` is clamped to the history length.
    pub fn window(bars: Arc<Vec<Bar>>, end: usize) -> Self {
        let end = end.min(bars.len());
        Self { bars, end }
    }

    pub fn history(&self) -> &[Bar] {
        &self.bars[..self.end]
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.history().last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.history().iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64),
                open: i as f64,
                high: i as f64,
                low: i as f64,
                close: i as f64,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn full_snapshot_exposes_everything() {
        let snap = MarketSnapshot::new(bars(3));
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.latest().unwrap().close, 2.0);
        assert_eq!(snap.closes(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn window_truncates_history() {
        let shared = Arc::new(bars(5));
        let snap = MarketSnapshot::window(shared.clone(), 2);
        assert_eq!(snap.history().len(), 2);
        assert_eq!(snap.latest().unwrap().close, 1.0);

        let clamped = MarketSnapshot::window(shared, 99);
        assert_eq!(clamped.len(), 5);
    }

    #[test]
    fn empty_snapshot() {
        let snap = MarketSnapshot::new(Vec::new());
        assert!(snap.is_empty());
        assert!(snap.latest().is_none());
    }
}
