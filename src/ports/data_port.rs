//! Market data port.

use crate::domain::error::SilkroadError;
use crate::domain::ohlcv::{Bar, Interval};
use crate::domain::snapshot::MarketSnapshot;

/// A source of bars for one symbol.
///
/// `load_history` returns the warm-up window; `next_snapshot` drives the live
/// stream and returns `Ok(None)` once the stream is exhausted. Finite feeds
/// yield a single snapshot; polling feeds block between snapshots.
pub trait MarketDataFeed: Send {
    fn symbol(&self) -> &str;

    fn interval(&self) -> Interval;

    fn lookback(&self) -> usize;

    /// Bars sorted ascending with unique timestamps.
    fn load_history(&mut self) -> Result<Vec<Bar>, SilkroadError>;

    fn next_snapshot(&mut self) -> Result<Option<MarketSnapshot>, SilkroadError>;
}
