//! Analytics sink port.

use crate::domain::analytics::{PerformanceRecord, TradeRecord};
use crate::domain::error::SilkroadError;

pub trait AnalyticsSink: Send + Sync {
    fn log_trade(&self, record: &TradeRecord) -> Result<(), SilkroadError>;

    fn log_performance(&self, record: &PerformanceRecord) -> Result<(), SilkroadError>;
}
