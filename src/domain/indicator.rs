//! Moving-average helpers used by strategies.

/// Simple moving average of the last `period` values, or `None` when there
/// are fewer than `period` values or `period` is zero.
pub fn sma_last(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
