//! Performance metrics computed from a backtest's equity curve.

use super::ohlcv::Interval;
use super::portfolio::{EquityPoint, Portfolio};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    /// Annualised; `None` with fewer than two returns or zero variance.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    /// Mean of calendar-day returns; `None` for an empty curve.
    pub avg_daily_return: Option<f64>,
    pub total_trades: usize,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, interval: Interval) -> Self {
        let curve = &portfolio.equity_curve;
        let initial = portfolio.initial_capital;
        let final_equity = curve.last().map(|p| p.equity).unwrap_or(initial);

        let total_return = if initial > 0.0 {
            final_equity / initial - 1.0
        } else {
            0.0
        };

        let returns = period_returns(initial, curve);
        Metrics {
            total_return,
            sharpe_ratio: sharpe_ratio(&returns, interval.periods_per_year()),
            max_drawdown: max_drawdown(curve),
            avg_daily_return: avg_daily_return(initial, curve),
            total_trades: portfolio.closed_trades.len(),
        }
    }
}

/// Simple returns between consecutive equity marks, starting from `initial`.
pub fn period_returns(initial: f64, curve: &[EquityPoint]) -> Vec<f64> {
    let mut prev = initial;
    let mut out = Vec::with_capacity(curve.len());
    for point in curve {
        if prev > 0.0 {
            out.push(point.equity / prev - 1.0);
        }
        prev = point.equity;
    }
    out
}

/// Annualised Sharpe ratio with a zero risk-free rate.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev < 1e-12 || !std_dev.is_finite() {
        return None;
    }
    Some(mean / std_dev * periods_per_year.sqrt())
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

/// Mean return per calendar day (UTC), using each day's last mark.
pub fn avg_daily_return(initial: f64, curve: &[EquityPoint]) -> Option<f64> {
    let mut day_closes: Vec<f64> = Vec::new();
    let mut last_day = None;
    for point in curve {
        let day = point.timestamp.date_naive();
        if last_day == Some(day) {
            if let Some(last) = day_closes.last_mut() {
                *last = point.equity;
            }
        } else {
            day_closes.push(point.equity);
            last_day = Some(day);
        }
    }

    let mut prev = initial;
    let mut returns = Vec::with_capacity(day_closes.len());
    for equity in day_closes {
        if prev > 0.0 {
            returns.push(equity / prev - 1.0);
        }
        prev = equity;
    }
    if returns.is_empty() {
        return None;
    }
    Some(returns.iter().sum::<f64>() / returns.len() as f64)
}
