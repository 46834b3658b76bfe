//! Historical backtest over a single symbol.
//!
//! Bars are replayed in order. A signal at bar `i` becomes a target-percent
//! order that fills at bar `i + 1`'s open; stop-loss exits fill at the close
//! of the bar that triggers them. Equity is marked at every close.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::analytics::{PerformanceRecord, TradeRecord};
use super::config::BacktestConfig;
use super::error::SilkroadError;
use super::execution::{
    check_stop_loss, execute_order, target_quantity, Fill, QUANTITY_EPSILON,
};
use super::metrics::Metrics;
use super::ohlcv::normalize_bars;
use super::portfolio::{EquityPoint, Portfolio};
use super::risk::{RiskLimits, RiskManager};
use super::signal::Side;
use super::snapshot::MarketSnapshot;
use super::strategy::Strategy;
use crate::ports::analytics_port::AnalyticsSink;
use crate::ports::data_port::MarketDataFeed;

pub const SOURCE: &str = "backtest";

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub starting_cash: f64,
    pub ending_value: f64,
    pub total_return: f64,
    pub total_trades: usize,
    pub sharpe_ratio: Option<f64>,
    /// uuid v4, hex without dashes.
    pub run_id: String,
    pub completed_at: DateTime<Utc>,
    pub extra_metrics: BTreeMap<String, f64>,
    pub equity_curve: Vec<EquityPoint>,
    pub price_series: Vec<PricePoint>,
}

impl BacktestResult {
    pub fn pnl(&self) -> f64 {
        self.ending_value - self.starting_cash
    }
}

pub struct BacktestEngine {
    config: BacktestConfig,
    feed: Box<dyn MarketDataFeed>,
    limits: RiskLimits,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl BacktestEngine {
    pub fn new(
        config: BacktestConfig,
        feed: Box<dyn MarketDataFeed>,
        limits: RiskLimits,
        analytics: Option<Arc<dyn AnalyticsSink>>,
    ) -> Self {
        Self {
            config,
            feed,
            limits,
            analytics,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<BacktestResult, SilkroadError> {
        if !self.config.enabled {
            return Err(SilkroadError::InvalidState(
                "Backtesting is disabled in the current configuration.".to_string(),
            ));
        }

        let symbol = self.feed.symbol().to_string();
        let interval = self.feed.interval();
        let bars = normalize_bars(self.feed.load_history()?);
        if bars.is_empty() {
            return Err(SilkroadError::NoData { symbol });
        }
        tracing::info!(
            symbol = %symbol,
            bars = bars.len(),
            strategy = strategy.name(),
            "starting backtest"
        );

        strategy.prepare(&bars);
        let strategy_name = strategy.name().to_string();
        let bars = Arc::new(bars);
        // Each run gets its own drawdown watermark.
        let risk = RiskManager::new(self.limits.clone());
        let fill_config = self.config.fill_config(&self.limits);
        let mut portfolio = Portfolio::new(self.config.starting_cash);
        let mut price_series = Vec::with_capacity(bars.len());
        let mut pending: Option<f64> = None;

        for (i, bar) in bars.iter().enumerate() {
            if let Some(delta) = pending.take() {
                let fill = execute_order(
                    &mut portfolio,
                    &symbol,
                    delta,
                    bar.open,
                    bar.timestamp,
                    &fill_config,
                );
                self.log_fill(fill.as_ref(), &strategy_name)?;
            }

            let stop = check_stop_loss(
                &mut portfolio,
                &symbol,
                bar.close,
                bar.timestamp,
                &fill_config,
            );
            self.log_fill(stop.as_ref(), &strategy_name)?;

            let equity = portfolio.mark_to_market(&symbol, bar.close);
            portfolio.record_equity(bar.timestamp, equity);
            price_series.push(PricePoint {
                timestamp: bar.timestamp,
                close: bar.close,
            });
            risk.observe_equity(equity);

            let snapshot = MarketSnapshot::window(Arc::clone(&bars), i + 1);
            let signal = strategy.generate_signal(&snapshot);
            if let Err(violation) = risk.validate(&signal) {
                tracing::debug!(bar = i, side = %signal.side, %violation, "signal rejected");
                continue;
            }
            let target_fraction = match signal.side {
                Side::Buy => signal.size.min(1.0),
                Side::Sell => -signal.size.min(1.0),
                Side::Hold => continue,
            };
            let delta = target_quantity(equity, target_fraction, bar.close)
                - portfolio.quantity(&symbol);
            if delta.abs() > QUANTITY_EPSILON {
                pending = Some(delta);
            }
        }
        if let Some(delta) = pending {
            tracing::debug!(delta, "dropping order left pending after the last bar");
        }

        let metrics = Metrics::compute(&portfolio, interval);
        let ending_value = portfolio
            .equity_curve
            .last()
            .map_or(self.config.starting_cash, |p| p.equity);

        let mut extra_metrics = BTreeMap::new();
        extra_metrics.insert("max_drawdown".to_string(), metrics.max_drawdown);
        if let Some(avg) = metrics.avg_daily_return {
            extra_metrics.insert("avg_daily_return".to_string(), avg);
        }

        let result = BacktestResult {
            strategy_name,
            starting_cash: self.config.starting_cash,
            ending_value,
            total_return: metrics.total_return,
            total_trades: metrics.total_trades,
            sharpe_ratio: metrics.sharpe_ratio,
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            completed_at: Utc::now(),
            extra_metrics,
            equity_curve: portfolio.equity_curve,
            price_series,
        };
        tracing::info!(
            run_id = %result.run_id,
            total_return = result.total_return,
            trades = result.total_trades,
            "backtest complete"
        );

        self.log_performance(&result)?;
        Ok(result)
    }

    fn log_fill(&self, fill: Option<&Fill>, strategy: &str) -> Result<(), SilkroadError> {
        let (Some(sink), Some(fill)) = (&self.analytics, fill) else {
            return Ok(());
        };
        sink.log_trade(&TradeRecord {
            timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            side: fill.side.as_str().to_string(),
            quantity: fill.quantity,
            price: fill.price,
            strategy: strategy.to_string(),
            source: SOURCE.to_string(),
        })
    }

    fn log_performance(&self, result: &BacktestResult) -> Result<(), SilkroadError> {
        let Some(sink) = &self.analytics else {
            return Ok(());
        };
        let metadata = json!({ "strategy": result.strategy_name });
        let mut metrics = vec![("total_return", result.total_return)];
        if let Some(sharpe) = result.sharpe_ratio {
            metrics.push(("sharpe_ratio", sharpe));
        }
        for (metric, value) in metrics {
            sink.log_performance(&PerformanceRecord {
                run_id: result.run_id.clone(),
                timestamp: result.completed_at,
                metric: metric.to_string(),
                value,
                metadata: Some(metadata.clone()),
            })?;
        }
        Ok(())
    }
}
