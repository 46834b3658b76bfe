//! Composition root: turns an `AppConfig` into wired components.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::execution::{ExecutionContext, ExecutionRegistry};
use crate::adapters::feed_factory::build_data_feed;
use crate::adapters::notifier::build_notifier;
use crate::adapters::sqlite_adapter::AnalyticsStore;
use crate::adapters::yaml_config_adapter::YamlConfigAdapter;
use crate::domain::backtest::{BacktestEngine, BacktestResult};
use crate::domain::config::AppConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::error::SilkroadError;
use crate::domain::risk::RiskManager;
use crate::domain::session::{SessionSummary, TradingSession};
use crate::domain::strategy::{Strategy, StrategyRegistry};
use crate::ports::analytics_port::AnalyticsSink;
use crate::ports::data_port::MarketDataFeed;
use crate::ports::execution_port::ExecutionEngine;
use crate::ports::notifier_port::Notifier;

pub struct SilkroadApp {
    config: AppConfig,
    feed: Box<dyn MarketDataFeed>,
    strategy: Box<dyn Strategy>,
    risk: RiskManager,
    notifier: Arc<dyn Notifier>,
    analytics: Option<Arc<AnalyticsStore>>,
    engine: Box<dyn ExecutionEngine>,
    backtest: Option<BacktestEngine>,
}

impl SilkroadApp {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SilkroadError> {
        let config = YamlConfigAdapter::from_file(path)?.app_config()?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self, SilkroadError> {
        Self::with_registries(
            config,
            &StrategyRegistry::default(),
            &ExecutionRegistry::default(),
        )
    }

    /// Build with caller-supplied registries, for custom strategies or
    /// execution engines.
    pub fn with_registries(
        config: AppConfig,
        strategies: &StrategyRegistry,
        engines: &ExecutionRegistry,
    ) -> Result<Self, SilkroadError> {
        validate_config(&config)?;

        let feed = build_data_feed(&config.data)?;
        let strategy = strategies.build(&config.strategy.name, &config.strategy.parameters)?;
        let limits = config.risk_limits();
        let risk = RiskManager::new(limits.clone());
        let notifier: Arc<dyn Notifier> = Arc::new(build_notifier(config.monitoring.as_ref())?);

        let analytics = match config.enabled_analytics() {
            Some(settings) => Some(Arc::new(AnalyticsStore::open(&settings.database)?)),
            None => None,
        };
        let sink = analytics
            .as_ref()
            .map(|store| Arc::clone(store) as Arc<dyn AnalyticsSink>);

        let context = ExecutionContext {
            symbol: config.data.symbol.clone(),
            notifier: Arc::clone(&notifier),
            analytics: sink.clone(),
        };
        let engine = engines.build(
            &config.execution.name,
            &config.execution.parameters,
            &context,
        )?;

        let backtest = match &config.backtest {
            Some(settings) => Some(BacktestEngine::new(
                settings.clone(),
                build_data_feed(&config.data)?,
                limits,
                sink,
            )),
            None => None,
        };

        tracing::info!(
            environment = %config.environment,
            source = %config.data.source,
            symbol = %config.data.symbol,
            strategy = strategy.name(),
            engine = engine.name(),
            analytics = analytics.is_some(),
            "application assembled"
        );

        Ok(Self {
            config,
            feed,
            strategy,
            risk,
            notifier,
            analytics,
            engine,
            backtest,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn analytics(&self) -> Option<&AnalyticsStore> {
        self.analytics.as_deref()
    }

    pub fn has_backtest(&self) -> bool {
        self.backtest.is_some()
    }

    /// Poll, compute, gate and execute until the feed ends or `max_cycles`
    /// snapshots have been processed.
    pub fn run_live(&mut self, max_cycles: Option<usize>) -> Result<SessionSummary, SilkroadError> {
        TradingSession {
            feed: self.feed.as_mut(),
            strategy: self.strategy.as_mut(),
            risk: &self.risk,
            engine: self.engine.as_mut(),
            notifier: self.notifier.as_ref(),
            max_cycles,
        }
        .run()
    }

    pub fn run_backtest(&mut self) -> Result<BacktestResult, SilkroadError> {
        let backtest = self.backtest.as_mut().ok_or_else(|| {
            SilkroadError::InvalidState("Backtest engine is not configured.".to_string())
        })?;
        backtest.run(self.strategy.as_mut())
    }
}
