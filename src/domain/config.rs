//! Typed application configuration.
//!
//! Parsed from YAML by the config adapter. Optional sections stay `None`
//! when absent so callers can tell "not configured" from "defaults".

use serde::Deserialize;
use serde_json::{Map, Value};

use super::execution::FillConfig;
use super::risk::RiskLimits;

pub const ENVIRONMENTS: [&str; 3] = ["development", "paper", "production"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    pub data: DataFeedConfig,
    pub strategy: StrategyConfig,
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub backtest: Option<BacktestConfig>,
    #[serde(default)]
    pub risk: Option<RiskConfig>,
    #[serde(default)]
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub analytics: Option<AnalyticsConfig>,
}

fn default_environment() -> String {
    "development".to_string()
}

impl AppConfig {
    pub fn risk_limits(&self) -> RiskLimits {
        self.risk
            .as_ref()
            .map(RiskConfig::limits)
            .unwrap_or_default()
    }

    /// Analytics section, only when enabled.
    pub fn enabled_analytics(&self) -> Option<&AnalyticsConfig> {
        self.analytics.as_ref().filter(|a| a.enabled)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataFeedConfig {
    pub source: String,
    pub symbol: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Seconds between polls of a streaming source.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_lookback() -> usize {
    365
}

fn default_poll_interval() -> f64 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutionConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub enabled: bool,
    pub starting_cash: f64,
    /// Fraction of traded value.
    pub commission: f64,
    /// Fraction of price.
    pub slippage: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            enabled: true,
            starting_cash: 10_000.0,
            commission: 0.001,
            slippage: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn fill_config(&self, limits: &RiskLimits) -> FillConfig {
        FillConfig {
            commission: self.commission,
            slippage: self.slippage,
            stop_loss_pct: limits.stop_loss_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_position_size: f64,
    pub max_drawdown: f64,
    pub stop_loss_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let limits = RiskLimits::default();
        RiskConfig {
            max_position_size: limits.max_position_fraction,
            max_drawdown: limits.max_drawdown,
            stop_loss_pct: limits.stop_loss_pct,
        }
    }
}

impl RiskConfig {
    pub fn limits(&self) -> RiskLimits {
        RiskLimits {
            max_position_fraction: self.max_position_size,
            max_drawdown: self.max_drawdown,
            stop_loss_pct: self.stop_loss_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub channels: Map<String, Value>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        MonitoringConfig {
            enabled: true,
            channels: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub backend: String,
    pub database: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        AnalyticsConfig {
            enabled: false,
            backend: "sqlite".to_string(),
            database: "data/silkroad.db".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
data:
  source: static
  symbol: BTC/USDT
strategy:
  name: momentum
execution:
  name: paper
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.data.interval, "1h");
        assert_eq!(cfg.data.lookback, 365);
        assert_eq!(cfg.data.poll_interval, 5.0);
        assert!(cfg.data.parameters.is_empty());
        assert!(cfg.strategy.parameters.is_empty());
        assert!(cfg.backtest.is_none());
        assert!(cfg.risk.is_none());
        assert!(cfg.monitoring.is_none());
        assert!(cfg.analytics.is_none());
        assert_eq!(cfg.risk_limits(), RiskLimits::default());
        assert!(cfg.enabled_analytics().is_none());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let yaml = format!(
            "{MINIMAL}backtest:\n  commission: 0.0005\nrisk:\n  max_drawdown: 0.3\nanalytics:\n  enabled: true\n"
        );
        let cfg: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        let bt = cfg.backtest.as_ref().unwrap();
        assert!(bt.enabled);
        assert_eq!(bt.starting_cash, 10_000.0);
        assert_eq!(bt.commission, 0.0005);
        assert_eq!(bt.slippage, 0.0);

        let limits = cfg.risk_limits();
        assert_eq!(limits.max_position_fraction, 0.1);
        assert_eq!(limits.max_drawdown, 0.3);

        let analytics = cfg.enabled_analytics().unwrap();
        assert_eq!(analytics.backend, "sqlite");
        assert_eq!(analytics.database, "data/silkroad.db");
    }

    #[test]
    fn missing_required_section_is_an_error() {
        let err = serde_yaml::from_str::<AppConfig>("data:\n  source: static\n  symbol: X\n");
        assert!(err.is_err());
    }

    #[test]
    fn unknown_top_level_sections_are_ignored() {
        let yaml = format!("{MINIMAL}web:\n  listen: 127.0.0.1:9000\n");
        assert!(serde_yaml::from_str::<AppConfig>(&yaml).is_ok());
    }

    #[test]
    fn fill_config_takes_stop_from_risk() {
        let bt = BacktestConfig::default();
        let fill = bt.fill_config(&RiskLimits::default());
        assert_eq!(fill.commission, 0.001);
        assert_eq!(fill.stop_loss_pct, 0.05);
    }
}
