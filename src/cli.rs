//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::execution::ExecutionRegistry;
use crate::adapters::feed_factory::parse_source;
use crate::adapters::yaml_config_adapter::YamlConfigAdapter;
use crate::app::SilkroadApp;
use crate::domain::backtest::BacktestResult;
use crate::domain::config::AppConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::error::SilkroadError;
use crate::domain::strategy::StrategyRegistry;

#[derive(Parser, Debug)]
#[command(name = "silkroad", about = "Config-driven algorithmic trading bot")]
pub struct Cli {
    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the YAML config file
    #[arg(short, long)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured backtest and print a summary
    Backtest,
    /// Run the live trading loop
    Live {
        /// Stop after this many market snapshots
        #[arg(long)]
        max_cycles: Option<usize>,
    },
    /// Load and validate the config without trading
    Validate,
    /// Start the web dashboard
    Serve {
        /// Address to bind, overriding `web.listen` in the config
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);

    let outcome = match &cli.command {
        Command::Backtest => run_backtest(&cli.config),
        Command::Live { max_cycles } => run_live(&cli.config, *max_cycles),
        Command::Validate => run_validate(&cli.config),
        Command::Serve { listen } => run_serve(&cli.config, listen.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "silkroad=debug" } else { "silkroad=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when `run` is called more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `Backtest complete | strategy=... | total_return=...% | sharpe=... | trades=...`
pub fn format_backtest_summary(result: &BacktestResult) -> String {
    let sharpe = result
        .sharpe_ratio
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"));
    format!(
        "Backtest complete | strategy={} | total_return={:.2}% | sharpe={} | trades={}",
        result.strategy_name,
        result.total_return * 100.0,
        sharpe,
        result.total_trades
    )
}

fn run_backtest(config_path: &Path) -> Result<(), SilkroadError> {
    let mut app = SilkroadApp::from_file(config_path)?;
    let result = app.run_backtest()?;
    println!("{}", format_backtest_summary(&result));
    Ok(())
}

fn run_live(config_path: &Path, max_cycles: Option<usize>) -> Result<(), SilkroadError> {
    let mut app = SilkroadApp::from_file(config_path)?;
    let summary = app.run_live(max_cycles)?;
    println!(
        "Live session finished | cycles={} | executed={} | blocked={}",
        summary.cycles, summary.executed, summary.blocked
    );
    Ok(())
}

/// Checks everything `SilkroadApp` would check, without opening connections.
pub fn validate_app_config(config: &AppConfig) -> Result<(), SilkroadError> {
    validate_config(config)?;
    parse_source(&config.data.source)?;

    let strategies = StrategyRegistry::default();
    strategies.build(&config.strategy.name, &config.strategy.parameters)?;

    let engines = ExecutionRegistry::default();
    if !engines.contains(&config.execution.name) {
        return Err(SilkroadError::NotRegistered {
            kind: "Execution engine",
            name: config.execution.name.clone(),
        });
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SilkroadError> {
    let config = YamlConfigAdapter::from_file(config_path)?.app_config()?;
    validate_app_config(&config)?;

    println!("Config OK: {}", config_path.display());
    println!("  environment: {}", config.environment);
    println!(
        "  data:        {} {} @ {} (lookback {})",
        config.data.source, config.data.symbol, config.data.interval, config.data.lookback
    );
    println!("  strategy:    {}", config.strategy.name);
    println!("  execution:   {}", config.execution.name);
    println!(
        "  backtest:    {}",
        if config.backtest.is_some() { "configured" } else { "not configured" }
    );
    println!(
        "  analytics:   {}",
        config
            .enabled_analytics()
            .map_or_else(|| "disabled".to_string(), |a| a.database.clone())
    );
    Ok(())
}

#[cfg(feature = "web")]
fn run_serve(config_path: &Path, listen: Option<&str>) -> Result<(), SilkroadError> {
    use crate::adapters::web::{serve, AppState, DEFAULT_LISTEN};
    use crate::ports::config_port::ConfigPort;
    use std::net::SocketAddr;

    let adapter = YamlConfigAdapter::from_file(config_path)?;
    let raw_addr = listen
        .map(str::to_string)
        .or_else(|| adapter.get_string("web", "listen"))
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let addr: SocketAddr = raw_addr
        .parse()
        .map_err(|e: std::net::AddrParseError| SilkroadError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("'{raw_addr}': {e}"),
        })?;

    let state = AppState {
        config_path: config_path.to_path_buf(),
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(state, addr))
}

#[cfg(not(feature = "web"))]
fn run_serve(_config_path: &Path, _listen: Option<&str>) -> Result<(), SilkroadError> {
    Err(SilkroadError::InvalidState(
        "The web feature is required for serve.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(sharpe: Option<f64>) -> BacktestResult {
        BacktestResult {
            strategy_name: "momentum".into(),
            starting_cash: 10_000.0,
            ending_value: 10_523.4,
            total_return: 0.05234,
            total_trades: 3,
            sharpe_ratio: sharpe,
            run_id: "abc".into(),
            completed_at: Utc::now(),
            extra_metrics: BTreeMap::new(),
            equity_curve: Vec::new(),
            price_series: Vec::new(),
        }
    }

    #[test]
    fn summary_line_format() {
        assert_eq!(
            format_backtest_summary(&result(Some(1.23456))),
            "Backtest complete | strategy=momentum | total_return=5.23% | sharpe=1.23 | trades=3"
        );
    }

    #[test]
    fn summary_without_sharpe() {
        assert!(format_backtest_summary(&result(None)).contains("sharpe=n/a"));
    }

    #[test]
    fn parses_config_and_subcommand() {
        let cli = Cli::try_parse_from([
            "silkroad", "-v", "--config", "cfg.yml", "live", "--max-cycles", "3",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("cfg.yml"));
        assert!(matches!(cli.command, Command::Live { max_cycles: Some(3) }));
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["silkroad", "backtest"]).is_err());
    }
}
