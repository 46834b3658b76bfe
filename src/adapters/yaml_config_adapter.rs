//! YAML configuration adapter.
//!
//! Keeps the raw document for [`ConfigPort`] lookups and deserializes it into
//! the typed [`AppConfig`].

use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::domain::config::AppConfig;
use crate::domain::error::SilkroadError;
use crate::ports::config_port::ConfigPort;

pub struct YamlConfigAdapter {
    source: String,
    raw_text: String,
    document: Value,
}

impl YamlConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SilkroadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SilkroadError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), content)
    }

    pub fn from_string(content: &str) -> Result<Self, SilkroadError> {
        Self::parse("<inline>", content.to_string())
    }

    fn parse(source: &str, raw_text: String) -> Result<Self, SilkroadError> {
        let document: Value =
            serde_yaml::from_str(&raw_text).map_err(|e| SilkroadError::ConfigParse {
                file: source.to_string(),
                reason: e.to_string(),
            })?;
        let document = match document {
            Value::Null => Value::Mapping(Mapping::new()),
            mapping @ Value::Mapping(_) => mapping,
            _ => {
                return Err(SilkroadError::ConfigParse {
                    file: source.to_string(),
                    reason: "top level must be a mapping".to_string(),
                });
            }
        };
        Ok(Self {
            source: source.to_string(),
            raw_text,
            document,
        })
    }

    /// File path (or `<inline>`) the document came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn app_config(&self) -> Result<AppConfig, SilkroadError> {
        serde_yaml::from_value(self.document.clone()).map_err(|e| SilkroadError::ConfigParse {
            file: self.source.clone(),
            reason: e.to_string(),
        })
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        self.document.get(section)?.get(key)
    }
}

/// Load and deserialize a YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, SilkroadError> {
    YamlConfigAdapter::from_file(path)?.app_config()
}

impl ConfigPort for YamlConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match self.lookup(section, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.lookup(section, key)
            .and_then(Value::as_i64)
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.lookup(section, key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.lookup(section, key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
environment: paper
data:
  source: static
  symbol: BTC/USDT
  lookback: 120
strategy:
  name: momentum
  parameters:
    fast_window: 5
execution:
  name: paper
backtest:
  starting_cash: 5000
web:
  listen: 127.0.0.1:9000
  open_browser: false
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_file_parses_config() {
        let file = create_temp_config(SAMPLE);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.environment, "paper");
        assert_eq!(config.data.lookback, 120);
        assert_eq!(config.strategy.parameters["fast_window"], 5);
        assert_eq!(config.backtest.unwrap().starting_cash, 5000.0);
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_config("/nonexistent/silkroad.yml").unwrap_err();
        assert!(matches!(err, SilkroadError::ConfigNotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/silkroad.yml"));
    }

    #[test]
    fn empty_file_fails_on_required_sections() {
        let file = create_temp_config("");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, SilkroadError::ConfigParse { .. }));
        assert!(err.to_string().starts_with("Invalid configuration format"));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = YamlConfigAdapter::from_string("data: [unclosed").err().unwrap();
        assert!(matches!(err, SilkroadError::ConfigParse { .. }));
    }

    #[test]
    fn scalar_document_is_parse_error() {
        let err = YamlConfigAdapter::from_string("just a string").err().unwrap();
        assert!(err.to_string().contains("top level must be a mapping"));
    }

    #[test]
    fn port_lookups_over_raw_document() {
        let adapter = YamlConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("127.0.0.1:9000".to_string())
        );
        assert!(!adapter.get_bool("web", "open_browser", true));
        assert_eq!(adapter.get_int("data", "lookback", 0), 120);
        assert_eq!(adapter.get_double("backtest", "starting_cash", 0.0), 5000.0);
        assert_eq!(adapter.get_double("backtest", "missing", 1.5), 1.5);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn raw_text_preserved_for_preview() {
        let adapter = YamlConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.raw_text(), SAMPLE);
        assert_eq!(adapter.source(), "<inline>");
    }
}
