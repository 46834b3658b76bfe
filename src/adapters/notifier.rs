//! Notification channels.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::domain::config::MonitoringConfig;
use crate::domain::error::SilkroadError;
use crate::ports::notifier_port::Notifier;

pub struct PrintNotifier;

impl PrintNotifier {
    pub fn format(message: &str) -> String {
        format!("[SilkRoad] {message}")
    }
}

impl Notifier for PrintNotifier {
    fn send(&self, message: &str) {
        println!("{}", Self::format(message));
    }
}

/// Emits notifications as `tracing` events.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: &str) {
        tracing::info!(target: "silkroad::notify", "{message}");
    }
}

/// POSTs `{"text": message}` to a webhook URL.
pub struct WebhookNotifier {
    http: reqwest::blocking::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, SilkroadError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SilkroadError::InvalidParameters {
                component: "webhook notifier".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, message: &str) {
        match self.http.post(&self.url).json(&json!({ "text": message })).send() {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => tracing::warn!(url = %self.url, status = %resp.status(), "webhook send failed"),
            Err(e) => tracing::warn!(url = %self.url, error = %e, "webhook error"),
        }
    }
}

/// Sends every message to all inner notifiers.
pub struct FanoutNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Notifier for FanoutNotifier {
    fn send(&self, message: &str) {
        for notifier in &self.notifiers {
            notifier.send(message);
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WebhookChannel {
    url: String,
}

/// Print notifier, plus one notifier per recognised channel when monitoring
/// is enabled. Unknown channels are logged and skipped.
pub fn build_notifier(
    config: Option<&MonitoringConfig>,
) -> Result<FanoutNotifier, SilkroadError> {
    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(PrintNotifier)];
    let Some(config) = config.filter(|c| c.enabled) else {
        return Ok(FanoutNotifier::new(notifiers));
    };

    for (name, settings) in &config.channels {
        match name.as_str() {
            "log" => notifiers.push(Box::new(LogNotifier)),
            "webhook" => {
                let channel: WebhookChannel =
                    serde_json::from_value(settings.clone()).map_err(|e| {
                        SilkroadError::ConfigInvalid {
                            section: "monitoring".to_string(),
                            key: "channels.webhook".to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                notifiers.push(Box::new(WebhookNotifier::new(&channel.url)?));
            }
            other => {
                tracing::warn!(channel = other, "ignoring unknown notification channel");
            }
        }
    }
    Ok(FanoutNotifier::new(notifiers))
}

/// Channel names `build_notifier` would activate, for status displays.
pub fn active_channels(config: Option<&MonitoringConfig>) -> Vec<String> {
    let mut channels = vec!["print".to_string()];
    if let Some(config) = config.filter(|c| c.enabled) {
        channels.extend(
            config
                .channels
                .iter()
                .filter(|(name, settings)| match name.as_str() {
                    "log" => true,
                    "webhook" => settings.get("url").is_some_and(Value::is_string),
                    _ => false,
                })
                .map(|(name, _)| name.clone()),
        );
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::sync::{Arc, Mutex};

    struct Capture(Arc<Mutex<Vec<String>>>);

    impl Notifier for Capture {
        fn send(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn monitoring(enabled: bool, channels: Value) -> MonitoringConfig {
        MonitoringConfig {
            enabled,
            channels: channels.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    #[test]
    fn print_format_has_prefix() {
        assert_eq!(PrintNotifier::format("hello"), "[SilkRoad] hello");
    }

    #[test]
    fn fanout_reaches_everyone() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let fanout = FanoutNotifier::new(vec![
            Box::new(Capture(seen.clone())),
            Box::new(Capture(seen.clone())),
        ]);
        fanout.send("ping");
        assert_eq!(*seen.lock().unwrap(), vec!["ping", "ping"]);
    }

    #[test]
    fn absent_config_prints_only() {
        assert_eq!(build_notifier(None).unwrap().len(), 1);
        assert_eq!(active_channels(None), vec!["print"]);
    }

    #[test]
    fn disabled_monitoring_ignores_channels() {
        let cfg = monitoring(false, json!({"log": {}}));
        assert_eq!(build_notifier(Some(&cfg)).unwrap().len(), 1);
    }

    #[test]
    fn recognised_channels_added() {
        let cfg = monitoring(
            true,
            json!({"log": {}, "webhook": {"url": "http://127.0.0.1:9/hook"}, "pager": {}}),
        );
        assert_eq!(build_notifier(Some(&cfg)).unwrap().len(), 3);
        assert_eq!(active_channels(Some(&cfg)), vec!["print", "log", "webhook"]);
    }

    #[test]
    fn webhook_without_url_is_config_error() {
        let cfg = monitoring(true, json!({"webhook": {}}));
        assert!(matches!(
            build_notifier(Some(&cfg)),
            Err(SilkroadError::ConfigInvalid { .. })
        ));
    }
}
