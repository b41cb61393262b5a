//! Bus configuration.

use std::time::Duration;

use crate::error::NetError;
use crate::topics::{DEFAULT_NEWS_TOPIC, DEFAULT_PRICE_TOPIC};

/// Default bootstrap server list.
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:4222";

/// Environment variable enabling bus usage (`1`, `true` or `yes`).
pub const ENABLE_BUS_ENV: &str = "ENABLE_BUS";
/// Environment variable holding comma-separated `host:port` entries.
pub const BOOTSTRAP_SERVERS_ENV: &str = "BUS_BOOTSTRAP_SERVERS";
/// Environment variable overriding the price topic.
pub const PRICE_TOPIC_ENV: &str = "BUS_PRICE_TOPIC";
/// Environment variable overriding the news topic.
pub const NEWS_TOPIC_ENV: &str = "BUS_NEWS_TOPIC";
/// Environment variable overriding the connect timeout, in milliseconds.
pub const CONNECT_TIMEOUT_ENV: &str = "BUS_CONNECT_TIMEOUT_MS";

/// Configuration for the bus bridge. Built once at process start.
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    /// Whether any bus operation is attempted at all.
    pub enabled: bool,
    /// Bootstrap servers as `host:port` entries.
    pub servers: Vec<String>,
    /// Topic for price events.
    pub price_topic: String,
    /// Topic for news items.
    pub news_topic: String,
    /// Upper bound on establishing the shared connection.
    pub connect_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            servers: parse_servers(DEFAULT_BOOTSTRAP_SERVERS),
            price_topic: DEFAULT_PRICE_TOPIC.to_string(),
            news_topic: DEFAULT_NEWS_TOPIC.to_string(),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl BusConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, NetError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Unset keys keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if a key is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(flag) = lookup(ENABLE_BUS_ENV) {
            config.enabled = parse_flag(&flag);
        }
        if let Some(raw) = lookup(BOOTSTRAP_SERVERS_ENV) {
            let servers = parse_servers(&raw);
            if servers.is_empty() {
                return Err(NetError::Config {
                    key: BOOTSTRAP_SERVERS_ENV,
                    value: raw,
                });
            }
            config.servers = servers;
        }
        if let Some(topic) = lookup(PRICE_TOPIC_ENV).filter(|t| !t.trim().is_empty()) {
            config.price_topic = topic.trim().to_string();
        }
        if let Some(topic) = lookup(NEWS_TOPIC_ENV).filter(|t| !t.trim().is_empty()) {
            config.news_topic = topic.trim().to_string();
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| NetError::Config {
                key: CONNECT_TIMEOUT_ENV,
                value: raw.clone(),
            })?;
            config.connect_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Enable or disable bus usage.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replace the bootstrap servers with a comma-separated list.
    #[must_use]
    pub fn with_servers(mut self, servers: &str) -> Self {
        self.servers = parse_servers(servers);
        self
    }

    /// Override the price topic.
    #[must_use]
    pub fn with_price_topic(mut self, topic: impl Into<String>) -> Self {
        self.price_topic = topic.into();
        self
    }

    /// Override the news topic.
    #[must_use]
    pub fn with_news_topic(mut self, topic: impl Into<String>) -> Self {
        self.news_topic = topic.into();
        self
    }
}

/// Interpret an enable flag the way operators write it.
fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Split a comma-separated server list, dropping blank entries.
#[must_use]
pub fn parse_servers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_disable_bus() {
        let config = BusConfig::from_lookup(|_| None).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.servers, vec!["localhost:4222"]);
        assert_eq!(config.price_topic, "prices");
        assert_eq!(config.news_topic, "news");
    }

    #[test]
    fn test_enable_flag_variants() {
        for flag in ["1", "true", "TRUE", "yes", " Yes "] {
            let config = BusConfig::from_lookup(lookup_from(&[(ENABLE_BUS_ENV, flag)])).unwrap();
            assert!(config.enabled, "{flag:?} should enable the bus");
        }
        for flag in ["0", "false", "no", "on", ""] {
            let config = BusConfig::from_lookup(lookup_from(&[(ENABLE_BUS_ENV, flag)])).unwrap();
            assert!(!config.enabled, "{flag:?} should not enable the bus");
        }
    }

    #[test]
    fn test_server_list_is_split_and_trimmed() {
        let config = BusConfig::from_lookup(lookup_from(&[(
            BOOTSTRAP_SERVERS_ENV,
            "bus-1:4222, bus-2:4222 ,,",
        )]))
        .unwrap();
        assert_eq!(config.servers, vec!["bus-1:4222", "bus-2:4222"]);
    }

    #[test]
    fn test_blank_server_list_is_rejected() {
        let result = BusConfig::from_lookup(lookup_from(&[(BOOTSTRAP_SERVERS_ENV, " , ")]));
        assert!(matches!(result, Err(NetError::Config { .. })));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let result = BusConfig::from_lookup(lookup_from(&[(CONNECT_TIMEOUT_ENV, "soon")]));
        assert!(matches!(
            result,
            Err(NetError::Config {
                key: CONNECT_TIMEOUT_ENV,
                ..
            })
        ));
    }

    #[test]
    fn test_topic_overrides() {
        let config = BusConfig::from_lookup(lookup_from(&[
            (PRICE_TOPIC_ENV, "ticks"),
            (NEWS_TOPIC_ENV, "headlines"),
            (CONNECT_TIMEOUT_ENV, "500"),
        ]))
        .unwrap();
        assert_eq!(config.price_topic, "ticks");
        assert_eq!(config.news_topic, "headlines");
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
    }
}
