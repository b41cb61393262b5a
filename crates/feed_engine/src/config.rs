//! Feed configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use feed_net::BusConfig;

use crate::error::FeedError;

/// Symbols tracked when a subscription does not name any.
pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];

/// Seed for initial prices and every later random draw of a run.
pub const DEFAULT_SEED: u64 = 42;

/// Longest the generator sleeps before re-checking its schedule.
pub const DEFAULT_WAIT_CEILING: Duration = Duration::from_millis(250);

/// Environment variable selecting the [`StreamMode`].
pub const STREAM_MODE_ENV: &str = "FEED_STREAM_MODE";
/// Environment variable overriding the random seed.
pub const SEED_ENV: &str = "FEED_SEED";
/// Environment variable naming the relay consumer group.
pub const RELAY_GROUP_ENV: &str = "FEED_RELAY_GROUP";

/// How a price stream obtains its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Always generate in-process. Batches may additionally be published.
    GenerateOnly,
    /// Relay from the bus when a consumer can be opened, otherwise generate.
    #[default]
    PreferRelay,
    /// Relay from the bus or fail with [`FeedError::BusUnavailable`].
    RelayRequired,
}

impl FromStr for StreamMode {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" | "generate-only" => Ok(Self::GenerateOnly),
            "prefer-relay" | "relay-fallback" => Ok(Self::PreferRelay),
            "relay-required" | "relay" => Ok(Self::RelayRequired),
            _ => Err(FeedError::Config {
                key: STREAM_MODE_ENV,
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GenerateOnly => "generate",
            Self::PreferRelay => "prefer-relay",
            Self::RelayRequired => "relay-required",
        };
        f.write_str(name)
    }
}

/// Process-wide configuration, built once at startup and handed to every
/// component that needs it.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Bus settings.
    pub bus: BusConfig,
    /// How price subscriptions obtain their events.
    pub mode: StreamMode,
    /// Symbols used when a subscription names none.
    pub default_symbols: Vec<String>,
    /// Seed for each generator run.
    pub seed: u64,
    /// Upper bound on a single scheduler sleep.
    pub wait_ceiling: Duration,
    /// Publish generated batches to the bus (when the bus is enabled).
    pub publish_generated: bool,
    /// Run the background publisher that populates the price topic.
    pub background_publisher: bool,
    /// Base interval of the background publisher.
    pub publisher_interval: Duration,
    /// Consumer group for relay subscriptions; `None` means every relay
    /// subscriber sees every message.
    pub relay_group: Option<String>,
    /// How long shutdown waits for in-flight publishes.
    pub drain_timeout: Duration,
    /// Longest a detached publish may run before it is abandoned.
    pub publish_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            mode: StreamMode::default(),
            default_symbols: DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect(),
            seed: DEFAULT_SEED,
            wait_ceiling: DEFAULT_WAIT_CEILING,
            publish_generated: true,
            background_publisher: true,
            publisher_interval: Duration::from_secs(1),
            relay_group: None,
            drain_timeout: Duration::from_secs(2),
            publish_timeout: Duration::from_secs(5),
        }
    }
}

impl FeedConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, FeedError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if a key is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            bus: BusConfig::from_lookup(&lookup)?,
            ..Self::default()
        };

        if let Some(mode) = lookup(STREAM_MODE_ENV) {
            config.mode = mode.parse()?;
        }
        if let Some(raw) = lookup(SEED_ENV) {
            config.seed = raw.trim().parse().map_err(|_| FeedError::Config {
                key: SEED_ENV,
                value: raw.clone(),
            })?;
        }
        config.relay_group = lookup(RELAY_GROUP_ENV)
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(config)
    }

    /// Override the bus settings.
    #[must_use]
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }

    /// Override the stream mode.
    #[must_use]
    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the scheduler wait ceiling.
    #[must_use]
    pub fn with_wait_ceiling(mut self, ceiling: Duration) -> Self {
        self.wait_ceiling = ceiling;
        self
    }

    /// Enable or disable the background publisher.
    #[must_use]
    pub fn with_background_publisher(mut self, enabled: bool) -> Self {
        self.background_publisher = enabled;
        self
    }

    /// Override the background publisher interval.
    #[must_use]
    pub fn with_publisher_interval(mut self, interval: Duration) -> Self {
        self.publisher_interval = interval;
        self
    }

    /// Override the detached publish timeout.
    #[must_use]
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Override how long shutdown waits for background work.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Resolve the symbols for a subscription, falling back to the defaults
    /// when the request is absent or names nothing usable.
    #[must_use]
    pub fn resolve_symbols(&self, requested: Option<&[String]>) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in requested.unwrap_or_default() {
            let symbol = symbol.trim();
            if !symbol.is_empty() && !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
        if symbols.is_empty() {
            self.default_symbols.clone()
        } else {
            symbols
        }
    }
}

/// Longest accepted base interval (one day).
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// Convert a base interval in seconds into a [`Duration`].
///
/// # Errors
///
/// Returns [`FeedError::InvalidInterval`] unless `seconds` is finite, greater
/// than zero and at most [`MAX_INTERVAL_SECS`].
pub fn interval_from_secs(seconds: f64) -> Result<Duration, FeedError> {
    if seconds.is_finite() && seconds > 0.0 && seconds <= MAX_INTERVAL_SECS {
        Ok(Duration::from_secs_f64(seconds))
    } else {
        Err(FeedError::InvalidInterval(seconds))
    }
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
    fn test_defaults() {
        let config = FeedConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.mode, StreamMode::PreferRelay);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.default_symbols.len(), 5);
        assert!(!config.bus.enabled);
        assert!(config.relay_group.is_none());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("generate".parse::<StreamMode>().unwrap(), StreamMode::GenerateOnly);
        assert_eq!(
            "Prefer-Relay".parse::<StreamMode>().unwrap(),
            StreamMode::PreferRelay
        );
        assert_eq!(
            "relay-required".parse::<StreamMode>().unwrap(),
            StreamMode::RelayRequired
        );
        assert!("sometimes".parse::<StreamMode>().is_err());
    }

    #[test]
    fn test_mode_display_roundtrips() {
        for mode in [
            StreamMode::GenerateOnly,
            StreamMode::PreferRelay,
            StreamMode::RelayRequired,
        ] {
            assert_eq!(mode.to_string().parse::<StreamMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_env_overrides() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("ENABLE_BUS", "true"),
            (STREAM_MODE_ENV, "relay-required"),
            (SEED_ENV, "7"),
            (RELAY_GROUP_ENV, "ui"),
        ]))
        .unwrap();
        assert!(config.bus.enabled);
        assert_eq!(config.mode, StreamMode::RelayRequired);
        assert_eq!(config.seed, 7);
        assert_eq!(config.relay_group.as_deref(), Some("ui"));
    }

    #[test]
    fn test_bad_seed_is_rejected() {
        let result = FeedConfig::from_lookup(lookup_from(&[(SEED_ENV, "forty-two")]));
        assert!(matches!(result, Err(FeedError::Config { key: SEED_ENV, .. })));
    }

    #[test]
    fn test_bus_errors_propagate() {
        let result = FeedConfig::from_lookup(lookup_from(&[("BUS_CONNECT_TIMEOUT_MS", "x")]));
        assert!(matches!(result, Err(FeedError::Net(_))));
    }

    #[test]
    fn test_resolve_symbols_falls_back_to_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.resolve_symbols(None), config.default_symbols);
        assert_eq!(config.resolve_symbols(Some(&[])), config.default_symbols);
        assert_eq!(
            config.resolve_symbols(Some(&[" ".to_string()])),
            config.default_symbols
        );
    }

    #[test]
    fn test_resolve_symbols_keeps_order_and_dedups() {
        let config = FeedConfig::default();
        let requested = vec!["TSLA".to_string(), "AAPL".to_string(), "TSLA".to_string()];
        assert_eq!(config.resolve_symbols(Some(&requested)), vec!["TSLA", "AAPL"]);
    }

    #[test]
    fn test_interval_validation() {
        assert_eq!(interval_from_secs(0.05).unwrap(), Duration::from_millis(50));
        assert!(interval_from_secs(0.0).is_err());
        assert!(interval_from_secs(-1.0).is_err());
        assert!(interval_from_secs(f64::NAN).is_err());
        assert!(interval_from_secs(f64::INFINITY).is_err());
        assert!(interval_from_secs(MAX_INTERVAL_SECS + 1.0).is_err());
    }
}
