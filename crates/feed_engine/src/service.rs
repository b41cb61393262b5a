//! Feed service: the process-level owner of shared feed resources.
//!
//! The service holds the bus bridge, the detached-task set and the optional
//! background publisher that keeps the price topic populated for relay
//! subscribers. Create one per process, call [`FeedService::start`] after
//! construction and [`FeedService::shutdown`] before exit.

use std::sync::Arc;

use feed_net::BusBridge;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::generator::PriceGenerator;
use crate::news::{NewsFeed, NewsRequest, NewsStream};
use crate::snapshot::SnapshotPolicy;
use crate::stream::{PriceRequest, PriceStream, StreamEngine};
use crate::tasks::BackgroundTasks;

#[derive(Debug)]
struct Publisher {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// The feed service.
#[derive(Debug)]
pub struct FeedService {
    /// Unique instance identifier for this process.
    instance_id: String,
    config: Arc<FeedConfig>,
    bridge: Arc<BusBridge>,
    tasks: BackgroundTasks,
    engine: StreamEngine,
    news: NewsFeed,
    publisher: Mutex<Option<Publisher>>,
}

impl FeedService {
    /// Create a service talking to the NATS servers named in `config`.
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        let bridge = BusBridge::from_config(&config.bus);
        Self::with_bridge(config, bridge)
    }

    /// Create a service over an already built bridge.
    #[must_use]
    pub fn with_bridge(config: FeedConfig, bridge: BusBridge) -> Self {
        let config = Arc::new(config);
        let bridge = Arc::new(bridge);
        let tasks = BackgroundTasks::new();
        Self {
            instance_id: Uuid::new_v4().to_string(),
            engine: StreamEngine::new(config.clone(), bridge.clone(), tasks.clone()),
            news: NewsFeed::new(config.clone(), bridge.clone(), tasks.clone()),
            config,
            bridge,
            tasks,
            publisher: Mutex::new(None),
        }
    }

    /// Returns the unique instance ID for this service.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Health probe.
    #[must_use]
    pub fn ping(&self) -> &'static str {
        "pong"
    }

    /// Start a price subscription.
    pub fn prices(&self, request: PriceRequest) -> PriceStream {
        self.engine.prices(request)
    }

    /// Start a news subscription.
    pub fn news(&self, request: NewsRequest) -> NewsStream {
        self.news.subscribe(request)
    }

    /// Returns `true` while the background publisher is running.
    #[must_use]
    pub fn is_publishing(&self) -> bool {
        self.publisher
            .lock()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Start background work. Must be called within a Tokio runtime.
    ///
    /// Spawns the background publisher when the bus is enabled and the
    /// publisher is configured on. Calling this twice has no further effect.
    pub fn start(&self) {
        info!(
            instance_id = %self.instance_id,
            mode = %self.config.mode,
            bus = self.bridge.is_enabled(),
            "feed service starting"
        );
        if !self.bridge.is_enabled() || !self.config.background_publisher {
            return;
        }

        let mut publisher = self.publisher.lock();
        if publisher.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_publisher(
            self.config.clone(),
            self.bridge.clone(),
            cancel.clone(),
        ));
        *publisher = Some(Publisher { handle, cancel });
    }

    /// Stop the background publisher and drain detached publishes.
    ///
    /// Publishes still running after the configured drain timeout are
    /// aborted.
    pub async fn shutdown(&self) {
        let publisher = self.publisher.lock().take();
        if let Some(Publisher { mut handle, cancel }) = publisher {
            cancel.cancel();
            match tokio::time::timeout(self.config.drain_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(%e, "background publisher did not stop cleanly"),
                Err(_) => {
                    warn!("background publisher did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        let abandoned = self.tasks.drain(self.config.drain_timeout).await;
        info!(instance_id = %self.instance_id, abandoned, "feed service stopped");
    }
}

/// Generate delta batches for the default basket and publish each one to
/// the price topic until cancelled.
async fn run_publisher(config: Arc<FeedConfig>, bridge: Arc<BusBridge>, cancel: CancellationToken) {
    let topic = config.bus.price_topic.clone();
    let mut generator = PriceGenerator::new(
        &config.default_symbols,
        config.publisher_interval,
        config.wait_ceiling,
        config.seed,
        SnapshotPolicy::Delta,
    );
    info!(topic = %topic, "background publisher started");

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            batch = generator.next_batch() => {
                // Stay cancellable while a publish is in flight.
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = bridge.publish(&topic, &batch) => {}
                }
            }
        }
    }
    info!(topic = %topic, "background publisher stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use feed_net::{BusConfig, BusTransport, MemoryBus, PriceEvent};
    use futures::StreamExt;

    use super::*;
    use crate::test_bus::StalledBus;

    fn service(bus: &MemoryBus, config: FeedConfig) -> FeedService {
        let bus_config = BusConfig::default().with_enabled(true);
        let bridge = BusBridge::new(&bus_config, Arc::new(bus.clone()));
        FeedService::with_bridge(config.with_bus(bus_config), bridge)
    }

    #[test]
    fn test_ping() {
        let service = FeedService::with_bridge(FeedConfig::default(), BusBridge::disabled());
        assert_eq!(service.ping(), "pong");
        assert!(!service.instance_id().is_empty());
    }

    #[tokio::test]
    async fn test_start_without_bus_spawns_nothing() {
        let service = FeedService::with_bridge(FeedConfig::default(), BusBridge::disabled());
        service.start();
        assert!(!service.is_publishing());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_publisher_can_be_switched_off() {
        let bus = MemoryBus::new();
        let service = service(&bus, FeedConfig::default().with_background_publisher(false));
        service.start();
        assert!(!service.is_publishing());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_publisher_feeds_topic_until_shutdown() {
        let bus = MemoryBus::new();
        let mut watcher = bus.subscribe("prices", None).await.unwrap();
        let service = service(
            &bus,
            FeedConfig::default().with_publisher_interval(Duration::from_millis(20)),
        );

        service.start();
        service.start();
        assert!(service.is_publishing());

        let payload = tokio::time::timeout(Duration::from_secs(2), watcher.next())
            .await
            .unwrap()
            .unwrap();
        let event: PriceEvent = feed_net::decode(&payload).unwrap();
        assert!(service.config().default_symbols.contains(&event.symbol));
        assert!(event.price > 0.0);

        service.shutdown().await;
        assert!(!service.is_publishing());
    }

    #[tokio::test]
    async fn test_relay_subscriber_sees_published_prices() {
        let bus = MemoryBus::new();
        let service = service(
            &bus,
            FeedConfig::default().with_publisher_interval(Duration::from_millis(20)),
        );
        service.start();

        let mut stream = service.prices(PriceRequest::default());
        let batch = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(batch.len(), 1);

        drop(stream);
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_publisher_stuck_in_publish() {
        let bus_config = BusConfig::default().with_enabled(true);
        let config = FeedConfig::default()
            .with_bus(bus_config.clone())
            .with_publisher_interval(Duration::from_millis(10));
        let service = FeedService::with_bridge(
            config,
            BusBridge::new(&bus_config, Arc::new(StalledBus)),
        );

        service.start();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(service.is_publishing());

        tokio::time::timeout(Duration::from_secs(1), service.shutdown())
            .await
            .unwrap();
        assert!(!service.is_publishing());
    }
}
