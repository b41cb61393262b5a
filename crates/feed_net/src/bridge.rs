//! Bus bridge.
//!
//! The bridge is the only owner of the bus connection. It connects lazily on
//! first use, exactly once per process: concurrent first callers wait on the
//! same initialisation and the outcome (connected or unavailable) is cached.
//!
//! Nothing here ever surfaces a bus problem as an error to the caller.
//! Publishing while the bus is disabled or unreachable is a no-op, and
//! [`BusBridge::open_consumer`] reports the same conditions as `None`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::BusConfig;
use crate::connection::NatsConnector;
use crate::transport::{BusConnector, BusTransport, MessageStream};

/// Shared access point to the bus for publishing and relaying events.
pub struct BusBridge {
    enabled: bool,
    connector: Arc<dyn BusConnector>,
    connection: OnceCell<Option<Arc<dyn BusTransport>>>,
}

impl fmt::Debug for BusBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusBridge")
            .field("enabled", &self.enabled)
            .field("connected", &self.connection.get().map(Option::is_some))
            .finish_non_exhaustive()
    }
}

impl BusBridge {
    /// Create a bridge that will connect through `connector` when first used.
    #[must_use]
    pub fn new(config: &BusConfig, connector: Arc<dyn BusConnector>) -> Self {
        Self {
            enabled: config.enabled,
            connector,
            connection: OnceCell::new(),
        }
    }

    /// Create a bridge backed by NATS.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        Self::new(config, Arc::new(NatsConnector::new(config)))
    }

    /// Create a bridge on which every operation is a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self::from_config(&BusConfig::default().with_enabled(false))
    }

    /// Whether bus usage is enabled by configuration.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the shared connection, connecting on first call.
    async fn connection(&self) -> Option<Arc<dyn BusTransport>> {
        if !self.enabled {
            return None;
        }
        self.connection
            .get_or_init(|| async {
                match self.connector.connect().await {
                    Ok(conn) => {
                        info!("bus connection ready");
                        Some(conn)
                    }
                    Err(e) => {
                        warn!(%e, "bus connection failed, bus operations disabled");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Publish each event to `topic`, in order.
    ///
    /// Failures are logged and swallowed; a failed send abandons the rest of
    /// the batch.
    pub async fn publish<T: Serialize>(&self, topic: &str, events: &[T]) {
        let Some(conn) = self.connection().await else {
            debug!(topic, "bus unavailable, publish skipped");
            return;
        };
        for event in events {
            let payload = match codec::encode(event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(topic, %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = conn.publish(topic, payload).await {
                warn!(topic, %e, "bus publish failed");
                return;
            }
        }
    }

    /// Start a consumer on `topic` that only sees events published from now on.
    ///
    /// Returns `None` when the bus is disabled, unreachable, or refuses the
    /// subscription.
    pub async fn open_consumer<T: DeserializeOwned>(
        &self,
        topic: &str,
        group: Option<&str>,
    ) -> Option<BusConsumer<T>> {
        let conn = self.connection().await?;
        match conn.subscribe(topic, group).await {
            Ok(messages) => {
                info!(topic, group = ?group, "bus consumer opened");
                Some(BusConsumer {
                    topic: topic.to_string(),
                    messages,
                    _event: PhantomData,
                })
            }
            Err(e) => {
                warn!(topic, %e, "failed to open bus consumer");
                None
            }
        }
    }
}

/// A live subscription decoding messages into `T`.
///
/// Dropping the consumer releases the subscription, so every exit path of a
/// relay loop (including cancellation) closes it.
pub struct BusConsumer<T> {
    topic: String,
    messages: MessageStream,
    _event: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for BusConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusConsumer")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> BusConsumer<T> {
    /// Wait for the next message that decodes as `T`.
    ///
    /// Undecodable messages are skipped. Returns `None` once the subscription
    /// has ended.
    pub async fn next(&mut self) -> Option<T> {
        while let Some(payload) = self.messages.next().await {
            match codec::decode(&payload) {
                Ok(event) => return Some(event),
                Err(e) => debug!(topic = %self.topic, %e, "skipping undecodable message"),
            }
        }
        None
    }
}

impl<T> BusConsumer<T> {
    /// The topic this consumer is subscribed to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Release the subscription.
    pub fn close(self) {
        drop(self);
    }
}

impl<T> Drop for BusConsumer<T> {
    fn drop(&mut self) {
        debug!(topic = %self.topic, "bus consumer closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::NetError;
    use crate::memory::MemoryBus;
    use crate::messages::PriceEvent;

    /// Connector that always fails and counts its attempts.
    #[derive(Default)]
    struct Unreachable {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl BusConnector for Unreachable {
        async fn connect(&self) -> Result<Arc<dyn BusTransport>, NetError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NetError::InvalidAddress("unreachable:0".to_string()))
        }
    }

    fn enabled() -> BusConfig {
        BusConfig::default().with_enabled(true)
    }

    fn event(symbol: &str, price: f64) -> PriceEvent {
        PriceEvent {
            symbol: symbol.to_string(),
            price,
            change_percent: 0.0,
            timestamp: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_disabled_bridge_is_noop() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&BusConfig::default(), Arc::new(bus.clone()));
        let mut watcher = bus.subscribe("prices", None).await.unwrap();

        bridge.publish("prices", &[event("AAPL", 1.0)]).await;
        assert!(bridge.open_consumer::<PriceEvent>("prices", None).await.is_none());

        bus.publish("prices", b"sentinel".to_vec()).await.unwrap();
        assert_eq!(watcher.next().await.unwrap(), b"sentinel");
    }

    #[tokio::test]
    async fn test_connection_attempted_once() {
        let connector = Arc::new(Unreachable::default());
        let bridge = BusBridge::new(&enabled(), connector.clone());

        bridge.publish("prices", &[event("AAPL", 1.0)]).await;
        bridge.publish("prices", &[event("MSFT", 2.0)]).await;
        assert!(bridge.open_consumer::<PriceEvent>("prices", None).await.is_none());

        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_connects_once() {
        let connector = Arc::new(Unreachable::default());
        let bridge = Arc::new(BusBridge::new(&enabled(), connector.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let bridge = bridge.clone();
            handles.push(tokio::spawn(async move {
                bridge.publish("prices", &[event("AAPL", 1.0)]).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_then_consume_roundtrip() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&enabled(), Arc::new(bus));

        let mut consumer = bridge
            .open_consumer::<PriceEvent>("prices", None)
            .await
            .unwrap();
        bridge
            .publish("prices", &[event("AAPL", 101.5), event("MSFT", 302.25)])
            .await;

        assert_eq!(consumer.next().await.unwrap(), event("AAPL", 101.5));
        assert_eq!(consumer.next().await.unwrap(), event("MSFT", 302.25));
    }

    #[tokio::test]
    async fn test_consumer_skips_undecodable_messages() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&enabled(), Arc::new(bus.clone()));
        let mut consumer = bridge
            .open_consumer::<PriceEvent>("prices", None)
            .await
            .unwrap();

        bus.publish("prices", b"not json".to_vec()).await.unwrap();
        bus.publish("prices", br#"{"price":"NaN-ish"}"#.to_vec())
            .await
            .unwrap();
        bridge.publish("prices", &[event("GOOGL", 140.0)]).await;

        assert_eq!(consumer.next().await.unwrap().symbol, "GOOGL");
    }

    #[tokio::test]
    async fn test_consumer_ends_when_bus_closes() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&enabled(), Arc::new(bus.clone()));
        let mut consumer = bridge
            .open_consumer::<PriceEvent>("prices", None)
            .await
            .unwrap();

        bus.close();
        assert!(consumer.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_releases_subscription() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&enabled(), Arc::new(bus.clone()));
        let consumer = bridge
            .open_consumer::<PriceEvent>("prices", None)
            .await
            .unwrap();
        assert_eq!(bus.subscriber_count("prices"), 1);

        consumer.close();
        assert_eq!(bus.subscriber_count("prices"), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let bus = MemoryBus::new();
        let bridge = BusBridge::new(&enabled(), Arc::new(bus.clone()));
        bridge.publish("prices", &[event("AAPL", 1.0)]).await;

        bus.close();
        bridge.publish("prices", &[event("AAPL", 2.0)]).await;
    }
}
