//! In-process bus.
//!
//! Each topic is a `tokio::sync::broadcast` channel. A subscriber only sees
//! messages sent after it subscribed, matching core NATS delivery. Consumer
//! groups are not load balanced here: every subscriber receives every message.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::NetError;
use crate::transport::{BusConnector, BusTransport, MessageStream};

/// Default per-topic buffer. Slow subscribers skip what they missed.
const DEFAULT_CAPACITY: usize = 1024;

/// A cloneable in-memory bus. Clones share the same topics.
#[derive(Debug, Clone)]
pub struct MemoryBus {
    topics: Arc<DashMap<String, broadcast::Sender<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
    capacity: usize,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty bus with a custom per-topic buffer size.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Number of live subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Shut the bus down. Open subscriptions end and every later operation
    /// fails with [`NetError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.topics.clear();
    }

    fn ensure_open(&self) -> Result<(), NetError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(NetError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BusTransport for MemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError> {
        self.ensure_open()?;
        // No subscribers means nobody is listening; the message is dropped.
        if self.sender(topic).send(payload).is_err() {
            debug!(topic, "no subscribers, message dropped");
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        _group: Option<&str>,
    ) -> Result<MessageStream, NetError> {
        self.ensure_open()?;
        let receiver = self.sender(topic).subscribe();
        let topic = topic.to_string();
        let stream = futures::stream::unfold(receiver, move |mut receiver| {
            let topic = topic.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(topic = %topic, skipped, "subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}

#[async_trait]
impl BusConnector for MemoryBus {
    async fn connect(&self) -> Result<Arc<dyn BusTransport>, NetError> {
        self.ensure_open()?;
        Ok(Arc::new(self.clone()))
    }
}
