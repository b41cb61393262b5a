//! Transport seam between the bus bridge and a concrete bus client.
//!
//! The bridge only ever talks to a [`BusConnector`] (to obtain the shared
//! connection) and to the [`BusTransport`] it returns. NATS and the in-memory
//! bus both implement these traits.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::NetError;

/// A stream of raw message payloads from one subscription. Dropping the
/// stream releases the subscription.
pub type MessageStream = BoxStream<'static, Vec<u8>>;

/// A live, shareable bus connection.
///
/// Implementations must tolerate concurrent `publish` calls from many tasks.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Send one payload to `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError>;

    /// Start a subscription that only observes messages published after it
    /// was created. `group` selects a load-balanced consumer group.
    async fn subscribe(&self, topic: &str, group: Option<&str>)
    -> Result<MessageStream, NetError>;
}

/// Establishes the shared bus connection on first use.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Open a connection.
    async fn connect(&self) -> Result<Arc<dyn BusTransport>, NetError>;
}
