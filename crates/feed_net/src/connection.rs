//! NATS connection management.
//!
//! Provides a thin wrapper around `async-nats` implementing the bus transport
//! traits with feed-specific defaults.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::info;

use crate::config::BusConfig;
use crate::error::NetError;
use crate::topics;
use crate::transport::{BusConnector, BusTransport, MessageStream};

/// A wrapper around an `async-nats` client.
///
/// The client is internally reference counted and safe to use from many
/// tasks at once.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    /// The underlying NATS client.
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to any of the given `host:port` servers.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidAddress`] if an entry cannot be parsed and
    /// [`NetError::Connect`] if no server accepts the connection in time.
    pub async fn connect_to(servers: &[String], timeout: Duration) -> Result<Self, NetError> {
        if servers.is_empty() {
            return Err(NetError::InvalidAddress(String::new()));
        }
        for server in servers {
            server
                .parse::<async_nats::ServerAddr>()
                .map_err(|_| NetError::InvalidAddress(server.clone()))?;
        }

        info!(servers = ?servers, "connecting to NATS");
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(servers.to_vec())
            .await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Returns a reference to the underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl BusTransport for NatsConnection {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), NetError> {
        self.client
            .publish(topic.to_string(), payload.into())
            .await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        group: Option<&str>,
    ) -> Result<MessageStream, NetError> {
        let subscriber = match group {
            Some(group) => {
                self.client
                    .queue_subscribe(topic.to_string(), topics::queue_group(group))
                    .await?
            }
            None => self.client.subscribe(topic.to_string()).await?,
        };
        Ok(subscriber.map(|msg| msg.payload.to_vec()).boxed())
    }
}

/// Connects to NATS using the servers in a [`BusConfig`].
#[derive(Debug, Clone)]
pub struct NatsConnector {
    servers: Vec<String>,
    timeout: Duration,
}

impl NatsConnector {
    /// Create a connector from the bus configuration.
    #[must_use]
    pub fn new(config: &BusConfig) -> Self {
        Self {
            servers: config.servers.clone(),
            timeout: config.connect_timeout,
        }
    }

    /// The servers this connector will try.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

#[async_trait]
impl BusConnector for NatsConnector {
    async fn connect(&self) -> Result<Arc<dyn BusTransport>, NetError> {
        let conn = NatsConnection::connect_to(&self.servers, self.timeout).await?;
        Ok(Arc::new(conn))
    }
}
