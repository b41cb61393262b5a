//! Bus transports for exercising failure paths in tests.

use std::sync::Arc;

use async_trait::async_trait;
use feed_net::{BusConnector, BusTransport, MessageStream, NetError};
use futures::StreamExt;

/// A reachable bus on which every publish hangs forever.
#[derive(Debug, Clone, Default)]
pub(crate) struct StalledBus;

#[async_trait]
impl BusTransport for StalledBus {
    async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), NetError> {
        std::future::pending().await
    }

    async fn subscribe(
        &self,
        _topic: &str,
        _group: Option<&str>,
    ) -> Result<MessageStream, NetError> {
        Ok(futures::stream::pending().boxed())
    }
}

#[async_trait]
impl BusConnector for StalledBus {
    async fn connect(&self) -> Result<Arc<dyn BusTransport>, NetError> {
        Ok(Arc::new(self.clone()))
    }
}
