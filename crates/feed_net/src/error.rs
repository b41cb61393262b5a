//! Bus-layer error types.

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode an event to JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Failed to decode an event from JSON.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// The bootstrap server list contained no usable address.
    #[error("invalid bus address list: {0:?}")]
    InvalidAddress(String),

    /// A configuration value could not be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    Config {
        /// The configuration key.
        key: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// The in-memory bus has been shut down.
    #[error("bus closed")]
    Closed,
}
