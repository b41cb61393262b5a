//! Engine error types.

use feed_net::NetError;

/// Errors surfaced by the streaming engine.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The stream requires a bus relay but no consumer could be opened.
    #[error("bus unavailable: cannot relay from topic {topic:?}")]
    BusUnavailable {
        /// The topic the relay was meant to consume.
        topic: String,
    },

    /// The base interval is not a positive, finite number of seconds.
    #[error("invalid interval: {0} seconds")]
    InvalidInterval(f64),

    /// A news batch must contain at least one item.
    #[error("invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// A configuration value could not be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    Config {
        /// The configuration key.
        key: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// Bus-layer failure.
    #[error(transparent)]
    Net(#[from] NetError),
}
