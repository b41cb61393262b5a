//! # feed_net
//!
//! Bus transport layer for the synthetic market feed.
//!
//! This crate provides:
//!
//! - [`bridge`]: Bus bridge with a lazy shared connection and relay consumers.
//! - [`messages`]: Event types carried on the bus (the wire contract).
//! - [`codec`]: JSON serialisation/deserialisation helpers.
//! - [`config`]: Bus configuration read once at process start.
//! - [`connection`]: NATS connection management.
//! - [`memory`]: In-process bus for single-process runs and tests.
//! - [`topics`]: Topic names and consumer group naming.
//! - [`transport`]: Traits separating the bridge from a concrete bus client.
//! - [`error`]: Bus-layer error types.

pub mod bridge;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod memory;
pub mod messages;
pub mod topics;
pub mod transport;

pub use bridge::{BusBridge, BusConsumer};
pub use codec::{decode, encode};
pub use config::BusConfig;
pub use connection::{NatsConnection, NatsConnector};
pub use error::NetError;
pub use memory::MemoryBus;
pub use messages::{NewsItem, PriceEvent};
pub use transport::{BusConnector, BusTransport, MessageStream};
