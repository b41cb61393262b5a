//! # feed_engine
//!
//! Live event streaming engine for the synthetic market feed.
//!
//! Each price subscription is a lazy stream of event batches. Depending on
//! the configured [`StreamMode`] it is generated in-process from per-symbol
//! jittered schedules, relayed from the bus, or fails up front when a
//! required relay is unavailable. A sibling news feed emits random headline
//! batches.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use feed_engine::{FeedConfig, FeedService, PriceRequest, StreamMode};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = FeedConfig::default().with_mode(StreamMode::GenerateOnly);
//!     let service = FeedService::new(config);
//!     service.start();
//!
//!     let request = PriceRequest::default().with_symbols(["AAPL"]);
//!     let mut prices = service.prices(request);
//!     if let Some(Ok(batch)) = prices.next().await {
//!         println!("{batch:?}");
//!     }
//!
//!     service.shutdown().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod headlines;
pub mod news;
pub mod scheduler;
pub mod service;
pub mod snapshot;
pub mod state;
pub mod stream;
pub mod tasks;
pub mod tick;

#[cfg(test)]
mod test_bus;

pub use config::{FeedConfig, StreamMode};
pub use error::FeedError;
pub use generator::{PriceGenerator, Step};
pub use news::{NewsFeed, NewsRequest, NewsStream};
pub use service::FeedService;
pub use snapshot::SnapshotPolicy;
pub use stream::{PriceRequest, PriceStream, StreamEngine};
pub use tasks::BackgroundTasks;
