//! News feed.
//!
//! Emits random batches of headlines on a jittered cadence. The first batch
//! is emitted immediately; every later batch follows a sleep drawn uniformly
//! between a low and high bound derived from the requested interval.

use std::sync::Arc;
use std::time::Duration;

use feed_net::{BusBridge, NewsItem};
use futures::StreamExt;
use futures::stream::BoxStream;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::{FeedConfig, interval_from_secs};
use crate::error::FeedError;
use crate::headlines::{HEADLINES, Headline};
use crate::snapshot::utc_timestamp;
use crate::tasks::BackgroundTasks;

/// Stretch applied to the requested cadence.
pub const SLOW_FACTOR: f64 = 1.3;

/// Shortest sleep between batches, in seconds.
pub const MIN_SLEEP_SECS: f64 = 0.05;

/// A lazily produced sequence of news batches.
pub type NewsStream = BoxStream<'static, Result<Vec<NewsItem>, FeedError>>;

/// Parameters of one news subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsRequest {
    /// Base cadence in seconds.
    pub interval_seconds: f64,
    /// Items per batch (capped at the pool size).
    pub batch_size: usize,
}

impl Default for NewsRequest {
    fn default() -> Self {
        Self {
            interval_seconds: 1.0,
            batch_size: 1,
        }
    }
}

impl NewsRequest {
    /// Override the base cadence.
    #[must_use]
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// Override the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Bounds of the sleep between batches for a base interval in seconds.
#[must_use]
pub fn sleep_bounds(interval_seconds: f64) -> (f64, f64) {
    let low = (interval_seconds * 0.5 * SLOW_FACTOR).max(MIN_SLEEP_SECS);
    let high = (interval_seconds * 1.5 * SLOW_FACTOR).max(low + 0.01);
    (low, high)
}

/// Build the news item for the headline at `index`.
fn news_item(index: usize, headline: &Headline) -> NewsItem {
    NewsItem {
        id: index as i64 + 1,
        title: headline.title.to_string(),
        summary: headline.summary.to_string(),
        source: headline.source.to_string(),
        timestamp: utc_timestamp(),
    }
}

/// Draw `batch_size` distinct headlines.
fn sample_batch<R: Rng + ?Sized>(rng: &mut R, batch_size: usize) -> Vec<NewsItem> {
    let indices: Vec<usize> = (0..HEADLINES.len()).collect();
    indices
        .choose_multiple(rng, batch_size.min(HEADLINES.len()))
        .map(|&i| news_item(i, &HEADLINES[i]))
        .collect()
}

struct NewsState {
    rng: StdRng,
    low: f64,
    high: f64,
    batch_size: usize,
    first: bool,
}

/// Produces news subscriptions.
#[derive(Debug, Clone)]
pub struct NewsFeed {
    config: Arc<FeedConfig>,
    bridge: Arc<BusBridge>,
    tasks: BackgroundTasks,
}

impl NewsFeed {
    /// Create a news feed sharing the service's bridge and task set.
    #[must_use]
    pub fn new(config: Arc<FeedConfig>, bridge: Arc<BusBridge>, tasks: BackgroundTasks) -> Self {
        Self {
            config,
            bridge,
            tasks,
        }
    }

    /// Start a news subscription.
    ///
    /// An invalid interval or a zero batch size is reported as the stream's
    /// only item. When the bus is enabled each batch is also published to the
    /// news topic in the background.
    pub fn subscribe(&self, request: NewsRequest) -> NewsStream {
        if let Err(e) = interval_from_secs(request.interval_seconds) {
            return futures::stream::once(async move { Err(e) }).boxed();
        }
        if request.batch_size == 0 {
            return futures::stream::once(async { Err(FeedError::InvalidBatchSize(0)) }).boxed();
        }

        let (low, high) = sleep_bounds(request.interval_seconds);
        info!(
            interval = request.interval_seconds,
            batch_size = request.batch_size,
            "news subscription started"
        );

        let state = NewsState {
            rng: StdRng::seed_from_u64(self.config.seed),
            low,
            high,
            batch_size: request.batch_size,
            first: true,
        };
        let feed = self.clone();
        futures::stream::unfold(state, move |mut state| {
            let feed = feed.clone();
            async move {
                if !state.first {
                    let secs = state.rng.gen_range(state.low..=state.high);
                    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                }
                state.first = false;

                let batch = sample_batch(&mut state.rng, state.batch_size);
                feed.publish_detached(&batch);
                Some((Ok(batch), state))
            }
        })
        .boxed()
    }

    fn publish_detached(&self, batch: &[NewsItem]) {
        if !self.bridge.is_enabled() {
            return;
        }
        let bridge = self.bridge.clone();
        let topic = self.config.bus.news_topic.clone();
        let items = batch.to_vec();
        self.tasks
            .spawn_with_timeout(self.config.publish_timeout, async move {
                bridge.publish(&topic, &items).await;
            });
    }
}
