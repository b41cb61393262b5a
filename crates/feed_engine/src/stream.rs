//! Price stream engine.
//!
//! Every subscription is a lazy stream driven by the subscriber's own task.
//! On first poll the engine picks how the stream is fed:
//!
//! - **direct**: a private [`PriceGenerator`] emits full snapshots of the
//!   requested symbols.
//! - **relay**: a bus consumer forwards every price event on the topic as a
//!   single-event batch, in bus order. The symbol filter does not apply.
//! - **failed**: relay was required but no consumer could be opened; the
//!   stream yields [`FeedError::BusUnavailable`] and ends.
//!
//! Dropping the stream cancels it. Any open consumer is dropped with it,
//! which releases the subscription.

use std::sync::Arc;
use std::time::Duration;

use feed_net::{BusBridge, BusConsumer, PriceEvent};
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{debug, info, warn};

use crate::config::{FeedConfig, StreamMode, interval_from_secs};
use crate::error::FeedError;
use crate::generator::PriceGenerator;
use crate::snapshot::SnapshotPolicy;
use crate::tasks::BackgroundTasks;

/// A lazily produced sequence of price batches.
pub type PriceStream = BoxStream<'static, Result<Vec<PriceEvent>, FeedError>>;

/// Parameters of one price subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    /// Symbols to generate; `None` or empty selects the default basket.
    pub symbols: Option<Vec<String>>,
    /// Base cadence in seconds.
    pub interval_seconds: f64,
}

impl Default for PriceRequest {
    fn default() -> Self {
        Self {
            symbols: None,
            interval_seconds: 1.0,
        }
    }
}

impl PriceRequest {
    /// Restrict the subscription to `symbols`.
    #[must_use]
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Override the base cadence.
    #[must_use]
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds;
        self
    }
}

enum Phase {
    Start(PriceRequest),
    Direct {
        generator: Box<PriceGenerator>,
        publish: bool,
    },
    Relay(BusConsumer<PriceEvent>),
    Done,
}

/// Builds price subscriptions according to the configured [`StreamMode`].
#[derive(Debug, Clone)]
pub struct StreamEngine {
    config: Arc<FeedConfig>,
    bridge: Arc<BusBridge>,
    tasks: BackgroundTasks,
}

impl StreamEngine {
    /// Create an engine sharing the service's bridge and task set.
    #[must_use]
    pub fn new(config: Arc<FeedConfig>, bridge: Arc<BusBridge>, tasks: BackgroundTasks) -> Self {
        Self {
            config,
            bridge,
            tasks,
        }
    }

    /// The configured stream mode.
    #[must_use]
    pub fn mode(&self) -> StreamMode {
        self.config.mode
    }

    /// Start a price subscription.
    ///
    /// Nothing happens until the stream is first polled. An invalid interval
    /// is reported as the stream's only item.
    pub fn prices(&self, request: PriceRequest) -> PriceStream {
        let engine = self.clone();
        futures::stream::unfold(
            (engine, Phase::Start(request)),
            |(engine, mut phase)| async move {
                loop {
                    match phase {
                        Phase::Start(request) => match engine.open(request).await {
                            Ok(next) => phase = next,
                            Err(e) => {
                                warn!(%e, "price subscription failed");
                                return Some((Err(e), (engine, Phase::Done)));
                            }
                        },
                        Phase::Direct {
                            mut generator,
                            publish,
                        } => {
                            let batch = generator.next_batch().await;
                            if publish {
                                engine.publish_detached(&batch);
                            }
                            return Some((Ok(batch), (engine, Phase::Direct { generator, publish })));
                        }
                        Phase::Relay(mut consumer) => match consumer.next().await {
                            Some(event) => {
                                return Some((Ok(vec![event]), (engine, Phase::Relay(consumer))));
                            }
                            None => {
                                info!(topic = consumer.topic(), "relay ended");
                                consumer.close();
                                return None;
                            }
                        },
                        Phase::Done => return None,
                    }
                }
            },
        )
        .boxed()
    }

    async fn open(&self, request: PriceRequest) -> Result<Phase, FeedError> {
        let interval = interval_from_secs(request.interval_seconds)?;
        let topic = &self.config.bus.price_topic;

        match self.config.mode {
            StreamMode::GenerateOnly => {
                let publish = self.config.publish_generated && self.bridge.is_enabled();
                Ok(self.direct(request.symbols.as_deref(), interval, publish))
            }
            StreamMode::PreferRelay => match self.relay().await {
                Some(consumer) => Ok(Phase::Relay(consumer)),
                None => {
                    info!(topic = %topic, "relay unavailable, generating in-process");
                    Ok(self.direct(request.symbols.as_deref(), interval, false))
                }
            },
            StreamMode::RelayRequired => match self.relay().await {
                Some(consumer) => Ok(Phase::Relay(consumer)),
                None => Err(FeedError::BusUnavailable {
                    topic: topic.clone(),
                }),
            },
        }
    }

    fn direct(&self, requested: Option<&[String]>, interval: Duration, publish: bool) -> Phase {
        let symbols = self.config.resolve_symbols(requested);
        info!(
            mode = %self.config.mode,
            symbols = ?symbols,
            interval = interval.as_secs_f64(),
            publish,
            "direct price stream started"
        );
        let generator = PriceGenerator::new(
            &symbols,
            interval,
            self.config.wait_ceiling,
            self.config.seed,
            SnapshotPolicy::Full,
        );
        Phase::Direct {
            generator: Box::new(generator),
            publish,
        }
    }

    async fn relay(&self) -> Option<BusConsumer<PriceEvent>> {
        let consumer = self
            .bridge
            .open_consumer(&self.config.bus.price_topic, self.config.relay_group.as_deref())
            .await?;
        info!(mode = %self.config.mode, topic = consumer.topic(), "relay price stream started");
        Some(consumer)
    }

    fn publish_detached(&self, batch: &[PriceEvent]) {
        let bridge = self.bridge.clone();
        let topic = self.config.bus.price_topic.clone();
        let events = batch.to_vec();
        debug!(topic = %topic, events = events.len(), "publishing generated batch");
        self.tasks
            .spawn_with_timeout(self.config.publish_timeout, async move {
                bridge.publish(&topic, &events).await;
            });
    }
}
