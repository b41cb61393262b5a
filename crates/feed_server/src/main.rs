use std::io::Write;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use feed_engine::{FeedConfig, FeedError, FeedService, NewsRequest, PriceRequest, StreamMode};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FeedKind {
    /// Price batches
    Prices,
    /// News batches
    News,
    /// Print the health probe answer and exit
    Ping,
}

#[derive(Debug, Parser)]
#[command(name = "feed-server", about = "Synthetic market feed streamed as JSON lines")]
struct Args {
    /// Which feed to stream
    #[arg(value_enum, default_value = "prices")]
    feed: FeedKind,

    /// Comma-separated symbols (prices only; defaults to the standard basket)
    #[arg(short, long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Base interval in seconds
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,

    /// Items per news batch
    #[arg(short, long, default_value_t = 1)]
    batch_size: usize,

    /// Stream mode: generate, prefer-relay or relay-required
    #[arg(short, long)]
    mode: Option<String>,

    /// Enable the bus regardless of ENABLE_BUS
    #[arg(long)]
    enable_bus: bool,

    /// Comma-separated NATS servers
    #[arg(long)]
    servers: Option<String>,

    /// Price topic
    #[arg(long)]
    price_topic: Option<String>,

    /// News topic
    #[arg(long)]
    news_topic: Option<String>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Do not run the background price publisher
    #[arg(long)]
    no_publisher: bool,

    /// Background publisher interval in seconds
    #[arg(long)]
    publisher_interval: Option<f64>,
}

impl Args {
    /// Layer command-line overrides over the environment configuration.
    fn apply(&self, mut config: FeedConfig) -> anyhow::Result<FeedConfig> {
        if self.enable_bus {
            config.bus = config.bus.with_enabled(true);
        }
        if let Some(servers) = &self.servers {
            config.bus = config.bus.with_servers(servers);
        }
        if let Some(topic) = &self.price_topic {
            config.bus = config.bus.with_price_topic(topic.as_str());
        }
        if let Some(topic) = &self.news_topic {
            config.bus = config.bus.with_news_topic(topic.as_str());
        }
        if let Some(mode) = &self.mode {
            config.mode = mode.parse::<StreamMode>()?;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(secs) = self.publisher_interval {
            config.publisher_interval = feed_engine::config::interval_from_secs(secs)?;
        }
        let publisher = config.background_publisher && !self.no_publisher;
        Ok(config.with_background_publisher(publisher))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = FeedConfig::from_env().context("reading configuration from environment")?;
    let config = args.apply(config)?;

    let service = FeedService::new(config);
    if args.feed == FeedKind::Ping {
        println!("{}", service.ping());
        return Ok(());
    }

    info!(
        instance_id = service.instance_id(),
        feed = ?args.feed,
        mode = %service.config().mode,
        servers = ?service.config().bus.servers,
        "feed server starting"
    );
    service.start();

    let result = match args.feed {
        FeedKind::News => {
            let request = NewsRequest::default()
                .with_interval(args.interval)
                .with_batch_size(args.batch_size);
            pump(service.news(request)).await
        }
        FeedKind::Prices | FeedKind::Ping => {
            let mut request = PriceRequest::default().with_interval(args.interval);
            if !args.symbols.is_empty() {
                request = request.with_symbols(args.symbols.iter().cloned());
            }
            pump(service.prices(request)).await
        }
    };

    service.shutdown().await;
    if let Err(e) = &result {
        error!(%e, "feed stopped with an error");
    }
    result
}

/// Write each batch as one JSON line until the stream ends or Ctrl-C.
async fn pump<T: Serialize>(
    mut stream: BoxStream<'static, Result<Vec<T>, FeedError>>,
) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut lines = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(lines, "interrupted, shutting down");
                return Ok(());
            }
            item = stream.next() => match item {
                Some(Ok(batch)) => {
                    let line = serde_json::to_string(&batch)?;
                    writeln!(stdout.lock(), "{line}")?;
                    lines += 1;
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    info!(lines, "stream ended");
                    return Ok(());
                }
            }
        }
    }
}
