//! Throughput driver for channelqueue.
//!
//! Pushes a stream of integers through one queue with a configurable number
//! of producer and consumer tasks, then reports items per second. Defaults
//! come from channelqueue.toml; flags override them.

use std::time::Instant;

use clap::Parser;
use tokio::task::JoinSet;
use tracing::info;

use channelqueue::config::load_config_or_default;
use channelqueue::logging::init_logging;
use channelqueue::{metrics, ChannelQueue, QueueBuilder};

#[derive(Debug, Parser)]
#[command(
    name = "channelqueue-perf",
    version,
    about = "Measure channelqueue throughput for a given capacity and policy"
)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "channelqueue.toml")]
    pub config: String,

    /// Queue capacity (< 1 means unbounded)
    #[arg(long, allow_negative_numbers = true)]
    pub capacity: Option<isize>,

    /// Evict the oldest item instead of blocking producers
    #[arg(long)]
    pub ring: bool,

    /// Total number of items to send
    #[arg(short = 'n', long)]
    pub items: Option<u64>,

    /// Number of producer tasks
    #[arg(short, long)]
    pub producers: Option<usize>,

    /// Number of consumer tasks
    #[arg(short = 'r', long)]
    pub consumers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cfg = load_config_or_default(&cli.config)?;

    let mut queue_cfg = cfg.queue.clone();
    if let Some(capacity) = cli.capacity {
        queue_cfg.capacity = capacity;
    }
    queue_cfg.ring |= cli.ring;
    let items = cli.items.unwrap_or(cfg.perf.items);
    let producers = cli.producers.unwrap_or(cfg.perf.producers).max(1);
    let consumers = cli.consumers.unwrap_or(cfg.perf.consumers).max(1);

    let queue: ChannelQueue<u64> = QueueBuilder::from_config(&queue_cfg).build();
    info!(
        capacity = queue.cap(),
        policy = %queue.policy(),
        items,
        producers,
        consumers,
        "starting run"
    );

    let start = Instant::now();

    let mut producer_tasks = JoinSet::new();
    for p in 0..producers as u64 {
        let ingress = queue.ingress().clone();
        let share = items / producers as u64 + u64::from(p < items % producers as u64);
        producer_tasks.spawn(async move {
            for i in 0..share {
                ingress.send(i).await;
            }
        });
    }

    let mut consumer_tasks = JoinSet::new();
    for _ in 0..consumers {
        let egress = queue.egress().clone();
        consumer_tasks.spawn(async move {
            let mut received = 0u64;
            while egress.recv().await.is_some() {
                received += 1;
            }
            received
        });
    }

    while let Some(res) = producer_tasks.join_next().await {
        res?;
    }
    queue.close();

    let mut received = 0u64;
    while let Some(res) = consumer_tasks.join_next().await {
        received += res?;
    }
    let elapsed = start.elapsed();
    queue.shutdown().await;

    println!(
        "Sent {items} items, received {received} in {:?} ({:.0} items/sec)",
        elapsed,
        received as f64 / elapsed.as_secs_f64()
    );
    print!("{}", metrics::snapshot());

    Ok(())
}
