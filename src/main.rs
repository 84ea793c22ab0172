use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use header::headertest::{DummyHeader, TestSuite};
use header::{Header, MessageAcceptance, Store, Subscriber};
use libp2p_identity::PeerId;
use p2p::{GossipSubscriber, HeaderTopic, LocalExchange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use store::MemStore;
use syncer::{Parameters, Syncer};
use tokio::{task, time};
use tracing::{debug, info, warn};

/// Headers the remote chain holds before the local node starts.
const INITIAL_BACKLOG: usize = 64;

/// Grace period for the final catch-up after the producer stops.
const SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Local devnet: a producer extends a remote chain and gossips every header,
/// while a fresh node bootstraps from the genesis hash and syncs to the tip.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = 200)]
    block_time_ms: u64,

    #[arg(long, default_value_t = 168 * 60 * 60)]
    trusting_period_secs: u64,

    /// Headers produced after the node starts.
    #[arg(short, long, default_value_t = 100)]
    blocks: usize,

    /// Peers gossiping each header.
    #[arg(short, long, default_value_t = 3)]
    fanout: usize,

    /// Probability that a single gossip delivery is lost.
    #[arg(short, long, default_value_t = 0.2)]
    drop_rate: f64,

    #[arg(short, long, default_value = "devnet")]
    network: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    ensure!(
        (0.0..=1.0).contains(&args.drop_rate),
        "drop rate must be within [0, 1], got {}",
        args.drop_rate
    );

    let params = Parameters::default()
        .with_block_time(Duration::from_millis(args.block_time_ms))
        .with_trusting_period(Duration::from_secs(args.trusting_period_secs));

    let mut suite = TestSuite::new();
    let genesis = suite.head();

    let remote = Arc::new(MemStore::with_head(genesis.clone()));
    remote
        .append(suite.gen_dummy_headers(INITIAL_BACKLOG))
        .await
        .context("Failed to build remote chain")?;
    let exchange = Arc::new(LocalExchange::new(remote.clone()));

    let local: Arc<MemStore<DummyHeader>> = Arc::new(MemStore::new());
    store::init(local.as_ref(), exchange.as_ref(), genesis.hash())
        .await
        .context("Failed to initialize local store")?;

    let gossip = Arc::new(GossipSubscriber::<DummyHeader>::new(HeaderTopic::new(args.network)));
    let mut subscription = gossip.subscribe()?;
    let observer = task::spawn(async move {
        while let Ok(header) = subscription.next_header().await {
            debug!(height = header.height(), "Observed gossip header");
        }
    });

    let syncer = Arc::new(Syncer::new(exchange, local.clone(), gossip.clone(), params)?);
    syncer.start().await?;
    info!(topic = %gossip.topic(), ?params, "Node started");

    let mut rng = StdRng::from_entropy();
    let mut ticker = time::interval(params.block_time);
    let (mut accepted, mut ignored, mut rejected, mut dropped) = (0usize, 0usize, 0usize, 0usize);

    for _ in 0..args.blocks {
        ticker.tick().await;

        let header = suite.next_header();
        remote.append(vec![header.clone()]).await?;

        for _ in 0..args.fanout {
            if rng.gen_bool(args.drop_rate) {
                dropped += 1;
                continue;
            }
            match gossip.deliver(PeerId::random(), header.clone()).await {
                MessageAcceptance::Accept => accepted += 1,
                MessageAcceptance::Ignore => ignored += 1,
                MessageAcceptance::Reject => rejected += 1,
            }
        }
    }

    info!(
        produced = args.blocks,
        accepted, ignored, rejected, dropped, "Producer finished"
    );

    let remote_height = remote.height().await;
    match time::timeout(SYNC_TIMEOUT, async {
        while syncer.report().target_height < remote_height {
            syncer.head().await?;
            time::sleep(params.block_time).await;
        }
        syncer.wait_sync().await
    })
    .await
    {
        Ok(result) => result?,
        Err(_) => warn!(timeout = ?SYNC_TIMEOUT, "Node did not catch up in time"),
    }

    let report = syncer.report();
    syncer.stop().await?;
    observer.abort();

    let local_height = local.height().await;
    info!(
        local_height,
        remote_height,
        target = report.target_height,
        cached_ranges = report.cached_ranges,
        "Simulation finished"
    );
    ensure!(
        local_height == remote_height,
        "node stopped at height {local_height}, chain is at {remote_height}"
    );
    ensure!(
        local.get_range(1, local_height + 1) == remote.get_range(1, remote_height + 1),
        "local chain diverged from the remote chain"
    );

    Ok(())
}
