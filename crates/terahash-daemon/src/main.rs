//! terahash-daemon: periodic hashprice publisher.
//!
//! Single OS process running a Tokio async runtime. Two periodic jobs feed
//! the composite engine: one measures the Bitcoin network and pushes a fresh
//! hashes-for-BTC value, the other refreshes the spot-backed BTC/USD feed
//! the engine reads as its upstream. The engine itself lives behind one
//! lock, so every mutation is serialized and atomic with respect to every
//! other call.

mod config;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use terahash_oracle::HashrateOracle;
use terahash_types::{Address, Timestamp};
use terahash_updater::{BitcoinClient, Coingecko, RetryPolicy, SpotFeed};

use crate::config::DaemonConfig;

fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("terahash={}", config.log.level).parse()?),
        )
        .init();

    info!("Terahash daemon starting");

    let operator = config.operator_address()?;
    let retry = RetryPolicy {
        max_retries: config.updater.max_retries,
        initial_delay: Duration::from_millis(config.updater.initial_delay_ms),
    };

    // Upstream BTC/USD feed, maintained from the spot price.
    let spot = Arc::new(SpotFeed::new(Coingecko::new(), config.spot.decimals));

    // The composite engine: bootstrap the owner, then wire configuration.
    let mut engine = HashrateOracle::new(spot.clone(), config.oracle.token_decimals);
    engine.initialize(operator)?;
    engine.set_ttl(operator, config.btc_max_age(), config.hashes_max_age())?;
    engine.set_updater_address(operator, operator)?;
    let engine = Arc::new(Mutex::new(engine));

    // Prime the spot feed so the first hash-count push can publish a round.
    if config.spot.enabled {
        if let Err(e) = spot.refresh(unix_now()).await {
            warn!("initial spot refresh failed: {e}");
        }
    }

    let spot_task = {
        let spot = spot.clone();
        let enabled = config.spot.enabled;
        let interval = Duration::from_secs(config.spot.poll_interval_secs);
        tokio::spawn(async move {
            if !enabled {
                return;
            }
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = spot.refresh(unix_now()).await {
                    error!("spot refresh failed: {e}");
                }
            }
        })
    };

    let hash_task = {
        let engine = engine.clone();
        let node = BitcoinClient::with_retry(config.bitcoin.rpc_url.clone(), retry);
        let interval = Duration::from_secs(config.updater.interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = push_measurement(&node, &engine, operator).await {
                    error!("hash-count update failed: {e}");
                }
            }
        })
    };

    tokio::select! {
        result = spot_task => {
            error!("spot task exited: {result:?}");
        }
        result = hash_task => {
            error!("hash task exited: {result:?}");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon stopped");
    Ok(())
}

/// Measure the network, push the new hash-count, and log the round the feed
/// now publishes.
async fn push_measurement(
    node: &BitcoinClient,
    engine: &Arc<Mutex<HashrateOracle>>,
    updater: Address,
) -> anyhow::Result<()> {
    let hashes = node.measure_hashes_for_btc().await?;
    let now = unix_now();

    let mut guard = engine.lock().await;
    guard.set_hashes_for_btc(updater, hashes, now)?;

    match guard.latest_round_data_at(now) {
        Ok(round) => info!(
            round_id = %round.round_id,
            answer = %round.answer,
            updated_at = round.updated_at,
            "hashprice published"
        ),
        Err(e) => warn!("feed not yet readable after push: {e}"),
    }
    Ok(())
}
