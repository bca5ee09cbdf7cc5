//! Integration test: measurement retries feeding the engine.
//!
//! Drives the updater's retry policy against a flaky measurement source
//! under a paused clock, then verifies what the engine publishes: a
//! recovered measurement lands in the feed, an exhausted retry budget
//! leaves the last good reading in place.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use terahash_feed::StaticFeed;
use terahash_oracle::HashrateOracle;
use terahash_types::{Address, TTL_DISABLED};
use terahash_updater::bitcoin::derive_hashes_for_btc;
use terahash_updater::retry::AttemptError;
use terahash_updater::{RetryPolicy, UpdaterError};

const OWNER: Address = [0xaa; 20];
const UPDATER: Address = [0xbb; 20];

const DIFFICULTY: f64 = 121e12;
const BLOCK_REWARD_SATS: u64 = 312_500_000;
const BTC_PRICE: i128 = 84_524_200_000;

fn deploy() -> (Arc<StaticFeed>, HashrateOracle) {
    let upstream = Arc::new(StaticFeed::new(6, "BTC / USD"));
    upstream.set_price(BTC_PRICE, 1_000);

    let mut oracle = HashrateOracle::new(upstream.clone(), 6);
    oracle.initialize(OWNER).expect("initialize");
    oracle
        .set_ttl(OWNER, TTL_DISABLED, TTL_DISABLED)
        .expect("ttl");
    oracle.set_updater_address(OWNER, UPDATER).expect("updater");
    (upstream, oracle)
}

fn transient(status: u16) -> AttemptError {
    AttemptError::transient(UpdaterError::HttpStatus {
        context: "Bitcoin RPC getblockchaininfo".into(),
        status,
    })
}

#[tokio::test(start_paused = true)]
async fn flaky_measurement_recovers_and_feeds_the_oracle() {
    let (_, mut oracle) = deploy();
    let hashes = derive_hashes_for_btc(DIFFICULTY, BLOCK_REWARD_SATS).expect("derive");

    let policy = RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_secs(1),
    };
    let attempts = AtomicU32::new(0);
    let start = tokio::time::Instant::now();
    let measured = policy
        .run("Bitcoin RPC getblockchaininfo", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient(503))
                } else {
                    Ok(hashes)
                }
            }
        })
        .await
        .expect("recovered measurement");

    // Two backoff waits (1s + 2s) under the paused clock, then success.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(3));

    oracle
        .set_hashes_for_btc(UPDATER, measured, 2_000)
        .expect("push");
    let data = oracle.latest_round_data_at(3_000).expect("round data");
    assert_eq!(oracle.get_hashes_for_btc(), hashes);
    assert!(data.answer > 0);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_leaves_last_good_reading_in_place() {
    let (_, mut oracle) = deploy();
    let hashes = derive_hashes_for_btc(DIFFICULTY, BLOCK_REWARD_SATS).expect("derive");
    oracle
        .set_hashes_for_btc(UPDATER, hashes, 2_000)
        .expect("push");
    let before = oracle.latest_round_data_at(3_000).expect("before");

    let policy = RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_secs(1),
    };
    let err = policy
        .run::<u128, _, _>("Bitcoin RPC getblockchaininfo", || async {
            Err(transient(500))
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        UpdaterError::RetriesExhausted { attempts: 3, .. }
    ));

    // Nothing was pushed, so the feed keeps serving the prior round.
    let after = oracle.latest_round_data_at(4_000).expect("after");
    assert_eq!(after, before);
}
