//! Spot-backed BTC/USD feed.
//!
//! Pairs the spot-price client with an in-memory feed so the composite
//! engine can be pointed at a live BTC/USD source even where no external
//! feed provider exists on the host. Every successful refresh opens a new
//! round; the engine's freshness invariant then takes care of consumers that
//! read between refreshes.

use terahash_feed::{PriceFeed, Result as FeedResult, RoundData, StaticFeed};
use terahash_types::Timestamp;

use crate::coingecko::Coingecko;
use crate::Result;

/// A [`PriceFeed`] over the most recently fetched spot price.
pub struct SpotFeed {
    client: Coingecko,
    feed: StaticFeed,
    decimals: u8,
}

impl SpotFeed {
    /// Create an empty spot feed publishing with the given decimals.
    pub fn new(client: Coingecko, decimals: u8) -> Self {
        Self {
            client,
            feed: StaticFeed::new(decimals, "BTC / USD (spot)"),
            decimals,
        }
    }

    /// Fetch the current spot rate and publish it as a new round stamped at
    /// `now`. Returns the scaled price that was published.
    pub async fn refresh(&self, now: Timestamp) -> Result<i128> {
        let rate = self.client.btc_usd_rate().await?;
        let scaled = scale_price(rate, self.decimals);
        let round_id = self.feed.set_price(scaled, now);
        tracing::info!(rate, scaled, round_id, "spot price refreshed");
        Ok(scaled)
    }

    /// Publish an externally obtained price directly (tests, replays).
    pub fn record_price(&self, answer: i128, now: Timestamp) -> u128 {
        self.feed.set_price(answer, now)
    }
}

/// Scale a float exchange rate into fixed-point raw units.
fn scale_price(rate: f64, decimals: u8) -> i128 {
    (rate * 10f64.powi(i32::from(decimals))).round() as i128
}

impl PriceFeed for SpotFeed {
    fn decimals(&self) -> u8 {
        self.feed.decimals()
    }

    fn description(&self) -> &str {
        self.feed.description()
    }

    fn version(&self) -> u64 {
        self.feed.version()
    }

    fn latest_round_data(&self) -> FeedResult<RoundData> {
        self.feed.latest_round_data()
    }

    fn get_round_data(&self, round_id: u128) -> FeedResult<RoundData> {
        self.feed.get_round_data(round_id)
    }
}
