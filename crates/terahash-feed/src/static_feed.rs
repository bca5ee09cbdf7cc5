//! In-memory settable price feed.
//!
//! `StaticFeed` holds a single observation behind a lock and republishes it
//! through the standard [`PriceFeed`](crate::PriceFeed) read surface. Each
//! call to [`set_price`](StaticFeed::set_price) opens a new round: the round
//! id increments by one and both timestamps are stamped with the supplied
//! time. Until the first `set_price`, reads fail with
//! [`FeedError::NoData`](crate::FeedError::NoData).
//!
//! This is the development and test stand-in for an external BTC/USD feed;
//! the daemon also uses it (via the updater's spot client) when no on-host
//! upstream feed is available.

use std::sync::RwLock;

use terahash_types::Timestamp;

use crate::{FeedError, PriceFeed, Result, RoundData};

#[derive(Debug, Clone, Copy)]
struct Observation {
    round_id: u128,
    answer: i128,
    started_at: Timestamp,
    updated_at: Timestamp,
}

/// A settable feed with fixed decimals and an in-memory latest round.
#[derive(Debug)]
pub struct StaticFeed {
    decimals: u8,
    description: String,
    latest: RwLock<Option<Observation>>,
}

impl StaticFeed {
    /// Create an empty feed publishing values with the given decimals.
    pub fn new(decimals: u8, description: impl Into<String>) -> Self {
        Self {
            decimals,
            description: description.into(),
            latest: RwLock::new(None),
        }
    }

    /// Publish a new price, opening a new round stamped at `now`.
    ///
    /// Returns the round id of the newly opened round.
    pub fn set_price(&self, answer: i128, now: Timestamp) -> u128 {
        let mut guard = match self.latest.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let round_id = guard.map(|o| o.round_id).unwrap_or(0) + 1;
        *guard = Some(Observation {
            round_id,
            answer,
            started_at: now,
            updated_at: now,
        });
        tracing::debug!(round_id, answer, now, "static feed: price set");
        round_id
    }
}

impl PriceFeed for StaticFeed {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn version(&self) -> u64 {
        0
    }

    fn latest_round_data(&self) -> Result<RoundData> {
        let guard = match self.latest.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let obs = guard.ok_or(FeedError::NoData)?;
        Ok(RoundData {
            round_id: obs.round_id,
            answer: obs.answer,
            started_at: obs.started_at,
            updated_at: obs.updated_at,
            answered_in_round: obs.round_id,
        })
    }

    fn get_round_data(&self, _round_id: u128) -> Result<RoundData> {
        Err(FeedError::NotImplemented)
    }
}
