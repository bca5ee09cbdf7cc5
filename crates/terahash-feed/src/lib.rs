//! # terahash-feed
//!
//! The standard read-only price-feed abstraction shared by every feed in the
//! Terahash workspace: the upstream BTC/USD source, the spot-backed feed the
//! daemon maintains, and the composite hashprice oracle itself all expose the
//! same five read operations, so downstream financial logic written against
//! this trait works unmodified regardless of which feed it is pointed at.
//!
//! ## Modules
//!
//! - [`static_feed`] — in-memory settable feed for tests and development

pub mod static_feed;

pub use static_feed::StaticFeed;

use serde::{Deserialize, Serialize};
use terahash_types::Timestamp;

/// Error types for feed reads.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Historical round lookup is not supported by this feed.
    #[error("historical round lookup is not implemented")]
    NotImplemented,

    /// The feed has not published any round yet.
    #[error("feed has no data")]
    NoData,

    /// The feed backend could not be reached or returned garbage.
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// Convenience result type for feed reads.
pub type Result<T> = std::result::Result<T, FeedError>;

/// One published round of a price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    /// Monotonically increasing version marker for this feed's value.
    pub round_id: u128,
    /// The published value in this feed's own decimals.
    pub answer: i128,
    /// When the round was started.
    pub started_at: Timestamp,
    /// When the round's answer was last computed.
    pub updated_at: Timestamp,
    /// The round in which the answer was computed. Feeds that never publish
    /// partial rounds report this equal to `round_id`.
    pub answered_in_round: u128,
}

/// The standard read-only feed interface.
///
/// All reads are pure: implementations must not mutate observable state from
/// any of these methods.
pub trait PriceFeed: Send + Sync {
    /// Number of decimals in `answer`.
    fn decimals(&self) -> u8;

    /// Human-readable label for the feed.
    fn description(&self) -> &str;

    /// Feed implementation version.
    fn version(&self) -> u64;

    /// The latest published round.
    fn latest_round_data(&self) -> Result<RoundData>;

    /// A specific historical round. Feeds that retain no history fail with
    /// [`FeedError::NotImplemented`] for every requested id.
    fn get_round_data(&self, round_id: u128) -> Result<RoundData>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_display() {
        assert_eq!(
            FeedError::NotImplemented.to_string(),
            "historical round lookup is not implemented"
        );
        assert_eq!(
            FeedError::Unavailable("connection refused".into()).to_string(),
            "feed unavailable: connection refused"
        );
    }
}
