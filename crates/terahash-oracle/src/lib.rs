//! # terahash-oracle
//!
//! The composite hashprice aggregation engine.
//!
//! The engine composes an external BTC/USD price feed with a periodically
//! refreshed hashes-for-BTC measurement into one coherent feed: expected
//! payment-token revenue per 100 TH/s of hashrate per day, published through
//! the standard read-only feed interface of `terahash-feed`.
//!
//! ## Modules
//!
//! - [`access`] — owner and updater roles, ownership transfer
//! - [`store`] — hash-count parameter store and composite round encoding
//! - [`math`] — fixed-point hashprice arithmetic across three decimal systems
//! - [`engine`] — the aggregation engine and its standard-interface shim
//! - [`upgrade`] — owner-gated in-place state migration

pub mod access;
pub mod engine;
pub mod math;
pub mod store;
pub mod upgrade;

pub use engine::HashrateOracle;

use terahash_feed::FeedError;
use terahash_types::{Address, Timestamp};

/// Error types for oracle operations.
///
/// A closed taxonomy: the two authorization conditions are deliberately
/// distinct because the owner and updater roles are independently managed.
/// Every mutating failure leaves engine state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// A zero-valued hash-count update was rejected.
    #[error("hashes-for-BTC value cannot be zero")]
    ZeroValue,

    /// The caller is not the designated updater.
    #[error("caller {caller} is not the updater")]
    UnauthorizedUpdater {
        /// Hex-encoded caller address.
        caller: String,
    },

    /// The caller is not the owner.
    #[error("caller {caller} is not the owner")]
    OwnerOnly {
        /// Hex-encoded caller address.
        caller: String,
    },

    /// Ownership cannot be transferred to the zero address; use
    /// renunciation instead.
    #[error("new owner cannot be the zero address")]
    InvalidNewOwner,

    /// Historical round lookup is unsupported; only the latest round exists.
    #[error("historical round data is not implemented")]
    NotImplemented,

    /// The upstream BTC feed read failed. Propagated, never defaulted.
    #[error("upstream BTC feed failed")]
    Upstream(#[from] FeedError),

    /// The upstream feed reported a non-positive price.
    #[error("upstream BTC price is not positive: {0}")]
    InvalidUpstreamPrice(i128),

    /// No hash-count has been pushed yet; the feed is not usable.
    #[error("hashes-for-BTC has not been set")]
    Uninitialized,

    /// The one-time bootstrap was already performed.
    #[error("oracle is already initialized")]
    AlreadyInitialized,

    /// An input exceeded its configured maximum age.
    #[error("{input} input is stale: age {age}s exceeds max {max_age}s")]
    StaleInput {
        /// Which input went stale ("btc" or "hashes").
        input: &'static str,
        /// Observed age in seconds at read time.
        age: Timestamp,
        /// Configured maximum age in seconds.
        max_age: Timestamp,
    },

    /// Composite arithmetic exceeded 256 bits.
    #[error("arithmetic overflow in hashprice calculation")]
    Overflow,
}

impl OracleError {
    pub(crate) fn unauthorized_updater(caller: &Address) -> Self {
        Self::UnauthorizedUpdater {
            caller: terahash_types::format_address(caller),
        }
    }

    pub(crate) fn owner_only(caller: &Address) -> Self {
        Self::OwnerOnly {
            caller: terahash_types::format_address(caller),
        }
    }
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
