//! # terahash-updater
//!
//! Off-chain collaborators of the hashprice oracle: the periodic job that
//! measures how many hashes the Bitcoin network currently requires to mine
//! one BTC, and the spot-price client used to maintain a BTC/USD feed. Both
//! network surfaces are wrapped in a bounded exponential-backoff retry
//! policy; a failure reaches the operator only after the retry budget is
//! exhausted, carrying the last underlying cause.
//!
//! ## Modules
//!
//! - [`retry`] — bounded exponential backoff with `Retry-After` support
//! - [`bitcoin`] — Bitcoin-node JSON-RPC client and hash-count derivation
//! - [`coingecko`] — BTC/USD spot-price client
//! - [`spot`] — spot-backed feed implementing the standard read surface

pub mod bitcoin;
pub mod coingecko;
pub mod retry;
pub mod spot;

pub use bitcoin::BitcoinClient;
pub use coingecko::Coingecko;
pub use retry::RetryPolicy;
pub use spot::SpotFeed;

/// Error types for updater operations.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// Transport-level HTTP failure (DNS, connection refused, timeout).
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{context}: HTTP {status}")]
    HttpStatus {
        /// What was being fetched.
        context: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not parseable.
    #[error("{context}: failed to parse response (status {status}): {snippet}")]
    ParseResponse {
        /// What was being fetched.
        context: String,
        /// The HTTP status code.
        status: u16,
        /// Bounded prefix of the raw body.
        snippet: String,
    },

    /// The RPC server reported an error for a method call.
    #[error("rpc error for {method}: {message}")]
    Rpc {
        /// The JSON-RPC method that failed.
        method: String,
        /// The server's error message.
        message: String,
    },

    /// The response parsed but did not have the expected shape.
    #[error("unexpected response format: {snippet}")]
    UnexpectedShape {
        /// Bounded prefix of the raw body.
        snippet: String,
    },

    /// The node reported a zero block reward; the derivation would divide
    /// by zero.
    #[error("block reward is zero")]
    ZeroBlockReward,

    /// The node reported an unusable difficulty value.
    #[error("invalid network difficulty: {0}")]
    InvalidDifficulty(f64),

    /// Every attempt failed; `source` is the last underlying cause.
    #[error("{context}: all {attempts} attempts failed")]
    RetriesExhausted {
        /// What was being fetched.
        context: String,
        /// Total attempts made, including the first.
        attempts: u32,
        /// The last underlying failure.
        #[source]
        source: Box<UpdaterError>,
    },
}

/// Convenience result type for updater operations.
pub type Result<T> = std::result::Result<T, UpdaterError>;

/// Truncate a response body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_bounds_long_bodies() {
        let long = "x".repeat(2_000);
        assert_eq!(snippet(&long).len(), 500);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_retries_exhausted_names_last_cause() {
        let err = UpdaterError::RetriesExhausted {
            context: "Bitcoin RPC getblockchaininfo".into(),
            attempts: 4,
            source: Box::new(UpdaterError::HttpStatus {
                context: "Bitcoin RPC getblockchaininfo".into(),
                status: 503,
            }),
        };
        assert_eq!(
            err.to_string(),
            "Bitcoin RPC getblockchaininfo: all 4 attempts failed"
        );
        let source = std::error::Error::source(&err).expect("source attached");
        assert!(source.to_string().contains("HTTP 503"));
    }
}
