//! BTC/USD spot-price client.
//!
//! Queries the CoinGecko simple-price endpoint, retry-wrapped like every
//! other network surface. A response that parses but lacks the expected
//! `bitcoin.usd` field is fatal and carries a bounded body snippet.

use serde::Deserialize;

use crate::retry::{check_retryable_status, AttemptError, RetryPolicy};
use crate::{snippet, Result, UpdaterError};

/// Default endpoint for the BTC/USD spot price.
pub const DEFAULT_API_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

#[derive(Debug, Deserialize)]
struct SimplePrice {
    bitcoin: Option<BitcoinPrice>,
}

#[derive(Debug, Deserialize)]
struct BitcoinPrice {
    usd: Option<f64>,
}

/// Retry-wrapped CoinGecko spot-price client.
pub struct Coingecko {
    http: reqwest::Client,
    api_url: String,
    retry: RetryPolicy,
}

impl Coingecko {
    /// Create a client against the default endpoint.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_API_URL, RetryPolicy::default())
    }

    /// Create a client against a custom endpoint (tests, mirrors).
    pub fn with_url(api_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            retry,
        }
    }

    /// The current BTC/USD exchange rate.
    pub async fn btc_usd_rate(&self) -> Result<f64> {
        let context = "CoinGecko price";
        self.retry.run(context, || self.attempt(context)).await
    }

    async fn attempt(&self, context: &str) -> std::result::Result<f64, AttemptError> {
        let response = self
            .http
            .get(&self.api_url)
            .send()
            .await
            .map_err(|e| AttemptError::transient(UpdaterError::Transport(e)))?;

        if let Some(transient) = check_retryable_status(context, &response) {
            return Err(transient);
        }
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AttemptError::transient(UpdaterError::Transport(e)))?;

        let parsed: SimplePrice = serde_json::from_str(&text).map_err(|_| {
            AttemptError::Fatal(UpdaterError::ParseResponse {
                context: context.to_string(),
                status,
                snippet: snippet(&text),
            })
        })?;

        parsed
            .bitcoin
            .and_then(|b| b.usd)
            .ok_or_else(|| {
                AttemptError::Fatal(UpdaterError::UnexpectedShape {
                    snippet: snippet(&text),
                })
            })
    }
}

impl Default for Coingecko {
    fn default() -> Self {
        Self::new()
    }
}
