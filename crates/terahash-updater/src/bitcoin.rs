//! Bitcoin-node JSON-RPC client and hash-count derivation.
//!
//! Speaks JSON-RPC 1.0 over HTTP to a Bitcoin node. Every call runs under
//! the retry policy; RPC-level errors and unparseable bodies are fatal (the
//! node answered, retrying will not change its mind), transport failures and
//! 429/5xx responses are transient.
//!
//! The derivation the oracle is fed:
//!
//! ```text
//! hashes_for_btc = difficulty * 2^32 / block_reward_sats
//! ```
//!
//! `difficulty * 2^32` is the expected hash count per block; dividing by the
//! reward spreads it per satoshi-denominated BTC earned. Exact integer math,
//! truncating toward zero.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use terahash_types::DIFFICULTY_TO_HASHRATE_FACTOR;

use crate::retry::{check_retryable_status, AttemptError, RetryPolicy};
use crate::{snippet, Result, UpdaterError};

/// Blockchain summary from `getblockchaininfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
    /// Current chain height.
    pub blocks: u64,
    /// Current network difficulty.
    pub difficulty: f64,
    /// Hash of the current tip.
    pub bestblockhash: String,
}

/// Subsidy and fee totals from `getblockstats`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlockStats {
    /// Block subsidy in satoshi.
    pub subsidy: u64,
    /// Total fees in satoshi.
    pub totalfee: u64,
}

/// Block summary from `getblock`.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    /// Block height.
    pub height: u64,
    /// Block timestamp (epoch seconds).
    pub time: u64,
    /// Difficulty at this block.
    pub difficulty: f64,
    /// Transaction ids.
    pub tx: Vec<String>,
}

/// Header summary from `getblockheader`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    /// Block hash.
    pub hash: String,
    /// Block height.
    pub height: u64,
    /// Block timestamp (epoch seconds).
    pub time: u64,
    /// Difficulty at this block.
    pub difficulty: f64,
    /// Hash of the previous block.
    #[serde(default)]
    pub previousblockhash: Option<String>,
}

/// Output of a raw transaction lookup; only the values are needed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    /// Transaction outputs.
    pub vout: Vec<TxOut>,
}

/// A single transaction output.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TxOut {
    /// Output value in BTC.
    pub value: f64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

/// Retry-wrapped JSON-RPC client for a Bitcoin node.
pub struct BitcoinClient {
    http: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
    retry: RetryPolicy,
}

impl BitcoinClient {
    /// Create a client for the given RPC endpoint with the default retry
    /// policy.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_retry(rpc_url, RetryPolicy::default())
    }

    /// Create a client with an explicit retry policy.
    pub fn with_retry(rpc_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(0),
            retry,
        }
    }

    /// Current chain height.
    pub async fn get_block_count(&self) -> Result<u64> {
        self.request("getblockcount", serde_json::json!([])).await
    }

    /// Block hash at the given height.
    pub async fn get_block_hash(&self, height: u64) -> Result<String> {
        self.request("getblockhash", serde_json::json!([height])).await
    }

    /// Block summary by hash.
    pub async fn get_block(&self, block_hash: &str) -> Result<Block> {
        self.request("getblock", serde_json::json!([block_hash])).await
    }

    /// Header summary by hash.
    pub async fn get_block_header(&self, block_hash: &str) -> Result<BlockHeader> {
        self.request("getblockheader", serde_json::json!([block_hash]))
            .await
    }

    /// Subsidy and total fees for a block (hash or height).
    pub async fn get_block_stats(&self, height: u64) -> Result<BlockStats> {
        self.request(
            "getblockstats",
            serde_json::json!([height, ["subsidy", "totalfee"]]),
        )
        .await
    }

    /// Chain summary: height, difficulty, tip hash.
    pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo> {
        self.request("getblockchaininfo", serde_json::json!([])).await
    }

    /// Decoded transaction by id.
    pub async fn get_raw_transaction(&self, txid: &str) -> Result<RawTransaction> {
        self.request("getrawtransaction", serde_json::json!([txid, true]))
            .await
    }

    /// Measure the network and derive the current hashes-for-BTC value from
    /// the tip's difficulty and the current block subsidy.
    pub async fn measure_hashes_for_btc(&self) -> Result<u128> {
        let info = self.get_blockchain_info().await?;
        let stats = self.get_block_stats(info.blocks).await?;
        let hashes = derive_hashes_for_btc(info.difficulty, stats.subsidy)?;
        tracing::info!(
            height = info.blocks,
            difficulty = info.difficulty,
            subsidy_sats = stats.subsidy,
            hashes_for_btc = hashes,
            "network measured"
        );
        Ok(hashes)
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R> {
        let context = format!("Bitcoin RPC {method}");
        self.retry
            .run(&context, || self.attempt(&context, method, &params))
            .await
    }

    async fn attempt<R: DeserializeOwned>(
        &self,
        context: &str,
        method: &str,
        params: &serde_json::Value,
    ) -> std::result::Result<R, AttemptError> {
        let body = RpcRequest {
            jsonrpc: "1.0",
            id: self.request_id.fetch_add(1, Ordering::SeqCst),
            method,
            params: params.clone(),
        };

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
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

        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|_| {
            AttemptError::Fatal(UpdaterError::ParseResponse {
                context: context.to_string(),
                status,
                snippet: snippet(&text),
            })
        })?;

        if let Some(error) = parsed.error {
            return Err(AttemptError::Fatal(UpdaterError::Rpc {
                method: method.to_string(),
                message: error.message,
            }));
        }
        let result = parsed.result.ok_or_else(|| {
            AttemptError::Fatal(UpdaterError::UnexpectedShape {
                snippet: snippet(&text),
            })
        })?;

        serde_json::from_value(result).map_err(|_| {
            AttemptError::Fatal(UpdaterError::ParseResponse {
                context: context.to_string(),
                status,
                snippet: snippet(&text),
            })
        })
    }
}

/// Derive hashes-for-BTC from a difficulty measurement and the block reward
/// in satoshi: `floor(difficulty * 2^32 / block_reward_sats)`.
///
/// # Errors
///
/// - [`UpdaterError::InvalidDifficulty`] if `difficulty` is non-finite or
///   not positive
/// - [`UpdaterError::ZeroBlockReward`] if the reward is zero
pub fn derive_hashes_for_btc(difficulty: f64, block_reward_sats: u64) -> Result<u128> {
    if !difficulty.is_finite() || difficulty < 1.0 {
        return Err(UpdaterError::InvalidDifficulty(difficulty));
    }
    if block_reward_sats == 0 {
        return Err(UpdaterError::ZeroBlockReward);
    }
    let difficulty_int = difficulty.trunc() as u128;
    let hashes_per_block = difficulty_int
        .checked_mul(DIFFICULTY_TO_HASHRATE_FACTOR)
        .ok_or(UpdaterError::InvalidDifficulty(difficulty))?;
    Ok(hashes_per_block / u128::from(block_reward_sats))
}
