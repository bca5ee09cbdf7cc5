//! Daemon configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use terahash_types::{Address, TTL_DISABLED};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Bitcoin node settings.
    #[serde(default)]
    pub bitcoin: BitcoinConfig,
    /// Spot-price settings.
    #[serde(default)]
    pub spot: SpotConfig,
    /// Update-job settings.
    #[serde(default)]
    pub updater: UpdaterConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Payment-token decimals (6 for USDC-style tokens).
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,
    /// Max age of the upstream BTC observation in seconds. 0 disables.
    #[serde(default)]
    pub btc_max_age_secs: u64,
    /// Max age of the hashes-for-BTC record in seconds. 0 disables.
    #[serde(default)]
    pub hashes_max_age_secs: u64,
    /// Hex address acting as deployer, owner and updater for this process.
    #[serde(default = "default_operator_address")]
    pub operator_address: String,
}

/// Bitcoin node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinConfig {
    /// JSON-RPC endpoint of the node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

/// Spot-price configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotConfig {
    /// Whether to poll the spot price at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between spot refreshes.
    #[serde(default = "default_spot_interval")]
    pub poll_interval_secs: u64,
    /// Decimals of the published spot feed.
    #[serde(default = "default_spot_decimals")]
    pub decimals: u8,
}

/// Update-job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Seconds between hash-count measurements.
    #[serde(default = "default_updater_interval")]
    pub interval_secs: u64,
    /// Retry budget per network call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_token_decimals() -> u8 {
    6
}

fn default_operator_address() -> String {
    "0x0000000000000000000000000000000000000001".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8332".to_string()
}

fn default_true() -> bool {
    true
}

fn default_spot_interval() -> u64 {
    60
}

fn default_spot_decimals() -> u8 {
    6
}

fn default_updater_interval() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            token_decimals: default_token_decimals(),
            btc_max_age_secs: 0,
            hashes_max_age_secs: 0,
            operator_address: default_operator_address(),
        }
    }
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
        }
    }
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_spot_interval(),
            decimals: default_spot_decimals(),
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_updater_interval(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// The operator address parsed from its hex form.
    pub fn operator_address(&self) -> anyhow::Result<Address> {
        parse_address(&self.oracle.operator_address)
    }

    /// Configured max age for the BTC input (0 in the file means disabled).
    pub fn btc_max_age(&self) -> u64 {
        if self.oracle.btc_max_age_secs == 0 {
            TTL_DISABLED
        } else {
            self.oracle.btc_max_age_secs
        }
    }

    /// Configured max age for the hashes input (0 in the file means disabled).
    pub fn hashes_max_age(&self) -> u64 {
        if self.oracle.hashes_max_age_secs == 0 {
            TTL_DISABLED
        } else {
            self.oracle.hashes_max_age_secs
        }
    }

    /// The config file path.
    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("TERAHASH_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".terahash"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/terahash"))
            .join("config.toml")
    }
}

/// Parse a 0x-prefixed (or bare) 40-hex-digit address.
pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)?;
    let mut addr = [0u8; 20];
    if bytes.len() != addr.len() {
        anyhow::bail!("address must be 20 bytes, got {}", bytes.len());
    }
    addr.copy_from_slice(&bytes);
    Ok(addr)
}
