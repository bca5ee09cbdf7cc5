//! # terahash-types
//!
//! Shared domain types and constants used across the Terahash workspace.

/// A 20-byte account address identifying a principal (owner, updater, caller).
pub type Address = [u8; 20];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The null address. Renouncing ownership assigns the owner role to this
/// sentinel, after which no owner-gated operation can succeed.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Bitcoin's native decimal precision (1 BTC = 10^8 satoshi).
pub const BTC_DECIMALS: u32 = 8;

/// Hashes performed by one canonical unit of hashrate (100 TH/s) sustained
/// for one day: `100 * 10^12 * 24 * 3600`.
pub const HASHES_PER_100_THS_PER_DAY: u128 = 100 * 10u128.pow(12) * 24 * 3600;

/// Expected number of hashes per unit of Bitcoin network difficulty (2^32).
pub const DIFFICULTY_TO_HASHRATE_FACTOR: u128 = 1 << 32;

/// Sentinel max-age value that disables a staleness check.
pub const TTL_DISABLED: u64 = u64::MAX;

/// Render an address as a 0x-prefixed hex string for logs and errors.
pub fn format_address(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}
