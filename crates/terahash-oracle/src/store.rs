//! Hash-count parameter store and composite round encoding.
//!
//! The store holds the engine's single mutable input: the number of hashes
//! currently required, on average, to mine one BTC. Alongside the value it
//! keeps a local monotonically increasing round counter and the timestamp of
//! the last successful update.
//!
//! ## Composite round encoding
//!
//! The published round id packs two independent version counters into one:
//!
//! ```text
//! composite = (upstream_round_id << 40) | (local_round_id & 0xff_ffff_ffff)
//! ```
//!
//! The local counter is logically unbounded and only masked to 40 bits at
//! encoding time.

use serde::{Deserialize, Serialize};
use terahash_types::Timestamp;

use crate::{OracleError, Result};

/// Width of each half of the composite round id.
pub const ROUND_ID_BITS: u32 = 40;

/// Mask selecting the low 40 bits of the local round counter.
pub const ROUND_ID_MASK: u128 = (1 << ROUND_ID_BITS) - 1;

/// The stored hashes-for-BTC measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashesRecord {
    /// Hashes required to mine one BTC. Zero means not yet usable.
    pub value: u128,
    /// When the value was last successfully updated.
    pub updated_at: Timestamp,
    /// Local round counter: 0 until the first write, then +1 per write.
    pub local_round_id: u64,
}

impl HashesRecord {
    /// Apply a successful update: store the value, stamp the time, and
    /// advance the local round counter by exactly one.
    ///
    /// # Errors
    ///
    /// [`OracleError::ZeroValue`] if `value` is zero; the record is left
    /// unchanged.
    pub fn set(&mut self, value: u128, now: Timestamp) -> Result<()> {
        if value == 0 {
            return Err(OracleError::ZeroValue);
        }
        self.value = value;
        self.updated_at = now;
        self.local_round_id = self.local_round_id.wrapping_add(1);
        Ok(())
    }

    /// Whether a first value has been written.
    pub fn is_set(&self) -> bool {
        self.value != 0
    }
}

/// Pack an upstream round id and a local round counter into the composite
/// round id: upstream in the top bits, local counter masked into the low 40.
pub fn compose_round_id(upstream_round_id: u128, local_round_id: u64) -> u128 {
    (upstream_round_id << ROUND_ID_BITS) | (u128::from(local_round_id) & ROUND_ID_MASK)
}
