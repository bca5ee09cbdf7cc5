//! Upgrade-in-place with preserved storage.
//!
//! The engine separates an immutable configuration section (published
//! decimals, description, token decimals, the upstream feed handle) from the
//! mutable state section defined here. Code upgrades replace behavior while
//! this state survives; the layout carries an explicit version so a migration
//! can reshape it deliberately rather than accidentally.

use serde::{Deserialize, Serialize};
use terahash_types::{Timestamp, TTL_DISABLED};

use crate::access::Roles;
use crate::store::HashesRecord;
use crate::{OracleError, Result};

/// Current shape of [`OracleState`].
pub const LAYOUT_VERSION: u32 = 1;

/// Maximum-age thresholds for the two inputs. [`TTL_DISABLED`] disables the
/// corresponding check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ttl {
    /// Maximum age of the upstream BTC observation, in seconds.
    pub btc_max_age: u64,
    /// Maximum age of the hashes-for-BTC record, in seconds.
    pub hashes_max_age: u64,
}

impl Default for Ttl {
    fn default() -> Self {
        Self {
            btc_max_age: TTL_DISABLED,
            hashes_max_age: TTL_DISABLED,
        }
    }
}

impl Ttl {
    /// Check one input's age against its threshold.
    ///
    /// # Errors
    ///
    /// [`OracleError::StaleInput`] if the age exceeds `max_age` and the check
    /// is not disabled.
    pub fn check(
        input: &'static str,
        updated_at: Timestamp,
        now: Timestamp,
        max_age: u64,
    ) -> Result<()> {
        if max_age == TTL_DISABLED {
            return Ok(());
        }
        let age = now.saturating_sub(updated_at);
        if age > max_age {
            return Err(OracleError::StaleInput {
                input,
                age,
                max_age,
            });
        }
        Ok(())
    }
}

/// The engine's mutable state section.
///
/// Everything an in-place upgrade must preserve lives here; nothing else in
/// the engine is mutable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleState {
    /// Whether the one-time bootstrap has run.
    pub initialized: bool,
    /// Explicit version of this layout.
    pub layout_version: u32,
    /// Owner and updater principals.
    pub roles: Roles,
    /// The hashes-for-BTC parameter store.
    pub record: HashesRecord,
    /// Staleness thresholds.
    pub ttl: Ttl,
}

impl OracleState {
    /// Fresh, uninitialized state at the current layout version.
    pub fn new() -> Self {
        Self {
            layout_version: LAYOUT_VERSION,
            ..Self::default()
        }
    }
}
