//! Owner and updater roles.
//!
//! Two independent, non-overlapping authorization domains guard the engine's
//! mutable surface: the *owner* holds governance, configuration and upgrade
//! authority; the *updater* is the sole principal allowed to push new
//! hashes-for-BTC measurements. Each violation surfaces its own error kind
//! so the two roles are never conflated.

use serde::{Deserialize, Serialize};
use terahash_types::{format_address, Address, ZERO_ADDRESS};

use crate::{OracleError, Result};

/// Notification emitted on ownership transfer or renunciation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    /// The holder before the change.
    pub previous_owner: Address,
    /// The holder after the change; `ZERO_ADDRESS` after renunciation.
    pub new_owner: Address,
}

/// The engine's two principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    /// Governance, configuration and upgrade authority.
    pub owner: Address,
    /// Sole authorized writer of the hashes-for-BTC input.
    pub updater: Address,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            owner: ZERO_ADDRESS,
            updater: ZERO_ADDRESS,
        }
    }
}

impl Roles {
    /// Check that `caller` holds the owner role.
    ///
    /// A renounced owner (zero address) can never be matched, so all
    /// owner-gated operations fail permanently after renunciation.
    pub fn require_owner(&self, caller: &Address) -> Result<()> {
        if self.owner == ZERO_ADDRESS || *caller != self.owner {
            return Err(OracleError::owner_only(caller));
        }
        Ok(())
    }

    /// Check that `caller` holds the updater role.
    pub fn require_updater(&self, caller: &Address) -> Result<()> {
        if self.updater == ZERO_ADDRESS || *caller != self.updater {
            return Err(OracleError::unauthorized_updater(caller));
        }
        Ok(())
    }

    /// Transfer ownership to `new_owner`. Owner-gated.
    ///
    /// # Errors
    ///
    /// - [`OracleError::OwnerOnly`] if `caller` is not the owner
    /// - [`OracleError::InvalidNewOwner`] if `new_owner` is the zero address
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<OwnershipTransferred> {
        self.require_owner(caller)?;
        if new_owner == ZERO_ADDRESS {
            return Err(OracleError::InvalidNewOwner);
        }
        let previous_owner = self.owner;
        self.owner = new_owner;
        tracing::info!(
            previous_owner = %format_address(&previous_owner),
            new_owner = %format_address(&new_owner),
            "ownership transferred"
        );
        Ok(OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    /// Renounce ownership, setting the owner to the zero address. Owner-gated
    /// and irreversible.
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<OwnershipTransferred> {
        self.require_owner(caller)?;
        let previous_owner = self.owner;
        self.owner = ZERO_ADDRESS;
        tracing::warn!(
            previous_owner = %format_address(&previous_owner),
            "ownership renounced"
        );
        Ok(OwnershipTransferred {
            previous_owner,
            new_owner: ZERO_ADDRESS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        [byte; 20]
    }

    #[test]
    fn test_require_owner_accepts_owner() {
        let roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        roles.require_owner(&addr(1)).expect("owner passes");
    }

    #[test]
    fn test_require_owner_rejects_non_owner() {
        let roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let err = roles.require_owner(&addr(2)).unwrap_err();
        assert!(matches!(err, OracleError::OwnerOnly { .. }));
    }

    #[test]
    fn test_owner_and_updater_violations_are_distinct() {
        let roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        // The owner is not automatically the updater, and vice versa.
        assert!(matches!(
            roles.require_updater(&addr(1)).unwrap_err(),
            OracleError::UnauthorizedUpdater { .. }
        ));
        assert!(matches!(
            roles.require_owner(&addr(2)).unwrap_err(),
            OracleError::OwnerOnly { .. }
        ));
    }

    #[test]
    fn test_unset_updater_rejects_everyone() {
        let roles = Roles {
            owner: addr(1),
            updater: ZERO_ADDRESS,
        };
        let err = roles.require_updater(&ZERO_ADDRESS).unwrap_err();
        assert!(matches!(err, OracleError::UnauthorizedUpdater { .. }));
    }

    #[test]
    fn test_transfer_ownership_emits_notification() {
        let mut roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let event = roles
            .transfer_ownership(&addr(1), addr(3))
            .expect("transfer");
        assert_eq!(event.previous_owner, addr(1));
        assert_eq!(event.new_owner, addr(3));
        assert_eq!(roles.owner, addr(3));
    }

    #[test]
    fn test_transfer_ownership_rejects_non_owner() {
        let mut roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let before = roles;
        let err = roles.transfer_ownership(&addr(9), addr(3)).unwrap_err();
        assert!(matches!(err, OracleError::OwnerOnly { .. }));
        assert_eq!(roles, before);
    }

    #[test]
    fn test_transfer_to_zero_address_rejected() {
        let mut roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let err = roles.transfer_ownership(&addr(1), ZERO_ADDRESS).unwrap_err();
        assert!(matches!(err, OracleError::InvalidNewOwner));
        assert_eq!(roles.owner, addr(1));
    }

    #[test]
    fn test_renounce_ownership() {
        let mut roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let event = roles.renounce_ownership(&addr(1)).expect("renounce");
        assert_eq!(event.previous_owner, addr(1));
        assert_eq!(event.new_owner, ZERO_ADDRESS);
        assert_eq!(roles.owner, ZERO_ADDRESS);

        // Owner-gated operations fail permanently afterwards.
        assert!(matches!(
            roles.require_owner(&addr(1)).unwrap_err(),
            OracleError::OwnerOnly { .. }
        ));
    }

    #[test]
    fn test_renounce_rejects_non_owner() {
        let mut roles = Roles {
            owner: addr(1),
            updater: addr(2),
        };
        let err = roles.renounce_ownership(&addr(2)).unwrap_err();
        assert!(matches!(err, OracleError::OwnerOnly { .. }));
        assert_eq!(roles.owner, addr(1));
    }
}
