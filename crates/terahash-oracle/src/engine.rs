//! The composite aggregation engine.
//!
//! `HashrateOracle` reads the upstream BTC/USD feed fresh on every query,
//! combines it with the stored hashes-for-BTC record, and publishes the
//! result through the standard feed interface. All reads are pure; every
//! mutation passes an explicit capability check first and either applies all
//! of its effects or none of them.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use terahash_feed::{FeedError, PriceFeed, RoundData};
use terahash_types::{format_address, Address, Timestamp};

use crate::access::OwnershipTransferred;
use crate::store::compose_round_id;
use crate::upgrade::{OracleState, Ttl};
use crate::{math, OracleError, Result};

/// Published decimals, fixed at the Bitcoin convention.
pub const DECIMALS: u8 = 8;

/// Published feed label.
pub const DESCRIPTION: &str = "Hashprice Oracle";

/// Published feed version.
pub const VERSION: u64 = 0;

/// The composite hashprice oracle.
///
/// The immutable configuration (upstream handle, token decimals, publishing
/// constants) is fixed at construction; everything mutable lives in
/// [`OracleState`] so in-place upgrades preserve it.
pub struct HashrateOracle {
    upstream: Arc<dyn PriceFeed>,
    token_decimals: u8,
    state: OracleState,
}

impl HashrateOracle {
    /// Construct an uninitialized engine over the given upstream BTC feed.
    ///
    /// `token_decimals` is the payment token's decimal precision (e.g. 6 for
    /// USDC). The engine is unusable until [`initialize`](Self::initialize)
    /// and a first successful hash-count push.
    pub fn new(upstream: Arc<dyn PriceFeed>, token_decimals: u8) -> Self {
        Self {
            upstream,
            token_decimals,
            state: OracleState::new(),
        }
    }

    /// One-time bootstrap: assign the owner role to the deployer.
    ///
    /// # Errors
    ///
    /// [`OracleError::AlreadyInitialized`] on re-entry.
    pub fn initialize(&mut self, deployer: Address) -> Result<()> {
        if self.state.initialized {
            return Err(OracleError::AlreadyInitialized);
        }
        self.state.initialized = true;
        self.state.roles.owner = deployer;
        tracing::info!(owner = %format_address(&deployer), "oracle initialized");
        Ok(())
    }

    /// The current owner.
    pub fn owner(&self) -> Address {
        self.state.roles.owner
    }

    /// The current updater.
    pub fn updater(&self) -> Address {
        self.state.roles.updater
    }

    /// The current staleness thresholds.
    pub fn ttl(&self) -> Ttl {
        self.state.ttl
    }

    // ------------------------------------------------------------------
    // Updater-gated mutation
    // ------------------------------------------------------------------

    /// Store a new hashes-for-BTC measurement.
    ///
    /// The only path that mutates the parameter store: stamps `now` and
    /// advances the local round counter by exactly one.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedUpdater`] if `caller` is not the updater
    /// - [`OracleError::ZeroValue`] if `value` is zero
    pub fn set_hashes_for_btc(
        &mut self,
        caller: Address,
        value: u128,
        now: Timestamp,
    ) -> Result<()> {
        self.state.roles.require_updater(&caller)?;
        self.state.record.set(value, now)?;
        tracing::info!(
            value,
            local_round_id = self.state.record.local_round_id,
            "hashes-for-BTC updated"
        );
        Ok(())
    }

    /// The stored hashes-for-BTC value (zero before the first push).
    pub fn get_hashes_for_btc(&self) -> u128 {
        self.state.record.value
    }

    /// The stored value together with its update timestamp.
    pub fn get_hashes_for_btc_at(&self) -> (u128, Timestamp) {
        (self.state.record.value, self.state.record.updated_at)
    }

    // ------------------------------------------------------------------
    // Owner-gated mutations
    // ------------------------------------------------------------------

    /// Set the maximum ages for the two inputs. Owner-gated.
    pub fn set_ttl(&mut self, caller: Address, btc_max_age: u64, hashes_max_age: u64) -> Result<()> {
        self.state.roles.require_owner(&caller)?;
        self.state.ttl = Ttl {
            btc_max_age,
            hashes_max_age,
        };
        tracing::info!(btc_max_age, hashes_max_age, "TTL configured");
        Ok(())
    }

    /// Designate the updater principal. Owner-gated.
    pub fn set_updater_address(&mut self, caller: Address, updater: Address) -> Result<()> {
        self.state.roles.require_owner(&caller)?;
        self.state.roles.updater = updater;
        tracing::info!(updater = %format_address(&updater), "updater assigned");
        Ok(())
    }

    /// Transfer the owner role. Owner-gated; returns the role-change
    /// notification.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<OwnershipTransferred> {
        self.state.roles.transfer_ownership(&caller, new_owner)
    }

    /// Renounce the owner role permanently. Owner-gated; returns the
    /// role-change notification with the zero address as the new holder.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<OwnershipTransferred> {
        self.state.roles.renounce_ownership(&caller)
    }

    // ------------------------------------------------------------------
    // Upgrade gate
    // ------------------------------------------------------------------

    /// Check that `caller` may upgrade the engine in place. Owner-gated.
    pub fn authorize_upgrade(&self, caller: Address) -> Result<()> {
        self.state.roles.require_owner(&caller)
    }

    /// Apply a state-layout migration in place. Owner-gated; the migration
    /// runs only after authorization passes, and the layout version is bumped
    /// as part of the same commit.
    pub fn upgrade_state<F>(&mut self, caller: Address, to_version: u32, migrate: F) -> Result<()>
    where
        F: FnOnce(&mut OracleState),
    {
        self.authorize_upgrade(caller)?;
        let from_version = self.state.layout_version;
        migrate(&mut self.state);
        self.state.layout_version = to_version;
        tracing::info!(from_version, to_version, "state layout migrated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    /// The latest composite round, evaluated at `now`.
    ///
    /// Reads the upstream feed fresh, combines it with the stored record,
    /// and never reports the result fresher than its stalest input:
    /// `updated_at = min(upstream.updated_at, record.updated_at)` and
    /// `started_at = min(upstream.started_at, record.updated_at)`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Upstream`] if the upstream read fails (propagated,
    ///   no default substituted)
    /// - [`OracleError::InvalidUpstreamPrice`] for non-positive answers
    /// - [`OracleError::Uninitialized`] before the first hash-count push
    /// - [`OracleError::StaleInput`] if a TTL-guarded input is too old
    pub fn latest_round_data_at(&self, now: Timestamp) -> Result<RoundData> {
        let upstream = self.upstream.latest_round_data()?;
        if upstream.answer <= 0 {
            return Err(OracleError::InvalidUpstreamPrice(upstream.answer));
        }
        let record = self.state.record;
        if !record.is_set() {
            return Err(OracleError::Uninitialized);
        }

        let ttl = self.state.ttl;
        Ttl::check("btc", upstream.updated_at, now, ttl.btc_max_age)?;
        Ttl::check("hashes", record.updated_at, now, ttl.hashes_max_age)?;

        let answer = math::hashprice(
            upstream.answer,
            self.upstream.decimals(),
            self.token_decimals,
            record.value,
        )?;

        let round_id = compose_round_id(upstream.round_id, record.local_round_id);
        Ok(RoundData {
            round_id,
            answer,
            started_at: upstream.started_at.min(record.updated_at),
            updated_at: upstream.updated_at.min(record.updated_at),
            answered_in_round: round_id,
        })
    }

    /// Historical rounds are not retained.
    pub fn get_round_data(&self, _round_id: u128) -> Result<RoundData> {
        Err(OracleError::NotImplemented)
    }

    /// The stored hash-count converted into payment-token units at the
    /// current upstream price.
    pub fn hashes_for_token(&self) -> Result<u128> {
        let upstream = self.upstream.latest_round_data()?;
        math::hashes_for_token(
            self.state.record.value,
            upstream.answer,
            self.upstream.decimals(),
            self.token_decimals,
        )
    }
}

fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Standard-interface shim: downstream consumers written against
/// [`PriceFeed`] read the composite feed unmodified. Staleness is evaluated
/// against the wall clock; engine-specific failures fold into
/// [`FeedError::Unavailable`].
impl PriceFeed for HashrateOracle {
    fn decimals(&self) -> u8 {
        DECIMALS
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn version(&self) -> u64 {
        VERSION
    }

    fn latest_round_data(&self) -> terahash_feed::Result<RoundData> {
        self.latest_round_data_at(unix_now()).map_err(|err| match err {
            OracleError::Upstream(feed_err) => feed_err,
            other => FeedError::Unavailable(other.to_string()),
        })
    }

    fn get_round_data(&self, _round_id: u128) -> terahash_feed::Result<RoundData> {
        Err(FeedError::NotImplemented)
    }
}
