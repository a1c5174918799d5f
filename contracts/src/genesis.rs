//! # Genesis
//!
//! One-shot deployment of the ledger and its founder timelocks:
//!
//! 1. Mint [`MAX_SUPPLY`] to the owner.
//! 2. Burn [`GENESIS_BURN_BPS`] of it.
//! 3. Send the dev and exchange allocations.
//! 4. Create one [`FoundersTimelock`] per founder, exempt it from fees and
//!    fund it with that founder's allocation.
//!
//! The owner keeps the remainder. All distribution transfers leave from the
//! owner, who is fee-exempt, so every allocation arrives in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::address::Address;
use crate::config::{
    TokenConfig, BPS_DENOMINATOR, DEV_ALLOCATION_BPS, EXCHANGE_ALLOCATION_BPS,
    FOUNDER_ALLOCATIONS_BPS, FOUNDER_CLIFF_SECS, FOUNDER_VESTING_PERIODS,
    FOUNDER_VESTING_PERIOD_SECS, GENESIS_BURN_BPS, MAX_SUPPLY,
};
use crate::router::LiquidityRouter;
use crate::timelock::FoundersTimelock;
use crate::token::{FounderTimelockEntry, ScratchToken, TokenError};
use crate::Amount;

/// Number of founders receiving a vesting allocation.
pub const FOUNDER_COUNT: usize = FOUNDER_ALLOCATIONS_BPS.len();

/// Accounts named at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    pub owner: Address,
    /// In allocation order.
    pub founders: [Address; FOUNDER_COUNT],
    pub dev_wallet: Address,
    pub exchange_wallet: Address,
    pub ops_wallet: Address,
    pub archa_wallet: Address,
}

impl DeployParams {
    /// Deterministic accounts derived from readable labels. Handy for
    /// simulations.
    pub fn from_labels(prefix: &str) -> Self {
        let label = |name: &str| Address::from_label(&format!("{prefix}:{name}"));
        Self {
            owner: label("owner"),
            founders: [
                label("founder-1"),
                label("founder-2"),
                label("founder-3"),
                label("founder-4"),
                label("founder-5"),
            ],
            dev_wallet: label("dev"),
            exchange_wallet: label("exchange"),
            ops_wallet: label("ops"),
            archa_wallet: label("archa"),
        }
    }

    fn validate(&self) -> Result<(), TokenError> {
        if self.founders.iter().any(Address::is_zero) {
            return Err(TokenError::InvalidAddress("founder is the zero address"));
        }
        if self.dev_wallet.is_zero() || self.exchange_wallet.is_zero() {
            return Err(TokenError::InvalidAddress("allocation wallet is the zero address"));
        }
        Ok(())
    }
}

/// A freshly deployed ledger and its founder timelocks, in founder order.
#[derive(Debug)]
pub struct Deployment {
    pub token: ScratchToken,
    pub timelocks: Vec<FoundersTimelock>,
}

/// `MAX_SUPPLY * bps / 10_000`. Exact for every genesis constant.
pub fn allocation(bps: Amount) -> Amount {
    MAX_SUPPLY / BPS_DENOMINATOR * bps
}

impl ScratchToken {
    /// Deploys with the reference configuration.
    pub fn deploy(
        params: &DeployParams,
        router: &mut dyn LiquidityRouter,
        deployed_at: DateTime<Utc>,
    ) -> Result<Deployment, TokenError> {
        let config = TokenConfig::reference(params.dev_wallet, params.ops_wallet, params.archa_wallet);
        Self::deploy_with_config(params, config, router, deployed_at)
    }

    /// Deploys with an explicit configuration. Its fee wallets take
    /// precedence over the ones in `params`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidAddress`] for zero accounts and
    /// [`TokenError::Config`] for an invalid configuration.
    pub fn deploy_with_config(
        params: &DeployParams,
        config: TokenConfig,
        router: &mut dyn LiquidityRouter,
        deployed_at: DateTime<Utc>,
    ) -> Result<Deployment, TokenError> {
        params.validate()?;
        let owner = params.owner;
        let mut token = ScratchToken::new(owner, config, router)?;
        token.fee_exempt.insert(params.exchange_wallet);

        token.mint(owner, MAX_SUPPLY)?;
        token.burn(owner, allocation(GENESIS_BURN_BPS))?;
        token.transfer(router, owner, params.dev_wallet, allocation(DEV_ALLOCATION_BPS))?;
        token.transfer(router, owner, params.exchange_wallet, allocation(EXCHANGE_ALLOCATION_BPS))?;

        let mut timelocks = Vec::with_capacity(FOUNDER_COUNT);
        for (founder, bps) in params.founders.iter().zip(FOUNDER_ALLOCATIONS_BPS) {
            let timelock = FoundersTimelock::new(
                token.address(),
                *founder,
                deployed_at,
                FOUNDER_CLIFF_SECS,
                FOUNDER_VESTING_PERIOD_SECS,
                FOUNDER_VESTING_PERIODS,
            )?;
            token.fee_exempt.insert(timelock.address());
            token.founders_timelocks.push(FounderTimelockEntry {
                founder: *founder,
                timelock: timelock.address(),
            });
            token.transfer(router, owner, timelock.address(), allocation(bps))?;
            timelocks.push(timelock);
        }

        info!(
            token = %token.address(),
            total_supply = token.total_supply(),
            owner_balance = token.balance_of(owner),
            "genesis complete"
        );
        Ok(Deployment { token, timelocks })
    }
}
