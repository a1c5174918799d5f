//! # Token Configuration & Constants
//!
//! Every number that shapes the token lives here: supply, genesis
//! distribution, founder vesting terms and the reference fee schedule.
//! The genesis and vesting constants are fixed for the life of a
//! deployment. Fee toggles, wallets and the guard switch are
//! owner-mutable through the ledger's setters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::fees::{FeeRates, FeeSchedule, FeeToggles};
use crate::stability::StabilityConfig;
use crate::swap::SwapSettings;
use crate::Amount;

// ---------------------------------------------------------------------------
// Token metadata
// ---------------------------------------------------------------------------

pub const TOKEN_NAME: &str = "ScratchToken";

pub const TOKEN_SYMBOL: &str = "SCRATCH";

/// Fractional decimal places of the smallest unit.
pub const TOKEN_DECIMALS: u8 = 9;

/// One whole token in smallest units.
pub const UNIT: Amount = 1_000_000_000;

/// 100 quadrillion whole tokens, 10^26 smallest units.
pub const MAX_SUPPLY: Amount = 100_000_000_000_000_000 * UNIT;

// ---------------------------------------------------------------------------
// Genesis distribution (basis points of MAX_SUPPLY)
// ---------------------------------------------------------------------------

pub const BPS_DENOMINATOR: Amount = 10_000;

/// Burned immediately after minting.
pub const GENESIS_BURN_BPS: Amount = 1_500;

/// Sent to the dev wallet.
pub const DEV_ALLOCATION_BPS: Amount = 500;

/// Sent to the exchange (listing) wallet.
pub const EXCHANGE_ALLOCATION_BPS: Amount = 500;

/// Locked in one timelock per founder, in founder order.
pub const FOUNDER_ALLOCATIONS_BPS: [Amount; 5] = [250, 250, 125, 250, 175];

// ---------------------------------------------------------------------------
// Founder vesting
// ---------------------------------------------------------------------------

/// Cliff before the first release: six 30-day months.
pub const FOUNDER_CLIFF_SECS: u64 = 6 * 30 * 24 * 60 * 60;

/// Length of one vesting period: 30 days.
pub const FOUNDER_VESTING_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// Number of equal periods after the cliff.
pub const FOUNDER_VESTING_PERIODS: u32 = 10;

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Reference rates (percent) for buys, peer transfers and ordinary sells.
pub const DEFAULT_FEE_RATES: FeeRates = FeeRates {
    dev: 2,
    ops: 2,
    archa: 1,
    liquidity: 2,
    burn: 2,
};

/// Rates for a sell the Stability Guard flags as large. Dev, ops, archa
/// and liquidity are unchanged; burn gains a flat 5 points.
pub const LARGE_SELL_FEE_RATES: FeeRates = FeeRates {
    dev: 2,
    ops: 2,
    archa: 1,
    liquidity: 2,
    burn: 7,
};

/// A sell above this share of the pool's token reserve is large.
pub const LARGE_SELL_THRESHOLD_PERCENT: u8 = 3;

/// Minimum pending amount in at least one category before a conversion
/// pass runs: 0.05% of max supply.
pub const DEFAULT_SWAP_THRESHOLD: Amount = MAX_SUPPLY / 2_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration that would break ledger invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A fee schedule's rates add up to more than 100%.
    #[error("{schedule} fee rates total {total}%, must not exceed 100%")]
    RatesExceedWhole {
        /// Which schedule failed ("normal" or "large sell").
        schedule: &'static str,
        /// The offending total.
        total: u32,
    },

    /// The guard threshold must be a real percentage.
    #[error("stability threshold {0}% must be between 1 and 100")]
    InvalidThreshold(u8),

    /// A wallet was left as the zero address.
    #[error("{0} wallet must not be the zero address")]
    ZeroWallet(&'static str),

    /// Vesting terms that cannot produce a release schedule.
    #[error("invalid vesting schedule: {0}")]
    InvalidSchedule(&'static str),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Destination wallets for fee proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeWallets {
    /// Receives the dev share of converted proceeds.
    pub dev: Address,
    /// Receives the ops share of converted proceeds.
    pub ops: Address,
    /// Receives archa fees in tokens.
    pub archa: Address,
    /// Receives liquidity proceeds when swap-and-liquify is off. When unset,
    /// those proceeds stay with the ledger contract.
    pub liquidity: Option<Address>,
}

/// Everything owner-governed about the ledger's fee behavior, injected at
/// deployment and only mutated through the ledger's owner setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub fees: FeeSchedule,
    pub wallets: FeeWallets,
    pub stability: StabilityConfig,
    pub swap: SwapSettings,
}

impl TokenConfig {
    /// The reference configuration: every fee on, guard on,
    /// swap-and-liquify on, no liquidity wallet.
    pub fn reference(dev: Address, ops: Address, archa: Address) -> Self {
        Self {
            fees: FeeSchedule {
                rates: DEFAULT_FEE_RATES,
                large_sell_rates: LARGE_SELL_FEE_RATES,
                enabled: FeeToggles::ALL_ON,
            },
            wallets: FeeWallets {
                dev,
                ops,
                archa,
                liquidity: None,
            },
            stability: StabilityConfig::default(),
            swap: SwapSettings::default(),
        }
    }

    /// Checks the invariants the transfer path relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either schedule totals more than 100%, the
    /// guard threshold is out of range, or a fee wallet is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let normal = self.fees.rates.total();
        if normal > 100 {
            return Err(ConfigError::RatesExceedWhole {
                schedule: "normal",
                total: normal,
            });
        }
        let large = self.fees.large_sell_rates.total();
        if large > 100 {
            return Err(ConfigError::RatesExceedWhole {
                schedule: "large sell",
                total: large,
            });
        }
        let threshold = self.stability.threshold_percent;
        if threshold == 0 || threshold > 100 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.wallets.dev.is_zero() {
            return Err(ConfigError::ZeroWallet("dev"));
        }
        if self.wallets.ops.is_zero() {
            return Err(ConfigError::ZeroWallet("ops"));
        }
        if self.wallets.archa.is_zero() {
            return Err(ConfigError::ZeroWallet("archa"));
        }
        Ok(())
    }
}
