//! # Fee Policy
//!
//! Pure fee computation for non-exempt transfers. Given the transfer's
//! direction, its gross amount and whether the Stability Guard flagged it as
//! a large sell, the policy returns one amount per fee category.
//!
//! Every enabled category contributes `amount * rate / 100` with truncating
//! integer division, always on the gross amount. Fees never compound on one
//! another within a single transfer, and the rounding remainder stays with
//! the recipient.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Amount;

/// Denominator for fee rates. Rates are whole percentages.
pub const PERCENT_DENOMINATOR: u128 = 100;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by fee computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// `amount * rate` overflowed.
    #[error("fee overflow computing {category} fee on {amount}")]
    Overflow {
        /// Category whose computation overflowed.
        category: FeeCategory,
        /// Gross amount of the transfer.
        amount: Amount,
    },

    /// The summed fees exceed the gross amount. Only reachable with a
    /// schedule that failed validation.
    #[error("fees {total} exceed transfer amount {amount}")]
    ExceedsAmount {
        /// Total of all fee components.
        total: Amount,
        /// Gross amount of the transfer.
        amount: Amount,
    },
}

// ---------------------------------------------------------------------------
// Categories & schedules
// ---------------------------------------------------------------------------

/// The named fee categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    /// Converted to base asset and paid to the dev wallet.
    Dev,
    /// Converted to base asset and paid to the ops wallet.
    Ops,
    /// Paid in tokens straight to the archa/community wallet.
    Archa,
    /// Converted and re-added as pool liquidity (or paid to the liquidity wallet).
    Liquidity,
    /// Destroyed on the spot.
    Burn,
}

impl FeeCategory {
    /// All categories, in accounting order.
    pub const ALL: [FeeCategory; 5] = [
        FeeCategory::Dev,
        FeeCategory::Ops,
        FeeCategory::Archa,
        FeeCategory::Liquidity,
        FeeCategory::Burn,
    ];
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeCategory::Dev => write!(f, "dev"),
            FeeCategory::Ops => write!(f, "ops"),
            FeeCategory::Archa => write!(f, "archa"),
            FeeCategory::Liquidity => write!(f, "liquidity"),
            FeeCategory::Burn => write!(f, "burn"),
        }
    }
}

/// Per-category rates, in whole percent of the gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub dev: u8,
    pub ops: u8,
    pub archa: u8,
    pub liquidity: u8,
    pub burn: u8,
}

impl FeeRates {
    /// Returns the rate for one category.
    pub fn rate(&self, category: FeeCategory) -> u8 {
        match category {
            FeeCategory::Dev => self.dev,
            FeeCategory::Ops => self.ops,
            FeeCategory::Archa => self.archa,
            FeeCategory::Liquidity => self.liquidity,
            FeeCategory::Burn => self.burn,
        }
    }

    /// Sum of all rates, in percent.
    pub fn total(&self) -> u32 {
        FeeCategory::ALL
            .iter()
            .map(|c| u32::from(self.rate(*c)))
            .sum()
    }
}

/// Per-category on/off switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeToggles {
    pub dev: bool,
    pub ops: bool,
    pub archa: bool,
    pub liquidity: bool,
    pub burn: bool,
}

impl FeeToggles {
    /// Everything switched on.
    pub const ALL_ON: FeeToggles = FeeToggles {
        dev: true,
        ops: true,
        archa: true,
        liquidity: true,
        burn: true,
    };

    pub fn is_enabled(&self, category: FeeCategory) -> bool {
        match category {
            FeeCategory::Dev => self.dev,
            FeeCategory::Ops => self.ops,
            FeeCategory::Archa => self.archa,
            FeeCategory::Liquidity => self.liquidity,
            FeeCategory::Burn => self.burn,
        }
    }

    pub fn set(&mut self, category: FeeCategory, enabled: bool) {
        match category {
            FeeCategory::Dev => self.dev = enabled,
            FeeCategory::Ops => self.ops = enabled,
            FeeCategory::Archa => self.archa = enabled,
            FeeCategory::Liquidity => self.liquidity = enabled,
            FeeCategory::Burn => self.burn = enabled,
        }
    }
}

/// The full fee schedule: normal rates, large-sell rates and the toggles
/// that apply to both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Rates for buys, peer transfers and ordinary sells.
    pub rates: FeeRates,
    /// Rates substituted when the Stability Guard flags a large sell.
    pub large_sell_rates: FeeRates,
    /// Which categories are currently collected.
    pub enabled: FeeToggles,
}

// ---------------------------------------------------------------------------
// Transfer classification
// ---------------------------------------------------------------------------

/// How a transfer is treated by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// One side is fee-exempt (or the ledger is moving its own fee tokens
    /// during a conversion). No fees.
    Exempt,
    /// Sender is the pool pair.
    Buy,
    /// Recipient is the pool pair.
    Sell,
    /// Neither side is the pool pair.
    Peer,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Exempt => write!(f, "exempt"),
            TransferKind::Buy => write!(f, "buy"),
            TransferKind::Sell => write!(f, "sell"),
            TransferKind::Peer => write!(f, "peer"),
        }
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Fee amounts deducted from one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub dev: Amount,
    pub ops: Amount,
    pub archa: Amount,
    pub liquidity: Amount,
    pub burn: Amount,
}

impl FeeBreakdown {
    pub fn amount(&self, category: FeeCategory) -> Amount {
        match category {
            FeeCategory::Dev => self.dev,
            FeeCategory::Ops => self.ops,
            FeeCategory::Archa => self.archa,
            FeeCategory::Liquidity => self.liquidity,
            FeeCategory::Burn => self.burn,
        }
    }

    fn set(&mut self, category: FeeCategory, amount: Amount) {
        match category {
            FeeCategory::Dev => self.dev = amount,
            FeeCategory::Ops => self.ops = amount,
            FeeCategory::Archa => self.archa = amount,
            FeeCategory::Liquidity => self.liquidity = amount,
            FeeCategory::Burn => self.burn = amount,
        }
    }

    /// Tokens the ledger keeps for later conversion (dev + ops + liquidity).
    pub fn retained(&self) -> Amount {
        self.dev + self.ops + self.liquidity
    }

    /// Sum of every component.
    pub fn total(&self) -> Amount {
        self.retained() + self.archa + self.burn
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Computes fee breakdowns against a borrowed schedule.
#[derive(Debug, Clone, Copy)]
pub struct FeePolicy<'a> {
    schedule: &'a FeeSchedule,
}

impl<'a> FeePolicy<'a> {
    pub fn new(schedule: &'a FeeSchedule) -> Self {
        Self { schedule }
    }

    /// Computes the fees for a transfer of `amount`.
    ///
    /// Exempt transfers always yield a zero breakdown. `large_sell` is only
    /// honored for [`TransferKind::Sell`]; buys never escalate.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::Overflow`] if `amount * rate` overflows and
    /// [`FeeError::ExceedsAmount`] if the fees would exceed `amount`.
    pub fn compute(
        &self,
        kind: TransferKind,
        amount: Amount,
        large_sell: bool,
    ) -> Result<FeeBreakdown, FeeError> {
        let mut breakdown = FeeBreakdown::default();
        if kind == TransferKind::Exempt {
            return Ok(breakdown);
        }

        let rates = if kind == TransferKind::Sell && large_sell {
            &self.schedule.large_sell_rates
        } else {
            &self.schedule.rates
        };

        for category in FeeCategory::ALL {
            if !self.schedule.enabled.is_enabled(category) {
                continue;
            }
            let fee = amount
                .checked_mul(u128::from(rates.rate(category)))
                .ok_or(FeeError::Overflow { category, amount })?
                / PERCENT_DENOMINATOR;
            breakdown.set(category, fee);
        }

        let total = breakdown.total();
        if total > amount {
            return Err(FeeError::ExceedsAmount { total, amount });
        }
        Ok(breakdown)
    }
}
