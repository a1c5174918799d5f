//! # Fee Accumulator
//!
//! Running per-category balances of fee tokens the ledger holds but has not
//! yet converted to the base asset. Only dev, ops and liquidity fees pass
//! through here: archa fees are paid out in tokens immediately and burn fees
//! are destroyed.
//!
//! The transfer path only ever adds; the conversion pass only ever
//! subtracts what it actually consumed.

use serde::{Deserialize, Serialize};

use crate::fees::FeeBreakdown;
use crate::Amount;

/// Pending (unconverted) fee tokens per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeAccumulator {
    dev: Amount,
    ops: Amount,
    liquidity: Amount,
}

impl FeeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dev(&self) -> Amount {
        self.dev
    }

    pub fn ops(&self) -> Amount {
        self.ops
    }

    pub fn liquidity(&self) -> Amount {
        self.liquidity
    }

    /// Sum of all pending categories.
    pub fn total(&self) -> Amount {
        self.dev + self.ops + self.liquidity
    }

    /// Credits the retained components of a fee breakdown.
    ///
    /// Saturates rather than failing: every pending token is also part of
    /// the ledger's own balance, which is bounded by total supply.
    pub fn credit(&mut self, fees: &FeeBreakdown) {
        self.dev = self.dev.saturating_add(fees.dev);
        self.ops = self.ops.saturating_add(fees.ops);
        self.liquidity = self.liquidity.saturating_add(fees.liquidity);
    }

    /// Removes amounts consumed by a conversion pass.
    pub fn consume(&mut self, dev: Amount, ops: Amount, liquidity: Amount) {
        self.dev = self.dev.saturating_sub(dev);
        self.ops = self.ops.saturating_sub(ops);
        self.liquidity = self.liquidity.saturating_sub(liquidity);
    }

    /// Returns `true` when every category is below `minimum`.
    pub fn all_below(&self, minimum: Amount) -> bool {
        self.dev < minimum && self.ops < minimum && self.liquidity < minimum
    }
}
