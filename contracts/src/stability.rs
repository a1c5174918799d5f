//! # Stability Guard
//!
//! Flags sells that are large relative to the pool's depth. A sell whose
//! gross amount exceeds a fixed percentage of the pool's current token-side
//! reserve is a "large sell" and pays the escalated fee schedule. Buys and
//! peer transfers are never inspected.

use serde::{Deserialize, Serialize};

use crate::config::LARGE_SELL_THRESHOLD_PERCENT;
use crate::fees::TransferKind;
use crate::math::exceeds_percent;
use crate::Amount;

/// Stability Guard settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Owner-toggleable. When off, every sell pays the normal schedule.
    pub enabled: bool,
    /// A sell above this percentage of the token reserve is large.
    pub threshold_percent: u8,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_percent: LARGE_SELL_THRESHOLD_PERCENT,
        }
    }
}

/// Read-only view over a [`StabilityConfig`].
#[derive(Debug, Clone, Copy)]
pub struct StabilityGuard<'a> {
    config: &'a StabilityConfig,
}

impl<'a> StabilityGuard<'a> {
    pub fn new(config: &'a StabilityConfig) -> Self {
        Self { config }
    }

    /// Returns `true` if a transfer of `amount` in direction `kind` should
    /// pay the escalated schedule, given the pool's token reserve.
    ///
    /// An empty pool carries no depth information, so nothing is large
    /// against it.
    pub fn is_large_sell(&self, kind: TransferKind, amount: Amount, token_reserve: Amount) -> bool {
        if !self.config.enabled || kind != TransferKind::Sell || token_reserve == 0 {
            return false;
        }
        exceeds_percent(amount, token_reserve, self.config.threshold_percent)
    }
}
