//! Ledger events.
//!
//! The ledger appends one [`TokenEvent`] per observable state change. Events
//! are serializable so the CLI and tests can inspect the log as JSON.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::fees::{FeeBreakdown, FeeCategory, TransferKind};
use crate::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Tokens moved. `from` is zero for mints, `to` is zero for burns.
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    /// An allowance was set.
    Approval {
        owner: Address,
        spender: Address,
        value: Amount,
    },
    /// Fees were deducted from a non-exempt transfer.
    FeesCollected {
        from: Address,
        kind: TransferKind,
        large_sell: bool,
        fees: FeeBreakdown,
    },
    /// A conversion pass completed.
    SwapAndLiquify {
        tokens_swapped: Amount,
        base_received: Amount,
        tokens_into_liquidity: Amount,
        base_into_liquidity: Amount,
    },
    /// A conversion pass failed and was rolled back.
    ConversionFailed { reason: String },
    OwnershipTransferred {
        previous: Option<Address>,
        new: Option<Address>,
    },
    FeeToggled {
        category: FeeCategory,
        enabled: bool,
    },
    SwapAndLiquifyToggled { enabled: bool },
    StabilityGuardToggled { enabled: bool },
    SwapThresholdUpdated { threshold: Amount },
    ArchaWalletUpdated { wallet: Address },
    LiquidityWalletUpdated { wallet: Option<Address> },
    FeeExemptionUpdated { account: Address, exempt: bool },
}
