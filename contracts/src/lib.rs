//! # Scratch Token Contracts
//!
//! Ledger logic for the SCRATCH token and its founder vesting locks:
//!
//! - **Token ledger** — balances, allowances and supply, with a fee-bearing
//!   transfer path that classifies buys, sells and peer transfers.
//! - **Fee policy** — dev, ops, archa, liquidity and burn fees, each
//!   toggleable, with an escalated schedule for large sells.
//! - **Stability guard** — flags sells that are large relative to pool depth.
//! - **Swap-and-convert** — turns accumulated fee tokens into the pool's
//!   base asset, pays the dev and ops wallets and re-adds liquidity.
//! - **Founders timelock** — cliff-plus-linear release of founder
//!   allocations.
//! - **Genesis** — mints, burns and distributes the initial supply.
//!
//! The liquidity venue is abstracted behind [`router::LiquidityRouter`];
//! [`pool::SimulatedPool`] is an in-memory constant-product implementation.
//!
//! ## Design Principles
//!
//! 1. Amounts are `u128` smallest units. Sums use checked or saturating
//!    arithmetic and products of two amounts go through a 256-bit
//!    intermediate.
//! 2. Every entry point validates before it mutates, so errors leave state
//!    untouched.
//! 3. Callers are passed explicitly. Owner-only operations share one
//!    authorization predicate.
//! 4. Every public record is serializable (serde) for snapshots and logs.

pub mod accumulator;
pub mod address;
pub mod config;
pub mod events;
pub mod fees;
pub mod genesis;
pub mod math;
pub mod pool;
pub mod router;
pub mod stability;
pub mod swap;
pub mod timelock;
pub mod token;

/// Token amount in smallest units (10^-9 SCRATCH).
pub type Amount = u128;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use accumulator::FeeAccumulator;
pub use address::{Address, AddressError};
pub use config::{ConfigError, FeeWallets, TokenConfig};
pub use events::TokenEvent;
pub use fees::{FeeBreakdown, FeeCategory, FeeError, FeePolicy, FeeRates, FeeSchedule, FeeToggles, TransferKind};
pub use genesis::{DeployParams, Deployment};
pub use pool::SimulatedPool;
pub use router::{LiquidityAdded, LiquidityRouter, PoolReserves, PoolToken, RouterError};
pub use stability::{StabilityConfig, StabilityGuard};
pub use swap::{ConversionOutcome, ConversionPlan, ProceedsSplit, SwapSettings};
pub use timelock::{FoundersTimelock, ScheduledRelease, VestingError, VestingStatus, VestingToken};
pub use token::{LedgerSnapshot, ScratchToken, TokenError, TokenHandle, TransferReceipt};
