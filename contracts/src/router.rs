//! # External Router Interface
//!
//! The automated market maker is an external collaborator. The ledger only
//! relies on the narrow surface below and never on the venue's internal
//! accounting.
//!
//! Control flows both ways. The ledger calls the router to swap its fee
//! tokens, and the router moves tokens by calling back into the ledger
//! through [`PoolToken`]. That callback is where re-entrancy happens, so
//! every router method that moves tokens takes the token as an argument.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::token::{TokenError, TransferReceipt};
use crate::Amount;

/// Errors reported by a router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The pool has no liquidity on one side.
    #[error("insufficient liquidity: token reserve {token}, base reserve {base}")]
    InsufficientLiquidity {
        token: Amount,
        base: Amount,
    },

    /// The trade would produce nothing.
    #[error("insufficient output amount")]
    InsufficientOutput,

    /// A base-asset account could not cover a debit.
    #[error("insufficient base balance: available {available}, requested {requested}")]
    InsufficientBase {
        available: Amount,
        requested: Amount,
    },

    /// No pair has been created for the token.
    #[error("pair not created for token {0}")]
    PairMissing(Address),

    /// The token rejected a transfer the router requested.
    #[error("token transfer failed: {0}")]
    Token(String),

    /// Arithmetic overflow inside the venue.
    #[error("router arithmetic overflow")]
    Overflow,
}

impl From<TokenError> for RouterError {
    fn from(err: TokenError) -> Self {
        RouterError::Token(err.to_string())
    }
}

/// Snapshot of the pair's reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolReserves {
    pub token: Amount,
    pub base: Amount,
}

/// Result of an `add_liquidity` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityAdded {
    /// Tokens actually deposited.
    pub token_amount: Amount,
    /// Base asset actually deposited.
    pub base_amount: Amount,
    /// LP shares minted to the recipient.
    pub liquidity: Amount,
}

/// The token-side surface a router needs. Implemented by the ledger.
pub trait PoolToken {
    /// The token contract's address.
    fn token_address(&self) -> Address;

    /// Current balance of `account`.
    fn balance_of(&self, account: Address) -> Amount;

    /// Transfers `amount` from `caller` to `to`, running the full transfer
    /// path (classification, fees, conversion).
    fn transfer(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError>;

    /// Allowance-gated transfer on behalf of `from`, spent by `caller`.
    fn transfer_from(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError>;
}

/// The AMM surface the ledger consumes.
pub trait LiquidityRouter {
    /// The router's own address. Routers are fee-exempt by convention.
    fn address(&self) -> Address;

    /// Creates (or returns the existing) pair for `token` against the base
    /// asset and returns the pair's address.
    fn create_pair(&mut self, token: Address) -> Address;

    /// Current reserves of the pair.
    fn reserves(&self) -> PoolReserves;

    /// Sells exactly `amount_in` tokens held by `from` for base asset sent
    /// to `to`. The router pulls the tokens with `transfer_from`, so `from`
    /// must have approved it. Returns the base amount paid out.
    fn swap_exact_tokens_for_base(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        amount_in: Amount,
        to: Address,
    ) -> Result<Amount, RouterError>;

    /// Buys tokens with exactly `base_in` of `from`'s base asset, delivered
    /// to `to`. Returns the tokens `to` actually received.
    fn swap_exact_base_for_tokens(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        base_in: Amount,
        to: Address,
    ) -> Result<Amount, RouterError>;

    /// Deposits up to `token_desired` tokens and `base_desired` base asset
    /// from `from` at the current pool ratio, minting LP shares to `lp_to`.
    fn add_liquidity(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        token_desired: Amount,
        base_desired: Amount,
        lp_to: Address,
    ) -> Result<LiquidityAdded, RouterError>;

    /// Moves base asset between accounts.
    fn transfer_base(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), RouterError>;

    /// Base-asset balance of `account`.
    fn base_balance_of(&self, account: Address) -> Amount;
}
