//! # Swap-and-Convert Manager
//!
//! Converts accumulated dev, ops and liquidity fee tokens into the pool's
//! base asset and distributes the proceeds:
//!
//! - dev and ops shares are paid to their wallets in base asset;
//! - with swap-and-liquify on, half of the liquidity tokens are swapped and
//!   the other half re-enter the pool as fresh liquidity with the matching
//!   base share;
//! - with swap-and-liquify off, all liquidity tokens are swapped and the
//!   proceeds go to the liquidity wallet, or stay with the ledger when no
//!   wallet is configured.
//!
//! ## Re-entrancy
//!
//! The swap makes the router call back into the ledger's transfer path. A
//! [`SwapLock`] is taken before the first external call and released by
//! [`SwapGuard`]'s `Drop` on every exit path. While it is held, nested
//! transfers never start another conversion.
//!
//! A failed swap is swallowed: the ledger's books and event log are
//! restored and the pending amounts wait for a later sell to retry.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::accumulator::FeeAccumulator;
use crate::address::Address;
use crate::config::DEFAULT_SWAP_THRESHOLD;
use crate::events::TokenEvent;
use crate::math::mul_div;
use crate::router::{LiquidityRouter, RouterError};
use crate::token::ScratchToken;
use crate::Amount;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Owner-governed conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSettings {
    /// Pair half the liquidity fee back into the pool instead of paying it out.
    pub swap_and_liquify_enabled: bool,
    /// A pass runs only once some category has at least this many tokens pending.
    pub threshold: Amount,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            swap_and_liquify_enabled: true,
            threshold: DEFAULT_SWAP_THRESHOLD,
        }
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// The "conversion in progress" flag.
#[derive(Debug, Default)]
pub struct SwapLock {
    in_progress: Rc<Cell<bool>>,
}

impl SwapLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a conversion pass is running.
    pub fn is_held(&self) -> bool {
        self.in_progress.get()
    }

    /// Takes the lock, or returns `None` if a pass is already running.
    pub fn try_acquire(&self) -> Option<SwapGuard> {
        if self.in_progress.replace(true) {
            return None;
        }
        Some(SwapGuard {
            in_progress: Rc::clone(&self.in_progress),
        })
    }
}

/// Holds the [`SwapLock`] until dropped.
#[derive(Debug)]
pub struct SwapGuard {
    in_progress: Rc<Cell<bool>>,
}

impl Drop for SwapGuard {
    fn drop(&mut self) {
        self.in_progress.set(false);
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Token amounts one conversion pass will consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPlan {
    pub dev: Amount,
    pub ops: Amount,
    /// Liquidity tokens sold for base asset.
    pub liquidity_to_swap: Amount,
    /// Liquidity tokens kept back to pair with base asset.
    pub liquidity_to_pair: Amount,
}

impl ConversionPlan {
    /// Plans a pass over the pending amounts, or returns `None` when every
    /// category is below the threshold or there is nothing to sell.
    pub fn from_pending(pending: &FeeAccumulator, settings: &SwapSettings) -> Option<Self> {
        if pending.all_below(settings.threshold) {
            return None;
        }
        let (liquidity_to_swap, liquidity_to_pair) = if settings.swap_and_liquify_enabled {
            let half = pending.liquidity() / 2;
            (pending.liquidity() - half, half)
        } else {
            (pending.liquidity(), 0)
        };
        let plan = Self {
            dev: pending.dev(),
            ops: pending.ops(),
            liquidity_to_swap,
            liquidity_to_pair,
        };
        (plan.tokens_to_swap() > 0).then_some(plan)
    }

    /// Tokens sold to the pool in one swap.
    pub fn tokens_to_swap(&self) -> Amount {
        self.dev + self.ops + self.liquidity_to_swap
    }

    /// Tokens the router may pull during the pass.
    pub fn tokens_to_approve(&self) -> Amount {
        self.tokens_to_swap() + self.liquidity_to_pair
    }

    /// Splits `base_received` pro rata to the tokens each category sold.
    /// Rounding dust lands in the liquidity share.
    pub fn split(&self, base_received: Amount) -> Option<ProceedsSplit> {
        let sold = self.tokens_to_swap();
        let dev = mul_div(base_received, self.dev, sold)?;
        let ops = mul_div(base_received, self.ops, sold)?;
        let liquidity = base_received.checked_sub(dev)?.checked_sub(ops)?;
        Some(ProceedsSplit { dev, ops, liquidity })
    }
}

/// Base-asset proceeds per destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProceedsSplit {
    pub dev: Amount,
    pub ops: Amount,
    pub liquidity: Amount,
}

/// What a completed pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub tokens_swapped: Amount,
    pub base_received: Amount,
    pub proceeds: ProceedsSplit,
    pub tokens_into_liquidity: Amount,
    pub base_into_liquidity: Amount,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

impl ScratchToken {
    /// Runs a conversion pass if none is in progress and enough fees are
    /// pending. Never fails: a failed swap is logged, recorded as a
    /// [`TokenEvent::ConversionFailed`] and leaves the accumulators intact.
    pub(crate) fn maybe_convert(
        &mut self,
        router: &mut dyn LiquidityRouter,
    ) -> Option<ConversionOutcome> {
        if self.swap_lock.is_held() {
            debug!("conversion already in progress, skipping");
            return None;
        }
        let plan = ConversionPlan::from_pending(&self.books.pending, &self.config.swap)?;
        let _guard = self.swap_lock.try_acquire()?;

        let checkpoint = self.books.clone();
        let event_mark = self.events.len();
        match self.execute_conversion(router, &plan) {
            Ok(outcome) => {
                info!(
                    tokens_swapped = outcome.tokens_swapped,
                    base_received = outcome.base_received,
                    tokens_into_liquidity = outcome.tokens_into_liquidity,
                    "fee conversion completed"
                );
                self.emit(TokenEvent::SwapAndLiquify {
                    tokens_swapped: outcome.tokens_swapped,
                    base_received: outcome.base_received,
                    tokens_into_liquidity: outcome.tokens_into_liquidity,
                    base_into_liquidity: outcome.base_into_liquidity,
                });
                Some(outcome)
            }
            Err(err) => {
                self.books = checkpoint;
                self.events.truncate(event_mark);
                warn!(error = %err, "fee conversion failed, pending fees kept");
                self.emit(TokenEvent::ConversionFailed {
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Only the swap itself can fail the pass. Later steps (payouts,
    /// liquidity) degrade to keeping the base asset or tokens on the ledger.
    fn execute_conversion(
        &mut self,
        router: &mut dyn LiquidityRouter,
        plan: &ConversionPlan,
    ) -> Result<ConversionOutcome, RouterError> {
        let contract = self.address;
        let router_address = router.address();

        self.books
            .set_allowance(contract, router_address, plan.tokens_to_approve());

        let base_received =
            router.swap_exact_tokens_for_base(self, contract, plan.tokens_to_swap(), contract)?;
        self.books
            .pending
            .consume(plan.dev, plan.ops, plan.liquidity_to_swap);

        let proceeds = plan.split(base_received).ok_or(RouterError::Overflow)?;
        let wallets = self.config.wallets;
        self.pay_base(router, wallets.dev, proceeds.dev, "dev");
        self.pay_base(router, wallets.ops, proceeds.ops, "ops");

        let mut outcome = ConversionOutcome {
            tokens_swapped: plan.tokens_to_swap(),
            base_received,
            proceeds,
            ..ConversionOutcome::default()
        };

        if self.config.swap.swap_and_liquify_enabled {
            if plan.liquidity_to_pair > 0 && proceeds.liquidity > 0 {
                let lp_to = self.owner.unwrap_or(contract);
                match router.add_liquidity(
                    self,
                    contract,
                    plan.liquidity_to_pair,
                    proceeds.liquidity,
                    lp_to,
                ) {
                    Ok(added) => {
                        self.books.pending.consume(0, 0, added.token_amount);
                        outcome.tokens_into_liquidity = added.token_amount;
                        outcome.base_into_liquidity = added.base_amount;
                    }
                    Err(err) => {
                        warn!(error = %err, "liquidity add failed, tokens stay pending");
                    }
                }
            }
        } else if let Some(wallet) = wallets.liquidity {
            self.pay_base(router, wallet, proceeds.liquidity, "liquidity");
        }

        self.books.set_allowance(contract, router_address, 0);
        Ok(outcome)
    }

    fn pay_base(
        &mut self,
        router: &mut dyn LiquidityRouter,
        to: Address,
        amount: Amount,
        label: &'static str,
    ) {
        if amount == 0 {
            return;
        }
        if let Err(err) = router.transfer_base(self.address, to, amount) {
            warn!(wallet = label, error = %err, "base payout failed, proceeds stay with ledger");
        }
    }
}
