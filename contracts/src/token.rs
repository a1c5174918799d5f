//! # Scratch Token Ledger
//!
//! Fungible-token bookkeeping (balances, allowances, total supply) plus the
//! fee-bearing transfer path:
//!
//! 1. **Classify** — exempt, buy (sender is the pair), sell (recipient is
//!    the pair) or peer.
//! 2. **Guard** — sells are checked against the pool's token reserve; a
//!    large sell pays the escalated schedule.
//! 3. **Fee** — the [`FeePolicy`] computes one amount per category on the
//!    gross amount.
//! 4. **Commit** — sender debited, recipient credited with the net, dev/ops/
//!    liquidity fees retained by the ledger and accumulated, archa fee paid
//!    to its wallet, burn fee destroyed.
//! 5. **Convert** — after a sell, the Swap-and-Convert Manager may run a
//!    conversion pass through the router.
//!
//! ## Atomicity
//!
//! Every entry point validates before it mutates, so a failing call leaves
//! no trace. All of a transfer's bookkeeping is committed before the
//! conversion pass makes its external calls.
//!
//! ## Authorization
//!
//! Callers are passed explicitly. Owner-only setters go through a single
//! predicate, [`ScratchToken::require_owner`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::accumulator::FeeAccumulator;
use crate::address::Address;
use crate::config::{ConfigError, TokenConfig, MAX_SUPPLY, TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL};
use crate::events::TokenEvent;
use crate::fees::{FeeBreakdown, FeeCategory, FeeError, FeePolicy, TransferKind};
use crate::router::{LiquidityRouter, PoolToken};
use crate::stability::StabilityGuard;
use crate::swap::{ConversionOutcome, SwapLock};
use crate::Amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The sender does not hold enough tokens.
    #[error("insufficient balance: {account} has {balance}, tried to move {requested}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        requested: Amount,
    },

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}'s tokens, requested {requested}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: Amount,
        requested: Amount,
    },

    /// The caller lacks the role this entry point requires.
    #[error("unauthorized: {caller} is not the {role}")]
    Unauthorized {
        caller: Address,
        role: &'static str,
    },

    /// The zero address appeared where a real account is required.
    #[error("invalid address: {0}")]
    InvalidAddress(&'static str),

    /// Minting would push total supply past the cap.
    #[error("mint of {amount} would exceed max supply")]
    ExceedsMaxSupply { amount: Amount },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("fee computation failed: {0}")]
    Fee(#[from] FeeError),

    /// Allowance arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a single transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub kind: TransferKind,
    /// Debited from the sender.
    pub sent: Amount,
    /// Credited to the recipient.
    pub received: Amount,
    pub fees: FeeBreakdown,
    pub large_sell: bool,
    /// Set when this transfer triggered a completed conversion pass.
    pub conversion: Option<ConversionOutcome>,
}

/// Balances, allowances, supply and pending fees. Cloned as a checkpoint
/// around conversion passes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Books {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    pub(crate) pending: FeeAccumulator,
}

impl Books {
    fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    pub(crate) fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn debit(&mut self, account: Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.balance_of(account);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                account,
                balance,
                requested: amount,
            })?;
        self.balances.insert(account, remaining);
        Ok(())
    }

    // Every credited token was debited elsewhere or minted under the cap,
    // so a balance can never exceed total supply.
    fn credit(&mut self, account: Address, amount: Amount) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

/// A founder and the timelock holding their allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FounderTimelockEntry {
    pub founder: Address,
    pub timelock: Address,
}

/// Serializable view of the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub address: Address,
    pub owner: Option<Address>,
    pub pair: Address,
    pub router: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub max_supply: Amount,
    pub total_supply: Amount,
    /// Non-zero balances only.
    pub balances: BTreeMap<Address, Amount>,
    pub pending: FeeAccumulator,
    pub config: TokenConfig,
    pub fee_exempt: BTreeSet<Address>,
    pub founders_timelocks: Vec<FounderTimelockEntry>,
}

impl LedgerSnapshot {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The fee-bearing token ledger.
///
/// Not `Clone`: the re-entrancy flag is shared with outstanding guards and
/// must not be duplicated.
#[derive(Debug)]
pub struct ScratchToken {
    pub(crate) address: Address,
    pub(crate) owner: Option<Address>,
    pub(crate) router: Address,
    pub(crate) pair: Address,
    pub(crate) books: Books,
    pub(crate) config: TokenConfig,
    pub(crate) fee_exempt: HashSet<Address>,
    pub(crate) founders_timelocks: Vec<FounderTimelockEntry>,
    pub(crate) swap_lock: SwapLock,
    pub(crate) events: Vec<TokenEvent>,
}

impl ScratchToken {
    /// Creates an empty ledger owned by `owner`, resolves and caches the
    /// pool pair through `router`, and seeds the fee-exemption set with the
    /// owner, the ledger itself, the router and the fee wallets.
    ///
    /// Supply starts at zero; [`ScratchToken::deploy`] mints and distributes it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidAddress`] for a zero owner and
    /// [`TokenError::Config`] if `config` fails validation.
    pub fn new(
        owner: Address,
        config: TokenConfig,
        router: &mut dyn LiquidityRouter,
    ) -> Result<Self, TokenError> {
        if owner.is_zero() {
            return Err(TokenError::InvalidAddress("owner is the zero address"));
        }
        config.validate()?;

        let address = Address::derive(&owner, TOKEN_NAME);
        let pair = router.create_pair(address);
        let router_address = router.address();

        let fee_exempt: HashSet<Address> = [
            owner,
            address,
            router_address,
            config.wallets.dev,
            config.wallets.ops,
            config.wallets.archa,
        ]
        .into_iter()
        .collect();

        info!(token = %address, pair = %pair, owner = %owner, "ledger created");

        Ok(Self {
            address,
            owner: Some(owner),
            router: router_address,
            pair,
            books: Books::default(),
            config,
            fee_exempt,
            founders_timelocks: Vec::new(),
            swap_lock: SwapLock::new(),
            events: vec![TokenEvent::OwnershipTransferred {
                previous: None,
                new: Some(owner),
            }],
        })
    }

    // -----------------------------------------------------------------------
    // Metadata & reads
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &'static str {
        TOKEN_NAME
    }

    pub fn symbol(&self) -> &'static str {
        TOKEN_SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    pub fn max_supply(&self) -> Amount {
        MAX_SUPPLY
    }

    pub fn total_supply(&self) -> Amount {
        self.books.total_supply
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.books.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.books.allowance(owner, spender)
    }

    /// The ledger contract's own address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// `None` once ownership has been renounced.
    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// The cached pool pair address.
    pub fn pair_address(&self) -> Address {
        self.pair
    }

    pub fn router_address(&self) -> Address {
        self.router
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Pending (unconverted) fee tokens per category.
    pub fn pending_fees(&self) -> FeeAccumulator {
        self.books.pending
    }

    pub fn pending_dev_fees(&self) -> Amount {
        self.books.pending.dev()
    }

    pub fn pending_ops_fees(&self) -> Amount {
        self.books.pending.ops()
    }

    pub fn pending_liquidity_fees(&self) -> Amount {
        self.books.pending.liquidity()
    }

    /// The pool's current token-side reserve, as the Stability Guard sees it.
    pub fn pool_token_reserve(&self, router: &dyn LiquidityRouter) -> Amount {
        router.reserves().token
    }

    /// Registered founder timelocks are exempt regardless of the exemption
    /// set, so vesting releases always arrive in full.
    pub fn is_fee_exempt(&self, account: Address) -> bool {
        self.fee_exempt.contains(&account) || self.is_founders_timelock(account)
    }

    fn is_founders_timelock(&self, account: Address) -> bool {
        self.founders_timelocks.iter().any(|e| e.timelock == account)
    }

    /// `true` while a conversion pass is running.
    pub fn is_converting(&self) -> bool {
        self.swap_lock.is_held()
    }

    pub fn founders_timelocks(&self) -> &[FounderTimelockEntry] {
        &self.founders_timelocks
    }

    /// Timelock address of the founder at `index`, in deployment order.
    pub fn founders_timelock(&self, index: usize) -> Option<Address> {
        self.founders_timelocks.get(index).map(|e| e.timelock)
    }

    /// Timelock address holding `founder`'s allocation.
    pub fn timelock_of(&self, founder: Address) -> Option<Address> {
        self.founders_timelocks
            .iter()
            .find(|e| e.founder == founder)
            .map(|e| e.timelock)
    }

    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            address: self.address,
            owner: self.owner,
            pair: self.pair,
            router: self.router,
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            max_supply: MAX_SUPPLY,
            total_supply: self.books.total_supply,
            balances: self
                .books
                .balances
                .iter()
                .filter(|(_, balance)| **balance > 0)
                .map(|(account, balance)| (*account, *balance))
                .collect(),
            pending: self.books.pending,
            config: self.config,
            fee_exempt: self.fee_exempt.iter().copied().collect(),
            founders_timelocks: self.founders_timelocks.clone(),
        }
    }

    /// Binds the ledger to a router, for collaborators that only see a
    /// token (the founders timelock).
    pub fn with_router<'a>(&'a mut self, router: &'a mut dyn LiquidityRouter) -> TokenHandle<'a> {
        TokenHandle {
            token: self,
            router,
        }
    }

    // -----------------------------------------------------------------------
    // ERC-20 surface
    // -----------------------------------------------------------------------

    /// Moves `amount` from `caller` to `to` through the full transfer path.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if `caller` holds less
    /// than `amount`, and [`TokenError::InvalidAddress`] for zero endpoints.
    pub fn transfer(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        self.execute_transfer(router, caller, to, amount)
    }

    /// Spends `caller`'s allowance over `from`'s tokens.
    ///
    /// Balance and allowance are debited together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] if the allowance does
    /// not cover `amount`, plus every error [`transfer`](Self::transfer) can
    /// return.
    pub fn transfer_from(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        let current = self.books.allowance(from, caller);
        if amount > current {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender: caller,
                allowance: current,
                requested: amount,
            });
        }

        let remaining = current - amount;
        self.books.set_allowance(from, caller, remaining);
        match self.execute_transfer(router, from, to, amount) {
            Ok(receipt) => {
                self.emit(TokenEvent::Approval {
                    owner: from,
                    spender: caller,
                    value: remaining,
                });
                Ok(receipt)
            }
            Err(err) => {
                self.books.set_allowance(from, caller, current);
                Err(err)
            }
        }
    }

    /// Sets `spender`'s allowance over `caller`'s tokens.
    pub fn approve(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if caller.is_zero() {
            return Err(TokenError::InvalidAddress("approve from the zero address"));
        }
        if spender.is_zero() {
            return Err(TokenError::InvalidAddress("approve to the zero address"));
        }
        self.books.set_allowance(caller, spender, amount);
        self.emit(TokenEvent::Approval {
            owner: caller,
            spender,
            value: amount,
        });
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        added: Amount,
    ) -> Result<(), TokenError> {
        let updated = self
            .books
            .allowance(caller, spender)
            .checked_add(added)
            .ok_or(TokenError::ArithmeticOverflow)?;
        self.approve(caller, spender, updated)
    }

    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] when decreasing below zero.
    pub fn decrease_allowance(
        &mut self,
        caller: Address,
        spender: Address,
        subtracted: Amount,
    ) -> Result<(), TokenError> {
        let current = self.books.allowance(caller, spender);
        let updated = current
            .checked_sub(subtracted)
            .ok_or(TokenError::InsufficientAllowance {
                owner: caller,
                spender,
                allowance: current,
                requested: subtracted,
            })?;
        self.approve(caller, spender, updated)
    }

    // -----------------------------------------------------------------------
    // Transfer path
    // -----------------------------------------------------------------------

    /// Classifies a transfer from `from` to `to`.
    pub fn classify(&self, from: Address, to: Address) -> TransferKind {
        if self.is_fee_exempt(from) || self.is_fee_exempt(to) {
            return TransferKind::Exempt;
        }
        if self.swap_lock.is_held() && (from == self.address || to == self.address) {
            return TransferKind::Exempt;
        }
        if from == self.pair {
            TransferKind::Buy
        } else if to == self.pair {
            TransferKind::Sell
        } else {
            TransferKind::Peer
        }
    }

    fn execute_transfer(
        &mut self,
        router: &mut dyn LiquidityRouter,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        if from.is_zero() {
            return Err(TokenError::InvalidAddress("transfer from the zero address"));
        }
        if to.is_zero() {
            return Err(TokenError::InvalidAddress("transfer to the zero address"));
        }
        let balance = self.books.balance_of(from);
        if amount > balance {
            return Err(TokenError::InsufficientBalance {
                account: from,
                balance,
                requested: amount,
            });
        }

        let kind = self.classify(from, to);
        if kind == TransferKind::Exempt {
            self.books.debit(from, amount)?;
            self.books.credit(to, amount);
            self.emit(TokenEvent::Transfer {
                from,
                to,
                value: amount,
            });
            return Ok(TransferReceipt {
                kind,
                sent: amount,
                received: amount,
                fees: FeeBreakdown::default(),
                large_sell: false,
                conversion: None,
            });
        }

        let large_sell = kind == TransferKind::Sell
            && StabilityGuard::new(&self.config.stability).is_large_sell(
                kind,
                amount,
                router.reserves().token,
            );
        let fees = FeePolicy::new(&self.config.fees).compute(kind, amount, large_sell)?;
        let received = amount - fees.total();

        // Nothing below can fail: commit this transfer's bookkeeping in full
        // before any external call.
        self.books.debit(from, amount)?;
        self.books.credit(to, received);
        self.collect_fees(from, &fees);
        self.emit(TokenEvent::FeesCollected {
            from,
            kind,
            large_sell,
            fees,
        });

        debug!(
            from = %from,
            to = %to,
            kind = %kind,
            amount,
            received,
            fees = fees.total(),
            large_sell,
            "transfer classified"
        );

        let conversion = if kind == TransferKind::Sell {
            self.maybe_convert(router)
        } else {
            None
        };

        self.emit(TokenEvent::Transfer {
            from,
            to,
            value: received,
        });

        Ok(TransferReceipt {
            kind,
            sent: amount,
            received,
            fees,
            large_sell,
            conversion,
        })
    }

    fn collect_fees(&mut self, from: Address, fees: &FeeBreakdown) {
        let retained = fees.retained();
        if retained > 0 {
            self.books.credit(self.address, retained);
            self.books.pending.credit(fees);
            self.emit(TokenEvent::Transfer {
                from,
                to: self.address,
                value: retained,
            });
        }
        if fees.archa > 0 {
            let archa = self.config.wallets.archa;
            self.books.credit(archa, fees.archa);
            self.emit(TokenEvent::Transfer {
                from,
                to: archa,
                value: fees.archa,
            });
        }
        if fees.burn > 0 {
            self.books.total_supply = self.books.total_supply.saturating_sub(fees.burn);
            self.emit(TokenEvent::Transfer {
                from,
                to: Address::ZERO,
                value: fees.burn,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Supply (genesis only)
    // -----------------------------------------------------------------------

    pub(crate) fn mint(&mut self, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidAddress("mint to the zero address"));
        }
        let new_supply = self
            .books
            .total_supply
            .checked_add(amount)
            .filter(|supply| *supply <= MAX_SUPPLY)
            .ok_or(TokenError::ExceedsMaxSupply { amount })?;
        self.books.total_supply = new_supply;
        self.books.credit(to, amount);
        self.emit(TokenEvent::Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        });
        Ok(())
    }

    pub(crate) fn burn(&mut self, from: Address, amount: Amount) -> Result<(), TokenError> {
        self.books.debit(from, amount)?;
        self.books.total_supply = self.books.total_supply.saturating_sub(amount);
        self.emit(TokenEvent::Transfer {
            from,
            to: Address::ZERO,
            value: amount,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ownership & owner setters
    // -----------------------------------------------------------------------

    /// The single authorization predicate behind every owner-only entry point.
    pub fn require_owner(&self, caller: Address) -> Result<(), TokenError> {
        match self.owner {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(TokenError::Unauthorized {
                caller,
                role: "owner",
            }),
        }
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::InvalidAddress("new owner is the zero address"));
        }
        let previous = self.owner.replace(new_owner);
        info!(previous = ?previous, new = %new_owner, "ownership transferred");
        self.emit(TokenEvent::OwnershipTransferred {
            previous,
            new: Some(new_owner),
        });
        Ok(())
    }

    /// Gives up ownership for good. Every owner setter fails afterwards.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        let previous = self.owner.take();
        info!("ownership renounced");
        self.emit(TokenEvent::OwnershipTransferred {
            previous,
            new: None,
        });
        Ok(())
    }

    /// The fee exemption moves from the previous wallet to the new one.
    pub fn set_archa_wallet(&mut self, caller: Address, wallet: Address) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        if wallet.is_zero() {
            return Err(ConfigError::ZeroWallet("archa").into());
        }
        let previous = std::mem::replace(&mut self.config.wallets.archa, wallet);
        self.hand_over_exemption(Some(previous), Some(wallet));
        info!(wallet = %wallet, "archa wallet updated");
        self.emit(TokenEvent::ArchaWalletUpdated { wallet });
        Ok(())
    }

    /// `None` keeps liquidity proceeds on the ledger when swap-and-liquify
    /// is off. The fee exemption moves from the previous wallet to the new one.
    pub fn set_liquidity_wallet(
        &mut self,
        caller: Address,
        wallet: Option<Address>,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        if wallet.is_some_and(|w| w.is_zero()) {
            return Err(ConfigError::ZeroWallet("liquidity").into());
        }
        let previous = std::mem::replace(&mut self.config.wallets.liquidity, wallet);
        self.hand_over_exemption(previous, wallet);
        info!(wallet = ?wallet, "liquidity wallet updated");
        self.emit(TokenEvent::LiquidityWalletUpdated { wallet });
        Ok(())
    }

    pub fn set_fee_enabled(
        &mut self,
        caller: Address,
        category: FeeCategory,
        enabled: bool,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        self.config.fees.enabled.set(category, enabled);
        info!(category = %category, enabled, "fee toggled");
        self.emit(TokenEvent::FeeToggled { category, enabled });
        Ok(())
    }

    pub fn set_swap_and_liquify_enabled(
        &mut self,
        caller: Address,
        enabled: bool,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        self.config.swap.swap_and_liquify_enabled = enabled;
        info!(enabled, "swap-and-liquify toggled");
        self.emit(TokenEvent::SwapAndLiquifyToggled { enabled });
        Ok(())
    }

    pub fn set_stability_guard_enabled(
        &mut self,
        caller: Address,
        enabled: bool,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        self.config.stability.enabled = enabled;
        info!(enabled, "stability guard toggled");
        self.emit(TokenEvent::StabilityGuardToggled { enabled });
        Ok(())
    }

    pub fn set_swap_threshold(&mut self, caller: Address, threshold: Amount) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        self.config.swap.threshold = threshold;
        info!(threshold, "swap threshold updated");
        self.emit(TokenEvent::SwapThresholdUpdated { threshold });
        Ok(())
    }

    pub fn set_fee_exempt(
        &mut self,
        caller: Address,
        account: Address,
        exempt: bool,
    ) -> Result<(), TokenError> {
        self.require_owner(caller)?;
        if exempt {
            self.fee_exempt.insert(account);
        } else {
            self.fee_exempt.remove(&account);
        }
        info!(account = %account, exempt, "fee exemption updated");
        self.emit(TokenEvent::FeeExemptionUpdated { account, exempt });
        Ok(())
    }

    // A retired wallet keeps its exemption while it still fills another role.
    fn hand_over_exemption(&mut self, previous: Option<Address>, new: Option<Address>) {
        if let Some(previous) = previous {
            if !self.holds_role(previous) {
                self.fee_exempt.remove(&previous);
            }
        }
        if let Some(new) = new {
            self.fee_exempt.insert(new);
        }
    }

    fn holds_role(&self, account: Address) -> bool {
        let wallets = &self.config.wallets;
        self.owner == Some(account)
            || account == self.address
            || account == self.router
            || account == wallets.dev
            || account == wallets.ops
            || account == wallets.archa
            || wallets.liquidity == Some(account)
    }

    pub(crate) fn emit(&mut self, event: TokenEvent) {
        self.events.push(event);
    }
}

// ---------------------------------------------------------------------------
// Router callbacks
// ---------------------------------------------------------------------------

impl PoolToken for ScratchToken {
    fn token_address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: Address) -> Amount {
        self.books.balance_of(account)
    }

    fn transfer(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        ScratchToken::transfer(self, router, caller, to, amount)
    }

    fn transfer_from(
        &mut self,
        router: &mut dyn LiquidityRouter,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        ScratchToken::transfer_from(self, router, caller, from, to, amount)
    }
}

/// A ledger bound to the router its transfers call into.
pub struct TokenHandle<'a> {
    pub(crate) token: &'a mut ScratchToken,
    pub(crate) router: &'a mut dyn LiquidityRouter,
}

impl TokenHandle<'_> {
    pub fn token(&self) -> &ScratchToken {
        self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SimulatedPool;

    fn setup() -> (ScratchToken, SimulatedPool, Address) {
        let mut pool = SimulatedPool::new(Address::from_label("router"));
        let owner = Address::from_label("owner");
        let config = TokenConfig::reference(
            Address::from_label("dev"),
            Address::from_label("ops"),
            Address::from_label("archa"),
        );
        let mut token = ScratchToken::new(owner, config, &mut pool).unwrap();
        token.mint(owner, 1_000_000).unwrap();
        (token, pool, owner)
    }

    #[test]
    fn new_ledger_caches_pair_and_seeds_exemptions() {
        let (token, pool, owner) = setup();
        assert_eq!(Some(token.pair_address()), pool.pair());
        assert!(token.is_fee_exempt(owner));
        assert!(token.is_fee_exempt(token.address()));
        assert!(token.is_fee_exempt(pool.address()));
        assert!(!token.is_fee_exempt(token.pair_address()));
    }

    #[test]
    fn classify_by_direction() {
        let (token, _pool, owner) = setup();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let pair = token.pair_address();
        assert_eq!(token.classify(owner, alice), TransferKind::Exempt);
        assert_eq!(token.classify(pair, alice), TransferKind::Buy);
        assert_eq!(token.classify(alice, pair), TransferKind::Sell);
        assert_eq!(token.classify(alice, bob), TransferKind::Peer);
    }

    #[test]
    fn mint_respects_cap() {
        let (mut token, _pool, owner) = setup();
        let result = token.mint(owner, MAX_SUPPLY);
        assert!(matches!(result, Err(TokenError::ExceedsMaxSupply { .. })));
    }

    #[test]
    fn burn_reduces_supply() {
        let (mut token, _pool, owner) = setup();
        token.burn(owner, 400_000).unwrap();
        assert_eq!(token.total_supply(), 600_000);
        assert_eq!(token.balance_of(owner), 600_000);
    }

    #[test]
    fn zero_address_endpoints_rejected() {
        let (mut token, mut pool, owner) = setup();
        let result = token.transfer(&mut pool, owner, Address::ZERO, 1);
        assert!(matches!(result, Err(TokenError::InvalidAddress(_))));
        assert!(token.approve(owner, Address::ZERO, 1).is_err());
    }

    #[test]
    fn allowance_adjustments() {
        let (mut token, _pool, owner) = setup();
        let spender = Address::from_label("spender");
        token.increase_allowance(owner, spender, 100).unwrap();
        token.increase_allowance(owner, spender, 50).unwrap();
        assert_eq!(token.allowance(owner, spender), 150);
        token.decrease_allowance(owner, spender, 120).unwrap();
        assert_eq!(token.allowance(owner, spender), 30);
        assert!(token.decrease_allowance(owner, spender, 31).is_err());
    }

    #[test]
    fn renounced_owner_cannot_configure() {
        let (mut token, _pool, owner) = setup();
        token.renounce_ownership(owner).unwrap();
        assert_eq!(token.owner(), None);
        let result = token.set_stability_guard_enabled(owner, false);
        assert!(matches!(result, Err(TokenError::Unauthorized { .. })));
    }

    #[test]
    fn snapshot_lists_non_zero_balances() {
        let (token, _pool, owner) = setup();
        let snapshot = token.snapshot();
        assert_eq!(snapshot.balances.get(&owner), Some(&1_000_000));
        assert_eq!(snapshot.total_supply, 1_000_000);
        assert!(snapshot.to_json_pretty().unwrap().contains("ScratchToken"));
    }
}
