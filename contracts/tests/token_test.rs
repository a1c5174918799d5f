//! Integration tests for the token ledger's transfer path.
//!
//! Each test deploys a genesis ledger against the simulated pool, seeds the
//! pool with liquidity, and then exercises transfers across the exempt,
//! buy, sell and peer paths.

use chrono::Utc;
use scratch_contracts::config::{MAX_SUPPLY, UNIT};
use scratch_contracts::{
    Address, DeployParams, FeeCategory, LiquidityRouter, ScratchToken, SimulatedPool, TokenError,
    TokenEvent, TransferKind,
};

const POOL_TOKENS: u128 = MAX_SUPPLY / 10;
const POOL_BASE: u128 = 1_000 * UNIT * UNIT;

struct Fixture {
    params: DeployParams,
    token: ScratchToken,
    pool: SimulatedPool,
}

impl Fixture {
    fn owner(&self) -> Address {
        self.params.owner
    }

    /// Gives `account` tokens straight from the (exempt) owner.
    fn fund(&mut self, account: Address, amount: u128) {
        let owner = self.owner();
        self.token.transfer(&mut self.pool, owner, account, amount).unwrap();
    }

    /// Checks the supply invariant: every token lives in exactly one
    /// balance and pending fees sit inside the ledger's own balance.
    fn assert_supply_invariant(&self) {
        let snapshot = self.token.snapshot();
        let sum: u128 = snapshot.balances.values().sum();
        assert_eq!(sum, self.token.total_supply());
        assert!(self.token.balance_of(self.token.address()) >= self.token.pending_fees().total());
    }
}

fn setup() -> Fixture {
    let params = DeployParams::from_labels("token-test");
    let mut pool = SimulatedPool::new(Address::from_label("router"));
    let mut token = ScratchToken::deploy(&params, &mut pool, Utc::now())
        .unwrap()
        .token;

    let owner = params.owner;
    token.approve(owner, pool.address(), POOL_TOKENS).unwrap();
    pool.fund_base(owner, POOL_BASE);
    pool.add_liquidity(&mut token, owner, POOL_TOKENS, POOL_BASE, owner)
        .unwrap();

    Fixture { params, token, pool }
}

// ---------------------------------------------------------------------------
// ERC-20 surface
// ---------------------------------------------------------------------------

#[test]
fn metadata() {
    let f = setup();
    assert_eq!(f.token.name(), "ScratchToken");
    assert_eq!(f.token.symbol(), "SCRATCH");
    assert_eq!(f.token.decimals(), 9);
    assert_eq!(f.token.max_supply(), MAX_SUPPLY);
}

#[test]
fn transfer_more_than_balance_fails_without_side_effects() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    f.fund(alice, 1_000);
    let events_before = f.token.events().len();

    let result = f.token.transfer(&mut f.pool, alice, bob, 1_001);

    assert!(matches!(
        result,
        Err(TokenError::InsufficientBalance { balance: 1_000, requested: 1_001, .. })
    ));
    assert_eq!(f.token.balance_of(alice), 1_000);
    assert_eq!(f.token.balance_of(bob), 0);
    assert_eq!(f.token.events().len(), events_before);
}

#[test]
fn transfer_from_spends_allowance() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let spender = Address::from_label("spender");
    let owner = f.owner();

    f.token.approve(owner, spender, 500).unwrap();
    let receipt = f
        .token
        .transfer_from(&mut f.pool, spender, owner, alice, 300)
        .unwrap();

    assert_eq!(receipt.kind, TransferKind::Exempt);
    assert_eq!(f.token.balance_of(alice), 300);
    assert_eq!(f.token.allowance(owner, spender), 200);
}

#[test]
fn transfer_from_beyond_allowance_fails() {
    let mut f = setup();
    let spender = Address::from_label("spender");
    let owner = f.owner();
    f.token.approve(owner, spender, 100).unwrap();

    let result = f
        .token
        .transfer_from(&mut f.pool, spender, owner, spender, 101);

    assert!(matches!(result, Err(TokenError::InsufficientAllowance { allowance: 100, .. })));
    assert_eq!(f.token.allowance(owner, spender), 100);
    assert_eq!(f.token.balance_of(spender), 0);
}

#[test]
fn failed_transfer_from_keeps_allowance() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let spender = Address::from_label("spender");
    f.fund(alice, 50);
    f.token.approve(alice, spender, 1_000).unwrap();

    let result = f.token.transfer_from(&mut f.pool, spender, alice, spender, 60);

    assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
    assert_eq!(f.token.allowance(alice, spender), 1_000);
    assert_eq!(f.token.balance_of(alice), 50);
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

#[test]
fn exempt_transfer_moves_exact_amount() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let pending_before = f.token.pending_fees();

    let receipt = f
        .token
        .transfer(&mut f.pool, f.params.owner, alice, 123_456_789)
        .unwrap();

    assert_eq!(receipt.kind, TransferKind::Exempt);
    assert_eq!(receipt.received, 123_456_789);
    assert!(receipt.fees.is_zero());
    assert_eq!(f.token.pending_fees(), pending_before);
    f.assert_supply_invariant();
}

#[test]
fn peer_transfer_pays_every_fee_exactly() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let archa = f.params.archa_wallet;
    let amount: u128 = 123_456_789_012;
    f.fund(alice, amount);

    let supply_before = f.token.total_supply();
    let archa_before = f.token.balance_of(archa);
    let ledger_before = f.token.balance_of(f.token.address());

    let receipt = f.token.transfer(&mut f.pool, alice, bob, amount).unwrap();

    let two = amount * 2 / 100;
    let one = amount / 100;
    assert_eq!(receipt.kind, TransferKind::Peer);
    assert_eq!(receipt.fees.dev, two);
    assert_eq!(receipt.fees.ops, two);
    assert_eq!(receipt.fees.liquidity, two);
    assert_eq!(receipt.fees.burn, two);
    assert_eq!(receipt.fees.archa, one);
    assert_eq!(f.token.balance_of(bob), amount - 4 * two - one);
    assert_eq!(f.token.pending_dev_fees(), two);
    assert_eq!(f.token.pending_ops_fees(), two);
    assert_eq!(f.token.pending_liquidity_fees(), two);
    assert_eq!(f.token.balance_of(archa), archa_before + one);
    assert_eq!(f.token.balance_of(f.token.address()), ledger_before + 3 * two);
    assert_eq!(f.token.total_supply(), supply_before - two);
    f.assert_supply_invariant();
}

#[test]
fn disabled_fee_is_not_collected() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let owner = f.owner();
    f.fund(alice, 10_000);
    f.token.set_fee_enabled(owner, FeeCategory::Burn, false).unwrap();
    f.token.set_fee_enabled(owner, FeeCategory::Dev, false).unwrap();
    let supply_before = f.token.total_supply();

    let receipt = f.token.transfer(&mut f.pool, alice, bob, 10_000).unwrap();

    assert_eq!(receipt.fees.burn, 0);
    assert_eq!(receipt.fees.dev, 0);
    assert_eq!(receipt.fees.ops, 200);
    assert_eq!(f.token.total_supply(), supply_before);
    assert_eq!(f.token.pending_dev_fees(), 0);
}

#[test]
fn buy_through_pool_pays_fees() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    f.pool.fund_base(alice, UNIT * UNIT);

    let received = f
        .pool
        .swap_exact_base_for_tokens(&mut f.token, alice, UNIT * UNIT, alice)
        .unwrap();

    assert!(received > 0);
    assert_eq!(f.token.balance_of(alice), received);
    let collected = f.token.events().iter().rev().find_map(|e| match e {
        TokenEvent::FeesCollected { kind, large_sell, fees, .. } => Some((*kind, *large_sell, *fees)),
        _ => None,
    });
    let (kind, large_sell, fees) = collected.unwrap();
    assert_eq!(kind, TransferKind::Buy);
    assert!(!large_sell);
    let gross = received + fees.total();
    assert_eq!(fees.dev, gross * 2 / 100);
    assert_eq!(fees.archa, gross / 100);
    f.assert_supply_invariant();
}

#[test]
fn large_sell_extracts_more_than_normal_sell() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let owner = f.owner();
    let pair = f.token.pair_address();
    // 4% of the token reserve
    let amount = f.pool.reserves().token / 25;
    f.fund(alice, amount);
    f.fund(bob, amount);
    f.token.set_swap_threshold(owner, MAX_SUPPLY).unwrap();

    let large = f.token.transfer(&mut f.pool, alice, pair, amount).unwrap();
    f.token.set_stability_guard_enabled(owner, false).unwrap();
    let normal = f.token.transfer(&mut f.pool, bob, pair, amount).unwrap();

    assert_eq!(large.kind, TransferKind::Sell);
    assert!(large.large_sell);
    assert!(!normal.large_sell);
    assert!(large.fees.total() > normal.fees.total());
    assert_eq!(large.fees.burn, amount * 7 / 100);
    assert_eq!(large.fees.dev, normal.fees.dev);
    f.assert_supply_invariant();
}

#[test]
fn sell_at_threshold_is_not_large() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let pair = f.token.pair_address();
    let amount = f.pool.reserves().token * 3 / 100;
    f.fund(alice, amount + 1);
    f.token.set_swap_threshold(f.params.owner, MAX_SUPPLY).unwrap();

    let at_threshold = f.token.transfer(&mut f.pool, alice, pair, amount).unwrap();

    assert!(!at_threshold.large_sell);
}

#[test]
fn pair_is_never_exempt() {
    let f = setup();
    assert!(!f.token.is_fee_exempt(f.token.pair_address()));
    assert!(f.token.is_fee_exempt(f.pool.address()));
    assert!(f.token.is_fee_exempt(f.params.exchange_wallet));
}

#[test]
fn exemption_can_be_granted_and_revoked() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let owner = f.owner();
    f.fund(alice, 2_000);

    f.token.set_fee_exempt(owner, alice, true).unwrap();
    let exempt = f.token.transfer(&mut f.pool, alice, bob, 1_000).unwrap();
    f.token.set_fee_exempt(owner, alice, false).unwrap();
    let taxed = f.token.transfer(&mut f.pool, alice, bob, 1_000).unwrap();

    assert_eq!(exempt.received, 1_000);
    assert_eq!(taxed.received, 910);
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[test]
fn owner_setters_reject_strangers() {
    let mut f = setup();
    let mallory = Address::from_label("mallory");

    let results = [
        f.token.set_archa_wallet(mallory, mallory),
        f.token.set_liquidity_wallet(mallory, Some(mallory)),
        f.token.set_fee_enabled(mallory, FeeCategory::Dev, false),
        f.token.set_swap_and_liquify_enabled(mallory, false),
        f.token.set_stability_guard_enabled(mallory, false),
        f.token.set_fee_exempt(mallory, mallory, true),
        f.token.set_swap_threshold(mallory, 0),
        f.token.transfer_ownership(mallory, mallory),
        f.token.renounce_ownership(mallory),
    ];

    for result in results {
        assert!(matches!(result, Err(TokenError::Unauthorized { role: "owner", .. })));
    }
    assert!(!f.token.is_fee_exempt(mallory));
}

#[test]
fn ownership_transfer_hands_over_setters() {
    let mut f = setup();
    let owner = f.owner();
    let successor = Address::from_label("successor");

    f.token.transfer_ownership(owner, successor).unwrap();

    assert_eq!(f.token.owner(), Some(successor));
    assert!(f.token.set_stability_guard_enabled(owner, false).is_err());
    assert!(f.token.set_stability_guard_enabled(successor, false).is_ok());
    assert!(!f.token.config().stability.enabled);
}

#[test]
fn archa_wallet_update_redirects_fees() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let new_archa = Address::from_label("new-archa");
    let owner = f.owner();
    f.fund(alice, 10_000);

    f.token.set_archa_wallet(owner, new_archa).unwrap();
    f.token.transfer(&mut f.pool, alice, bob, 10_000).unwrap();

    assert_eq!(f.token.balance_of(new_archa), 100);
    assert!(matches!(
        f.token.set_archa_wallet(owner, Address::ZERO),
        Err(TokenError::Config(_))
    ));
}

#[test]
fn treasury_wallet_change_moves_exemption() {
    let mut f = setup();
    let owner = f.owner();
    let old_archa = f.params.archa_wallet;
    let new_archa = Address::from_label("new-archa");
    let first_pool = Address::from_label("lp-wallet-1");
    let second_pool = Address::from_label("lp-wallet-2");

    f.token.set_archa_wallet(owner, new_archa).unwrap();
    assert!(f.token.is_fee_exempt(new_archa));
    assert!(!f.token.is_fee_exempt(old_archa));

    f.token.set_liquidity_wallet(owner, Some(first_pool)).unwrap();
    f.token.set_liquidity_wallet(owner, Some(second_pool)).unwrap();
    assert!(!f.token.is_fee_exempt(first_pool));
    assert!(f.token.is_fee_exempt(second_pool));

    f.token.set_liquidity_wallet(owner, None).unwrap();
    assert!(!f.token.is_fee_exempt(second_pool));

    // The dev wallet keeps its exemption after doubling as the archa wallet.
    let dev = f.params.dev_wallet;
    f.token.set_archa_wallet(owner, dev).unwrap();
    f.token.set_archa_wallet(owner, new_archa).unwrap();
    assert!(f.token.is_fee_exempt(dev));

    f.fund(second_pool, 1_000);
    let receipt = f
        .token
        .transfer(&mut f.pool, second_pool, Address::from_label("bob"), 1_000)
        .unwrap();
    assert_eq!(receipt.kind, TransferKind::Peer);
}

#[test]
fn supply_invariant_holds_across_mixed_traffic() {
    let mut f = setup();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    let pair = f.token.pair_address();
    f.token.set_swap_threshold(f.params.owner, 1).unwrap();
    f.pool.fund_base(alice, 10 * UNIT * UNIT);

    f.pool
        .swap_exact_base_for_tokens(&mut f.token, alice, 10 * UNIT * UNIT, alice)
        .unwrap();
    f.assert_supply_invariant();

    let half = f.token.balance_of(alice) / 2;
    f.token.transfer(&mut f.pool, alice, bob, half).unwrap();
    f.assert_supply_invariant();

    let bob_balance = f.token.balance_of(bob);
    f.token.approve(bob, f.pool.address(), bob_balance).unwrap();
    f.pool
        .swap_exact_tokens_for_base(&mut f.token, bob, bob_balance, bob)
        .unwrap();
    f.assert_supply_invariant();

    let rest = f.token.balance_of(alice);
    f.token.transfer(&mut f.pool, alice, pair, rest).unwrap();
    f.assert_supply_invariant();
    assert!(!f.token.is_converting());
}
