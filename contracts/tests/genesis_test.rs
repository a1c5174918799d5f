//! Integration tests for genesis deployment.

use chrono::Utc;
use scratch_contracts::config::{FOUNDER_VESTING_PERIODS, MAX_SUPPLY};
use scratch_contracts::genesis::allocation;
use scratch_contracts::{Address, DeployParams, LiquidityRouter, ScratchToken, SimulatedPool, TokenEvent};

fn deploy() -> (scratch_contracts::Deployment, DeployParams, SimulatedPool) {
    let params = DeployParams::from_labels("genesis");
    let mut pool = SimulatedPool::new(Address::from_label("router"));
    let deployment = ScratchToken::deploy(&params, &mut pool, Utc::now()).unwrap();
    (deployment, params, pool)
}

#[test]
fn total_supply_is_85_percent_of_max() {
    let (deployment, _, _) = deploy();
    assert_eq!(deployment.token.total_supply(), MAX_SUPPLY * 85 / 100);
    assert_eq!(deployment.token.max_supply(), MAX_SUPPLY);
}

#[test]
fn treasury_allocations() {
    let (deployment, params, _) = deploy();
    let token = &deployment.token;
    assert_eq!(token.balance_of(params.dev_wallet), MAX_SUPPLY * 5 / 100);
    assert_eq!(token.balance_of(params.exchange_wallet), MAX_SUPPLY * 5 / 100);
    // 100 - 15 burned - 5 - 5 - 10.5 in timelocks
    assert_eq!(token.balance_of(params.owner), MAX_SUPPLY / 1_000 * 645);
}

#[test]
fn founder_timelocks_hold_their_shares() {
    let (mut deployment, params, mut pool) = deploy();
    let expected = [250, 250, 125, 250, 175].map(allocation);

    assert_eq!(deployment.timelocks.len(), 5);
    for (i, timelock) in deployment.timelocks.iter().enumerate() {
        assert_eq!(timelock.beneficiary(), params.founders[i]);
        assert_eq!(timelock.token(), deployment.token.address());
        assert_eq!(timelock.vesting_duration(), FOUNDER_VESTING_PERIODS);
        assert_eq!(timelock.released_balance(), 0);
        assert_eq!(deployment.token.founders_timelock(i), Some(timelock.address()));
        assert_eq!(deployment.token.timelock_of(params.founders[i]), Some(timelock.address()));
        assert!(deployment.token.is_fee_exempt(timelock.address()));
    }

    let handle = deployment.token.with_router(&mut pool);
    for (timelock, share) in deployment.timelocks.iter().zip(expected) {
        assert_eq!(timelock.locked_balance(&handle), share);
    }
    assert_eq!(expected[0], MAX_SUPPLY / 40);
    assert_eq!(expected[2], MAX_SUPPLY / 80);
}

#[test]
fn pair_is_resolved_once_and_cached() {
    let (deployment, _, pool) = deploy();
    assert_eq!(Some(deployment.token.pair_address()), pool.pair());
    assert_eq!(deployment.token.router_address(), pool.address());
}

#[test]
fn genesis_events_record_mint_and_burn() {
    let (deployment, params, _) = deploy();
    let events = deployment.token.events();

    assert!(events.contains(&TokenEvent::Transfer {
        from: Address::ZERO,
        to: params.owner,
        value: MAX_SUPPLY,
    }));
    assert!(events.contains(&TokenEvent::Transfer {
        from: params.owner,
        to: Address::ZERO,
        value: MAX_SUPPLY * 15 / 100,
    }));
}

#[test]
fn deployment_is_fee_free() {
    let (deployment, _, _) = deploy();
    assert_eq!(deployment.token.pending_fees().total(), 0);
    assert!(!deployment
        .token
        .events()
        .iter()
        .any(|e| matches!(e, TokenEvent::FeesCollected { .. })));
}
