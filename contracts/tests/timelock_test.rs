//! Integration tests for the founders timelock against a deployed ledger.
//!
//! Time is driven explicitly: every call takes the "block timestamp" as an
//! argument, so the tests walk the schedule period by period.

use chrono::{DateTime, Duration, TimeZone, Utc};
use scratch_contracts::config::{FOUNDER_CLIFF_SECS, FOUNDER_VESTING_PERIOD_SECS};
use scratch_contracts::{
    Address, DeployParams, FoundersTimelock, ScratchToken, SimulatedPool, VestingError,
    VestingStatus,
};

const DAY: i64 = 86_400;

struct Fixture {
    params: DeployParams,
    token: ScratchToken,
    pool: SimulatedPool,
    timelocks: Vec<FoundersTimelock>,
}

impl Fixture {
    fn release(&mut self, index: usize, caller: Address, now: DateTime<Utc>) -> Result<u128, VestingError> {
        let mut handle = self.token.with_router(&mut self.pool);
        self.timelocks[index].release(caller, &mut handle, now)
    }

    fn locked(&mut self, index: usize) -> u128 {
        let handle = self.token.with_router(&mut self.pool);
        self.timelocks[index].locked_balance(&handle)
    }
}

fn deployed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn cliff() -> DateTime<Utc> {
    deployed_at() + Duration::seconds(FOUNDER_CLIFF_SECS as i64)
}

fn period(n: i64) -> DateTime<Utc> {
    cliff() + Duration::seconds(n * FOUNDER_VESTING_PERIOD_SECS as i64)
}

fn setup() -> Fixture {
    let params = DeployParams::from_labels("vesting");
    let mut pool = SimulatedPool::new(Address::from_label("router"));
    let deployment = ScratchToken::deploy(&params, &mut pool, deployed_at()).unwrap();
    Fixture {
        params,
        token: deployment.token,
        pool,
        timelocks: deployment.timelocks,
    }
}

#[test]
fn cliff_is_six_months_after_deployment() {
    let f = setup();
    assert_eq!(f.timelocks[0].cliff(), deployed_at() + Duration::days(180));
    assert_eq!(f.timelocks[0].vesting_period_secs(), 30 * DAY as u64);
}

#[test]
fn release_before_cliff_fails() {
    let mut f = setup();
    let founder = f.params.founders[0];
    let total = f.locked(0);

    for now in [deployed_at(), cliff() - Duration::seconds(1)] {
        assert_eq!(f.release(0, founder, now), Err(VestingError::NothingDue));
    }
    assert_eq!(f.locked(0), total);
    assert_eq!(f.token.balance_of(founder), 0);
}

#[test]
fn first_release_pays_one_period() {
    let mut f = setup();
    let founder = f.params.founders[0];
    let total = f.locked(0);

    let paid = f.release(0, founder, cliff()).unwrap();

    assert_eq!(paid, total / 10);
    assert_eq!(f.token.balance_of(founder), total / 10);
    assert_eq!(f.timelocks[0].released_balance(), total / 10);
    assert_eq!(f.locked(0), total - total / 10);
}

#[test]
fn second_release_in_same_period_fails() {
    let mut f = setup();
    let founder = f.params.founders[1];

    f.release(1, founder, cliff()).unwrap();
    let again = f.release(1, founder, cliff() + Duration::days(29));

    assert_eq!(again, Err(VestingError::NothingDue));
}

#[test]
fn per_period_releases_sum_to_allocation() {
    let mut f = setup();
    let founder = f.params.founders[2];
    let total = f.locked(2);

    let mut released = 0;
    for n in 0..10 {
        let paid = f.release(2, founder, period(n) + Duration::hours(1)).unwrap();
        assert_eq!(paid, total / 10);
        released += paid;
    }

    assert_eq!(released, total);
    assert_eq!(f.locked(2), 0);
    assert_eq!(f.token.balance_of(founder), total);
    let handle = f.token.with_router(&mut f.pool);
    assert_eq!(
        f.timelocks[2].status(&handle, period(10)),
        VestingStatus::FullyReleased
    );
}

#[test]
fn release_after_schedule_pays_everything() {
    let mut f = setup();
    let founder = f.params.founders[4];
    let total = f.locked(4);

    let paid = f.release(4, founder, period(40)).unwrap();

    assert_eq!(paid, total);
    assert_eq!(f.locked(4), 0);
    assert_eq!(f.release(4, founder, period(41)), Err(VestingError::NothingDue));
}

#[test]
fn skipped_periods_catch_up() {
    let mut f = setup();
    let founder = f.params.founders[3];
    let total = f.locked(3);

    let paid = f.release(3, founder, period(3)).unwrap();

    assert_eq!(paid, total * 4 / 10);
}

#[test]
fn only_beneficiary_may_release() {
    let mut f = setup();
    let mallory = Address::from_label("mallory");
    let owner = f.params.owner;

    for caller in [mallory, owner, f.params.founders[1]] {
        let result = f.release(0, caller, period(5));
        assert!(matches!(result, Err(VestingError::Unauthorized { .. })));
    }
    assert_eq!(f.timelocks[0].released_balance(), 0);
}

#[test]
fn release_is_fee_free() {
    let mut f = setup();
    let founder = f.params.founders[0];
    let supply = f.token.total_supply();

    f.release(0, founder, cliff()).unwrap();

    assert_eq!(f.token.total_supply(), supply);
    assert_eq!(f.token.pending_fees().total(), 0);
}

#[test]
fn release_stays_fee_free_after_exemption_revoked() {
    let mut f = setup();
    let founder = f.params.founders[0];
    let owner = f.params.owner;
    let timelock = f.timelocks[0].address();
    let total = f.locked(0);

    f.token.set_fee_exempt(owner, timelock, false).unwrap();
    assert!(f.token.is_fee_exempt(timelock));

    let paid = f.release(0, founder, cliff()).unwrap();

    assert_eq!(paid, total / 10);
    assert_eq!(f.token.balance_of(founder), paid);
    assert_eq!(f.token.pending_fees().total(), 0);
}

#[test]
fn status_follows_the_clock() {
    let mut f = setup();
    let handle = f.token.with_router(&mut f.pool);
    let lock = &f.timelocks[0];
    assert_eq!(lock.status(&handle, deployed_at()), VestingStatus::BeforeCliff);
    assert_eq!(lock.status(&handle, cliff()), VestingStatus::Vesting);
    assert_eq!(lock.status(&handle, period(20)), VestingStatus::Vesting);
}
