//! # Founders Timelock
//!
//! Holds one founder's allocation and releases it on a cliff-plus-linear
//! schedule:
//!
//! 1. **Cliff** — nothing is releasable before `cliff`.
//! 2. **Vesting** — the first period unlocks at the cliff itself, then one
//!    more period every `vesting_period_secs`, up to `vesting_duration`
//!    periods.
//! 3. **Fully released** — once every period has elapsed and been claimed,
//!    the timelock holds nothing.
//!
//! The entitlement after `n` elapsed periods is `total * n / duration`,
//! where `total` is what the timelock currently holds plus what it has
//! already released. Tokens sent to the timelock late are folded into the
//! same schedule.
//!
//! The timelock owns no ledger. It reads balances and moves tokens through
//! any [`VestingToken`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::info;

use crate::address::Address;
use crate::config::ConfigError;
use crate::math::mul_div;
use crate::token::{TokenError, TokenHandle};
use crate::Amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during a release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VestingError {
    /// Only the beneficiary may trigger a release.
    #[error("unauthorized: {caller} is not the beneficiary {beneficiary}")]
    Unauthorized {
        caller: Address,
        beneficiary: Address,
    },

    /// Nothing new has vested since the last release.
    #[error("no tokens due for release")]
    NothingDue,

    /// The token handed in is not the one this timelock was created for.
    #[error("token mismatch: timelock holds {expected}, got {actual}")]
    TokenMismatch {
        expected: Address,
        actual: Address,
    },

    #[error("vesting arithmetic overflow")]
    Overflow,

    #[error("token transfer failed: {0}")]
    Token(#[from] TokenError),
}

// ---------------------------------------------------------------------------
// Token seam
// ---------------------------------------------------------------------------

/// The token surface the timelock needs.
pub trait VestingToken {
    fn token_address(&self) -> Address;

    fn balance_of(&self, account: Address) -> Amount;

    /// Moves `amount` out of `timelock`'s balance to `to`.
    fn release_from(&mut self, timelock: Address, to: Address, amount: Amount) -> Result<(), TokenError>;
}

impl VestingToken for TokenHandle<'_> {
    fn token_address(&self) -> Address {
        self.token.address()
    }

    fn balance_of(&self, account: Address) -> Amount {
        self.token.balance_of(account)
    }

    fn release_from(&mut self, timelock: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        self.token.transfer(&mut *self.router, timelock, to, amount)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a timelock is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingStatus {
    BeforeCliff,
    Vesting,
    FullyReleased,
}

impl fmt::Display for VestingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VestingStatus::BeforeCliff => write!(f, "before_cliff"),
            VestingStatus::Vesting => write!(f, "vesting"),
            VestingStatus::FullyReleased => write!(f, "fully_released"),
        }
    }
}

/// One row of a release schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRelease {
    /// 1-based period number.
    pub period: u32,
    pub unlocks_at: DateTime<Utc>,
    /// Cumulative entitlement once this period unlocks.
    pub cumulative: Amount,
}

/// A cliff-plus-linear vesting lock over one founder's tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundersTimelock {
    address: Address,
    token: Address,
    beneficiary: Address,
    cliff: DateTime<Utc>,
    vesting_period_secs: u64,
    vesting_duration: u32,
    released: Amount,
}

impl FoundersTimelock {
    /// Creates a timelock for `beneficiary` over `token`. The cliff falls
    /// `cliff_secs` after `deployed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSchedule`] for a zero period, zero
    /// duration or a cliff that does not fit in a timestamp, and
    /// [`ConfigError::ZeroWallet`] for a zero beneficiary.
    pub fn new(
        token: Address,
        beneficiary: Address,
        deployed_at: DateTime<Utc>,
        cliff_secs: u64,
        vesting_period_secs: u64,
        vesting_duration: u32,
    ) -> Result<Self, ConfigError> {
        if beneficiary.is_zero() {
            return Err(ConfigError::ZeroWallet("beneficiary"));
        }
        if vesting_period_secs == 0 {
            return Err(ConfigError::InvalidSchedule("vesting period must be non-zero"));
        }
        if vesting_duration == 0 {
            return Err(ConfigError::InvalidSchedule("vesting duration must be non-zero"));
        }
        let cliff = i64::try_from(cliff_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|offset| deployed_at.checked_add_signed(offset))
            .ok_or(ConfigError::InvalidSchedule("cliff out of range"))?;

        Ok(Self {
            address: Address::derive(&token, &format!("founders-timelock:{beneficiary}")),
            token,
            beneficiary,
            cliff,
            vesting_period_secs,
            vesting_duration,
            released: 0,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn beneficiary(&self) -> Address {
        self.beneficiary
    }

    pub fn cliff(&self) -> DateTime<Utc> {
        self.cliff
    }

    pub fn vesting_period_secs(&self) -> u64 {
        self.vesting_period_secs
    }

    /// Number of vesting periods.
    pub fn vesting_duration(&self) -> u32 {
        self.vesting_duration
    }

    /// Tokens already released to the beneficiary.
    pub fn released_balance(&self) -> Amount {
        self.released
    }

    /// Tokens still held, i.e. `total - released`.
    pub fn locked_balance(&self, token: &dyn VestingToken) -> Amount {
        token.balance_of(self.address)
    }

    /// Held plus released.
    pub fn total_allocation(&self, token: &dyn VestingToken) -> Result<Amount, VestingError> {
        self.locked_balance(token)
            .checked_add(self.released)
            .ok_or(VestingError::Overflow)
    }

    /// Periods unlocked at `now`, capped at the duration.
    pub fn elapsed_periods(&self, now: DateTime<Utc>) -> u32 {
        if now < self.cliff {
            return 0;
        }
        let since_cliff = u64::try_from((now - self.cliff).num_seconds()).unwrap_or(0);
        let completed = since_cliff / self.vesting_period_secs;
        let unlocked = completed.saturating_add(1);
        u32::try_from(unlocked)
            .unwrap_or(u32::MAX)
            .min(self.vesting_duration)
    }

    /// Cumulative entitlement at `now`.
    pub fn vested_amount(&self, token: &dyn VestingToken, now: DateTime<Utc>) -> Result<Amount, VestingError> {
        let total = self.total_allocation(token)?;
        mul_div(
            total,
            Amount::from(self.elapsed_periods(now)),
            Amount::from(self.vesting_duration),
        )
        .ok_or(VestingError::Overflow)
    }

    /// What a release at `now` would transfer.
    pub fn releasable(&self, token: &dyn VestingToken, now: DateTime<Utc>) -> Result<Amount, VestingError> {
        Ok(self.vested_amount(token, now)?.saturating_sub(self.released))
    }

    pub fn status(&self, token: &dyn VestingToken, now: DateTime<Utc>) -> VestingStatus {
        if now < self.cliff {
            VestingStatus::BeforeCliff
        } else if self.elapsed_periods(now) == self.vesting_duration && self.locked_balance(token) == 0 {
            VestingStatus::FullyReleased
        } else {
            VestingStatus::Vesting
        }
    }

    /// The unlock timetable for an allocation of `total`.
    pub fn release_schedule(&self, total: Amount) -> Vec<ScheduledRelease> {
        (1..=self.vesting_duration)
            .filter_map(|period| {
                let offset = u64::from(period - 1).checked_mul(self.vesting_period_secs)?;
                let unlocks_at = i64::try_from(offset)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|d| self.cliff.checked_add_signed(d))?;
                let cumulative =
                    mul_div(total, Amount::from(period), Amount::from(self.vesting_duration))?;
                Some(ScheduledRelease {
                    period,
                    unlocks_at,
                    cumulative,
                })
            })
            .collect()
    }

    /// Transfers everything due at `now` to the beneficiary and returns
    /// the amount released.
    ///
    /// The released counter is advanced before the transfer and rolled back
    /// if the token rejects it.
    ///
    /// # Errors
    ///
    /// Returns [`VestingError::Unauthorized`] for any caller but the
    /// beneficiary, [`VestingError::TokenMismatch`] for a foreign token and
    /// [`VestingError::NothingDue`] when nothing new has vested.
    pub fn release(
        &mut self,
        caller: Address,
        token: &mut dyn VestingToken,
        now: DateTime<Utc>,
    ) -> Result<Amount, VestingError> {
        if caller != self.beneficiary {
            return Err(VestingError::Unauthorized {
                caller,
                beneficiary: self.beneficiary,
            });
        }
        let actual = token.token_address();
        if actual != self.token {
            return Err(VestingError::TokenMismatch {
                expected: self.token,
                actual,
            });
        }

        let due = self.releasable(&*token, now)?;
        if due == 0 {
            return Err(VestingError::NothingDue);
        }

        let previous = self.released;
        self.released = previous.checked_add(due).ok_or(VestingError::Overflow)?;
        if let Err(err) = token.release_from(self.address, self.beneficiary, due) {
            self.released = previous;
            return Err(err.into());
        }

        info!(
            timelock = %self.address,
            beneficiary = %self.beneficiary,
            amount = due,
            released = self.released,
            "founder tokens released"
        );
        Ok(due)
    }
}
