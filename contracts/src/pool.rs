//! # Simulated Pool
//!
//! An in-memory constant-product router with a single token/base pair. It
//! implements [`LiquidityRouter`] the way an on-chain venue would:
//!
//! - tokens are pulled from the seller with `transfer_from` and delivered
//!   to buyers with `transfer` from the pair, so every trade runs the
//!   ledger's full transfer path;
//! - reserves track what the pair actually received, net of any fee the
//!   ledger took on the way in;
//! - the base asset is a plain balance book owned by the pool.
//!
//! Every method validates before it moves anything. State that must change
//! around a token callback is updated first and rolled back if the token
//! rejects the transfer.

use primitive_types::U256;
use std::collections::HashMap;
use tracing::debug;

use crate::address::Address;
use crate::math::mul_div;
use crate::router::{LiquidityAdded, LiquidityRouter, PoolReserves, PoolToken, RouterError};
use crate::Amount;

/// Swap fee in basis points: 0.3%.
pub const SWAP_FEE_BPS: Amount = 30;

const BPS: Amount = 10_000;

/// Constant-product output with the swap fee taken from the input:
/// `out = in_with_fee * R_out / (R_in * 10_000 + in_with_fee)`.
pub fn constant_product_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Result<Amount, RouterError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(RouterError::InsufficientLiquidity {
            token: reserve_in,
            base: reserve_out,
        });
    }
    let in_with_fee = U256::from(amount_in) * U256::from(BPS - SWAP_FEE_BPS);
    let numerator = in_with_fee * U256::from(reserve_out);
    let denominator = U256::from(reserve_in) * U256::from(BPS) + in_with_fee;
    // out < reserve_out, so it always fits
    Ok((numerator / denominator).as_u128())
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedPool {
    address: Address,
    token: Option<Address>,
    pair: Option<Address>,
    reserves: PoolReserves,
    base_balances: HashMap<Address, Amount>,
    lp_balances: HashMap<Address, Amount>,
    lp_supply: Amount,
}

impl SimulatedPool {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// The pair address, once created.
    pub fn pair(&self) -> Option<Address> {
        self.pair
    }

    pub fn lp_balance_of(&self, account: Address) -> Amount {
        self.lp_balances.get(&account).copied().unwrap_or(0)
    }

    pub fn lp_supply(&self) -> Amount {
        self.lp_supply
    }

    /// Credits base asset out of thin air. Used to fund traders.
    pub fn fund_base(&mut self, account: Address, amount: Amount) {
        let balance = self.base_balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Base asset out for `amount_in` tokens sold at current reserves.
    pub fn quote_token_sale(&self, amount_in: Amount) -> Result<Amount, RouterError> {
        constant_product_out(amount_in, self.reserves.token, self.reserves.base)
    }

    /// Tokens out for `base_in` base asset at current reserves.
    pub fn quote_token_purchase(&self, base_in: Amount) -> Result<Amount, RouterError> {
        constant_product_out(base_in, self.reserves.base, self.reserves.token)
    }

    fn require_pair(&self, token: Address) -> Result<Address, RouterError> {
        match (self.token, self.pair) {
            (Some(t), Some(pair)) if t == token => Ok(pair),
            _ => Err(RouterError::PairMissing(token)),
        }
    }

    fn require_liquidity(&self) -> Result<(), RouterError> {
        if self.reserves.token == 0 || self.reserves.base == 0 {
            return Err(RouterError::InsufficientLiquidity {
                token: self.reserves.token,
                base: self.reserves.base,
            });
        }
        Ok(())
    }

    fn debit_base(&mut self, account: Address, amount: Amount) -> Result<(), RouterError> {
        let available = self.base_balance_of(account);
        let remaining = available
            .checked_sub(amount)
            .ok_or(RouterError::InsufficientBase {
                available,
                requested: amount,
            })?;
        self.base_balances.insert(account, remaining);
        Ok(())
    }

    fn credit_base(&mut self, account: Address, amount: Amount) {
        self.fund_base(account, amount);
    }
}

impl LiquidityRouter for SimulatedPool {
    fn address(&self) -> Address {
        self.address
    }

    fn create_pair(&mut self, token: Address) -> Address {
        if let (Some(existing), Some(pair)) = (self.token, self.pair) {
            if existing == token {
                return pair;
            }
        }
        let pair = Address::derive(&self.address, &format!("pair:{token}"));
        self.token = Some(token);
        self.pair = Some(pair);
        self.reserves = PoolReserves::default();
        debug!(token = %token, pair = %pair, "pair created");
        pair
    }

    fn reserves(&self) -> PoolReserves {
        self.reserves
    }

    fn swap_exact_tokens_for_base(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        amount_in: Amount,
        to: Address,
    ) -> Result<Amount, RouterError> {
        let pair = self.require_pair(token.token_address())?;
        self.require_liquidity()?;
        if amount_in == 0 {
            return Err(RouterError::InsufficientOutput);
        }

        let router = self.address;
        let receipt = token.transfer_from(self, router, from, pair, amount_in)?;

        // Reserves may have moved during the callback.
        let base_out = constant_product_out(receipt.received, self.reserves.token, self.reserves.base)?;
        if base_out == 0 {
            return Err(RouterError::InsufficientOutput);
        }
        self.reserves.token = self
            .reserves
            .token
            .checked_add(receipt.received)
            .ok_or(RouterError::Overflow)?;
        self.reserves.base -= base_out;
        self.credit_base(to, base_out);

        debug!(
            from = %from,
            tokens_in = receipt.received,
            base_out,
            "tokens sold to pool"
        );
        Ok(base_out)
    }

    fn swap_exact_base_for_tokens(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        base_in: Amount,
        to: Address,
    ) -> Result<Amount, RouterError> {
        let pair = self.require_pair(token.token_address())?;
        self.require_liquidity()?;
        let tokens_out = self.quote_token_purchase(base_in)?;
        if tokens_out == 0 {
            return Err(RouterError::InsufficientOutput);
        }

        let base_reserve = self
            .reserves
            .base
            .checked_add(base_in)
            .ok_or(RouterError::Overflow)?;
        let before = self.clone();
        self.debit_base(from, base_in)?;
        self.reserves.base = base_reserve;
        self.reserves.token -= tokens_out;

        match token.transfer(self, pair, to, tokens_out) {
            Ok(receipt) => {
                debug!(to = %to, base_in, tokens_out, received = receipt.received, "tokens bought from pool");
                Ok(receipt.received)
            }
            Err(err) => {
                *self = before;
                Err(err.into())
            }
        }
    }

    fn add_liquidity(
        &mut self,
        token: &mut dyn PoolToken,
        from: Address,
        token_desired: Amount,
        base_desired: Amount,
        lp_to: Address,
    ) -> Result<LiquidityAdded, RouterError> {
        let pair = self.require_pair(token.token_address())?;

        let (token_amount, base_amount) = if self.reserves.token == 0 && self.reserves.base == 0 {
            (token_desired, base_desired)
        } else {
            let base_optimal = mul_div(token_desired, self.reserves.base, self.reserves.token)
                .ok_or(RouterError::Overflow)?;
            if base_optimal <= base_desired {
                (token_desired, base_optimal)
            } else {
                let token_optimal = mul_div(base_desired, self.reserves.token, self.reserves.base)
                    .ok_or(RouterError::Overflow)?;
                (token_optimal, base_desired)
            }
        };
        if token_amount == 0 || base_amount == 0 {
            return Err(RouterError::InsufficientOutput);
        }
        let available = self.base_balance_of(from);
        if available < base_amount {
            return Err(RouterError::InsufficientBase {
                available,
                requested: base_amount,
            });
        }

        let router = self.address;
        let receipt = token.transfer_from(self, router, from, pair, token_amount)?;
        let deposited = receipt.received;

        let liquidity = if self.lp_supply == 0 {
            (U256::from(deposited) * U256::from(base_amount))
                .integer_sqrt()
                .as_u128()
        } else {
            let by_token = mul_div(deposited, self.lp_supply, self.reserves.token)
                .ok_or(RouterError::Overflow)?;
            let by_base = mul_div(base_amount, self.lp_supply, self.reserves.base)
                .ok_or(RouterError::Overflow)?;
            by_token.min(by_base)
        };

        self.debit_base(from, base_amount)?;
        self.reserves.token = self
            .reserves
            .token
            .checked_add(deposited)
            .ok_or(RouterError::Overflow)?;
        self.reserves.base = self
            .reserves
            .base
            .checked_add(base_amount)
            .ok_or(RouterError::Overflow)?;
        *self.lp_balances.entry(lp_to).or_insert(0) += liquidity;
        self.lp_supply += liquidity;

        debug!(
            provider = %from,
            token_amount = deposited,
            base_amount,
            liquidity,
            "liquidity added"
        );
        Ok(LiquidityAdded {
            token_amount,
            base_amount,
            liquidity,
        })
    }

    fn transfer_base(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), RouterError> {
        self.debit_base(from, amount)?;
        self.credit_base(to, amount);
        Ok(())
    }

    fn base_balance_of(&self, account: Address) -> Amount {
        self.base_balances.get(&account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_product_quote_takes_fee() {
        // 9_970_000 * 1e6 / (1e10 + 9_970_000)
        assert_eq!(constant_product_out(1_000, 1_000_000, 1_000_000).unwrap(), 996);
    }

    #[test]
    fn empty_reserves_rejected() {
        assert!(matches!(
            constant_product_out(1, 0, 10),
            Err(RouterError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn create_pair_is_idempotent() {
        let mut pool = SimulatedPool::new(Address::from_label("router"));
        let token = Address::from_label("token");
        let first = pool.create_pair(token);
        assert_eq!(pool.create_pair(token), first);
        assert_ne!(first, pool.address());
    }

    #[test]
    fn base_transfers_are_checked() {
        let mut pool = SimulatedPool::new(Address::from_label("router"));
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        pool.fund_base(alice, 10);
        pool.transfer_base(alice, bob, 4).unwrap();
        assert_eq!(pool.base_balance_of(bob), 4);
        assert!(matches!(
            pool.transfer_base(alice, bob, 7),
            Err(RouterError::InsufficientBase { available: 6, requested: 7 })
        ));
    }
}
