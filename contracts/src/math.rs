//! Checked arithmetic helpers.
//!
//! Token amounts fit comfortably in `u128`, but products of two amounts
//! (proceeds splits, constant-product quotes) do not. Those go through a
//! 256-bit intermediate.

use primitive_types::U256;

use crate::Amount;

/// `floor(a * b / denom)`, or `None` if `denom == 0` or the result does not
/// fit in 128 bits.
pub fn mul_div(a: Amount, b: Amount, denom: Amount) -> Option<Amount> {
    if denom == 0 {
        return None;
    }
    let result = U256::from(a) * U256::from(b) / U256::from(denom);
    if result > U256::from(u128::MAX) {
        return None;
    }
    Some(result.as_u128())
}

/// Returns `true` if `part > whole * percent / 100`, compared exactly.
pub fn exceeds_percent(part: Amount, whole: Amount, percent: u8) -> bool {
    U256::from(part) * U256::from(100u8) > U256::from(whole) * U256::from(percent)
}
