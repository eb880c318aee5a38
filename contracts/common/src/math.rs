//! Mathematical Utilities for the Union Credit Ledger
//!
//! Safe math and WAD (1e18) fixed-point helpers. Products of two 18-decimal
//! amounts overflow `u128` quickly, so `mul_div` keeps a 256-bit
//! intermediate and only fails if the final quotient does not fit.

use crate::constants::precision::WAD;
use crate::errors::{UnionError, UnionResult};

/// Full 128x128 -> 256 bit product as (high, low)
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let mask = u64::MAX as u128;
    let (a_lo, a_hi) = (a & mask, a >> 64);
    let (b_lo, b_hi) = (b & mask, b >> 64);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // At most 3 * (2^64 - 1), no overflow
    let mid = (ll >> 64) + (lh & mask) + (hl & mask);
    let lo = (ll & mask) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Divide a 256-bit value by a 128-bit divisor, returning (quotient, remainder)
fn div_wide(hi: u128, lo: u128, divisor: u128) -> UnionResult<(u128, u128)> {
    if divisor == 0 {
        return Err(UnionError::DivisionByZero);
    }
    if hi == 0 {
        return Ok((lo / divisor, lo % divisor));
    }
    if hi >= divisor {
        return Err(UnionError::Overflow);
    }

    // Restoring long division, one bit of `lo` at a time
    let mut rem = hi;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quotient |= 1;
        }
    }
    Ok((quotient, rem))
}

/// `a * b / denominator`, rounded down
pub fn mul_div(a: u128, b: u128, denominator: u128) -> UnionResult<u128> {
    let (hi, lo) = mul_wide(a, b);
    div_wide(hi, lo, denominator).map(|(q, _)| q)
}

/// `a * b / denominator`, rounded up
pub fn mul_div_up(a: u128, b: u128, denominator: u128) -> UnionResult<u128> {
    let (hi, lo) = mul_wide(a, b);
    let (q, r) = div_wide(hi, lo, denominator)?;
    if r > 0 {
        q.checked_add(1).ok_or(UnionError::Overflow)
    } else {
        Ok(q)
    }
}

/// `a * b / WAD`
pub fn wad_mul(a: u128, b: u128) -> UnionResult<u128> {
    mul_div(a, b, WAD)
}

/// `a * WAD / b`
pub fn wad_div(a: u128, b: u128) -> UnionResult<u128> {
    mul_div(a, WAD, b)
}

/// `a * WAD / b`, rounded up
pub fn wad_div_up(a: u128, b: u128) -> UnionResult<u128> {
    mul_div_up(a, WAD, b)
}

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> UnionResult<u128> {
    a.checked_add(b).ok_or(UnionError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> UnionResult<u128> {
    a.checked_sub(b).ok_or(UnionError::Underflow)
}

/// Smallest of three values
pub fn min3(a: u128, b: u128, c: u128) -> u128 {
    a.min(b).min(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div(10, 20, 7).unwrap(), 28);
        assert_eq!(mul_div_up(10, 20, 7).unwrap(), 29);
        assert_eq!(mul_div_up(10, 21, 7).unwrap(), 30);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 1e24 * 1e20 overflows u128 but the quotient fits
        let a = 1_000_000 * ONE;
        let b = 100 * ONE;
        assert_eq!(mul_div(a, b, ONE).unwrap(), 100_000_000 * ONE);

        let max = u128::MAX;
        assert_eq!(mul_div(max, max, max).unwrap(), max);
        assert_eq!(mul_div(max, 3, 3).unwrap(), max);
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(UnionError::Overflow));
        assert_eq!(mul_div(1, 1, 0), Err(UnionError::DivisionByZero));
    }

    #[test]
    fn test_wad_helpers() {
        // 5,000 * 0.5% = 25
        let fee = wad_mul(5_000 * ONE, 5_000_000_000_000_000).unwrap();
        assert_eq!(fee, 25 * ONE);

        // 1 / 3 rounds down, the up variant rounds up
        assert_eq!(wad_div(1, 3).unwrap(), 333_333_333_333_333_333);
        assert_eq!(wad_div_up(1, 3).unwrap(), 333_333_333_333_333_334);
    }

    #[test]
    fn test_safe_ops() {
        assert_eq!(safe_add(u128::MAX, 1), Err(UnionError::Overflow));
        assert_eq!(safe_sub(0, 1), Err(UnionError::Underflow));
        assert_eq!(min3(3, 1, 2), 1);
    }
}
