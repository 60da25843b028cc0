//! Ownership share arithmetic.
//!
//! Shares are exact fractions. Basis points round down, so the basis points
//! of all members never sum above 10000.

use coffer_types::{Amount, BPS_DENOMINATOR};

/// Exact fraction of the tracked pool owned by one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub numerator: Amount,
    pub denominator: Amount,
}

impl Share {
    pub fn new(numerator: Amount, denominator: Amount) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0 || self.denominator == 0
    }

    /// Floor of the share in basis points, within `[0, 10000]`.
    pub fn bps(&self) -> u64 {
        if self.is_zero() {
            return 0;
        }
        let bps = mul_div_floor(self.numerator, Amount::from(BPS_DENOMINATOR), self.denominator);
        bps.min(Amount::from(BPS_DENOMINATOR)) as u64
    }
}

/// `floor(a * b / d)` without intermediate overflow. `d` must be non-zero
/// and the quotient must fit in 128 bits.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> u128 {
    if let Some(product) = a.checked_mul(b) {
        return product / d;
    }

    // Bitwise long division of the 256-bit product
    let (hi, lo) = widening_mul(a, b);
    let mut quotient: u128 = 0;
    let mut rem: u128 = 0;
    for i in (0..256u32).rev() {
        let bit = if i >= 128 { (hi >> (i - 128)) & 1 } else { (lo >> i) & 1 };
        let carry = rem >> 127;
        rem = (rem << 1) | bit;
        quotient <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1;
        }
    }
    quotient
}

/// Full 256-bit product as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (ll & MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}
