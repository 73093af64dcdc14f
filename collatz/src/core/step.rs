//! The three stopping-time step functions.
//!
//! Each function is written once, generic over an [`Arithmetic`] strategy:
//! [`Wrapping`] reproduces the unchecked 64-bit contract and cannot fail,
//! [`Checked`] reports the first intermediate value that would not fit.
//!
//! All variants agree with [`baseline`] on `raw_steps` and `peak` for every
//! input whose trajectory stays below 2^64. `n` must be non-zero.

use std::convert::Infallible;

use crate::core::divisibility::is_divisible_by_six;
use crate::core::types::ResultTriple;

/// An intermediate value did not fit in 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOverflow;

/// The growing operations the step functions perform.
pub trait Arithmetic {
    type Error;

    /// `3n + 1`
    fn triple_plus_one(n: u64) -> Result<u64, Self::Error>;
    /// `3n`
    fn triple(n: u64) -> Result<u64, Self::Error>;
    /// `a + b`
    fn add(a: u64, b: u64) -> Result<u64, Self::Error>;
    /// `2n`
    fn double(n: u64) -> Result<u64, Self::Error>;
}

/// Modulo-2^64 arithmetic.
#[derive(Debug)]
pub enum Wrapping {}

impl Arithmetic for Wrapping {
    type Error = Infallible;

    #[inline]
    fn triple_plus_one(n: u64) -> Result<u64, Infallible> {
        Ok((n << 1).wrapping_add(n).wrapping_add(1))
    }

    #[inline]
    fn triple(n: u64) -> Result<u64, Infallible> {
        Ok((n << 1).wrapping_add(n))
    }

    #[inline]
    fn add(a: u64, b: u64) -> Result<u64, Infallible> {
        Ok(a.wrapping_add(b))
    }

    #[inline]
    fn double(n: u64) -> Result<u64, Infallible> {
        Ok(n << 1)
    }
}

/// Overflow-detecting arithmetic.
#[derive(Debug)]
pub enum Checked {}

impl Arithmetic for Checked {
    type Error = ArithmeticOverflow;

    #[inline]
    fn triple_plus_one(n: u64) -> Result<u64, ArithmeticOverflow> {
        n.checked_mul(3)
            .and_then(|tripled| tripled.checked_add(1))
            .ok_or(ArithmeticOverflow)
    }

    #[inline]
    fn triple(n: u64) -> Result<u64, ArithmeticOverflow> {
        n.checked_mul(3).ok_or(ArithmeticOverflow)
    }

    #[inline]
    fn add(a: u64, b: u64) -> Result<u64, ArithmeticOverflow> {
        a.checked_add(b).ok_or(ArithmeticOverflow)
    }

    #[inline]
    fn double(n: u64) -> Result<u64, ArithmeticOverflow> {
        n.checked_mul(2).ok_or(ArithmeticOverflow)
    }
}

/// Divide out the largest power of two. Returns the odd part and the exponent.
///
/// Zero (reachable only through wrapping) maps to zero.
#[inline]
fn strip_twos(n: u64) -> (u64, u64) {
    let exponent = n.trailing_zeros();
    (n.checked_shr(exponent).unwrap_or(0), u64::from(exponent))
}

/// `f`: one step per `3n+1` or `n/2`.
pub fn baseline(n: u64) -> ResultTriple {
    let Ok(triple) = baseline_with::<Wrapping>(n);
    triple
}

/// `g`: one reduced step per `3n+1` plus the halvings that follow it.
pub fn reduced_odd(n: u64) -> ResultTriple {
    let Ok(triple) = reduced_odd_with::<Wrapping>(n);
    triple
}

/// `h`: one reduced step per maximal run of `(3n+1)/2` on odd values.
pub fn reduced_odd_secondary(n: u64) -> ResultTriple {
    let Ok(triple) = reduced_odd_secondary_with::<Wrapping>(n);
    triple
}

pub fn baseline_with<A: Arithmetic>(mut n: u64) -> Result<ResultTriple, A::Error> {
    let mut steps = 0;
    let mut peak = n;
    while n != 1 {
        if n & 1 == 1 {
            n = A::triple_plus_one(n)?;
        } else {
            n >>= 1;
        }
        peak = peak.max(n);
        steps += 1;
    }
    Ok(ResultTriple::new(steps, steps, peak))
}

pub fn reduced_odd_with<A: Arithmetic>(n: u64) -> Result<ResultTriple, A::Error> {
    let mut peak = n;
    let (mut n, mut raw, mut reduced) = odd_start(n);
    while n != 1 {
        let tripled = A::triple_plus_one(n)?;
        peak = peak.max(tripled);
        let (odd, halvings) = strip_twos(tripled);
        n = odd;
        raw += 1 + halvings;
        reduced += 1;
    }
    Ok(ResultTriple::new(reduced, raw, peak))
}

pub fn reduced_odd_secondary_with<A: Arithmetic>(n: u64) -> Result<ResultTriple, A::Error> {
    let mut peak = n;
    let (mut n, mut raw, mut reduced) = odd_start(n);
    while n != 1 {
        // For odd n, (n >> 1) + 1 == (n+1)/2 and 3 * (n+1)/2 is one more
        // than (3n+1)/2.
        let mut shifted = A::triple((n >> 1) + 1)?;
        raw += 2;
        // Divisible by 6 means the value it stands for is odd again, so
        // (3v+1)/2 applies once more; on the shifted value that is a 3/2 scale.
        while is_divisible_by_six(shifted) {
            shifted = A::add(shifted >> 1, shifted)?;
            raw += 2;
        }
        // shifted >= 3
        let even = shifted - 1;
        // The last 3v+1 of the run is the largest value it visits.
        peak = peak.max(A::double(even)?);
        let (odd, halvings) = strip_twos(even);
        n = odd;
        raw += halvings;
        reduced += 1;
        peak = peak.max(n);
    }
    Ok(ResultTriple::new(reduced, raw, peak))
}

/// Strip a leading power of two from an even start, charging one reduced step.
fn odd_start(n: u64) -> (u64, u64, u64) {
    if n & 1 == 1 {
        return (n, 0, 0);
    }
    let (odd, halvings) = strip_twos(n);
    (odd, halvings, 1)
}
