//! Residue kernel: crossing offsets, effective TNumbers, n-from-T, and
//! critical lengths for the families >= 31.
//!
//! A family member at inflation level n is `p + 30n`; it first strikes at
//! its "effective" TNumber, the Template holding `(p + 30n)²`. The
//! crossing offset of a target TNumber into the member's natural
//! progression is computed three equivalent ways; the simple form is the
//! one used in the sieve's hot path, the other two exist as checks.

use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{Signed, Zero};

use crate::gte31::PrimeGte31;
use crate::template::{int_to_tnum, tnum_to_int, TEMPLATE_LEN};
use crate::SieveError;

/// Crossing number of modulus `m` at integer `x`: `(m − (x mod m)) mod m`.
pub fn crossing_at_int(m: &BigInt, x: &BigInt) -> BigInt {
    (m - x.mod_floor(m)).mod_floor(m)
}

/// Crossing number of modulus `m` at the first integer of Template `t`.
pub fn crossing_at_tnum(m: &BigInt, t: &BigInt) -> BigInt {
    crossing_at_int(m, &tnum_to_int(t))
}

/// Offset of `t` into the natural progression of `p + 30n`, simple form:
/// `(t − (start_T − p) − (p mod 30)·n) mod (p + 30n)`.
///
/// No validation: callers in hot loops guarantee `t` is at or past the
/// member's effective TNumber.
pub fn crossing_mod_simple(t: &BigInt, n: &BigInt, p: &PrimeGte31) -> BigInt {
    let member = p.member_at(n);
    (t - p.s_minus_p() - p.mod30() * n).mod_floor(&member)
}

/// Offset of `t` into the natural progression of `p + 30n`, direct form:
/// `(t mod (p + 30n)) − (n + 1)·(p mod 30) − mod_const`, corrected back
/// into range once if negative. The subtrahend is always below the
/// member, so a single correction suffices.
pub fn crossing_mod_direct(t: &BigInt, n: &BigInt, p: &PrimeGte31) -> BigInt {
    let member = p.member_at(n);
    let mut offset: BigInt = t.mod_floor(&member) - (n + 1i64) * p.mod30() - p.mod_const();
    if offset.is_negative() {
        offset += &member;
    }
    offset
}

/// Offset of `t` into the natural progression of `p + 30n`, reference
/// form via the effective TNumber and explicit division. Slow; used for
/// cross-checking the other two.
pub fn crossing_mod_reference(t: &BigInt, n: &BigInt, p: &PrimeGte31) -> BigInt {
    let member = p.member_at(n);
    let effective = effective_tnum(n, p);
    let div = (t - &effective).div_floor(&member);
    t - (div * &member + &effective)
}

/// TNumber holding `(p + 30n)²`: `start_T + 2pn + 30n²`.
pub fn effective_tnum(n: &BigInt, p: &PrimeGte31) -> BigInt {
    p.start_tnum() + 2 * p.value() * n + TEMPLATE_LEN * n * n
}

/// Same as [`effective_tnum`], computed the obvious way.
pub fn effective_tnum_simple(n: &BigInt, p: &PrimeGte31) -> BigInt {
    let member = p.member_at(n);
    int_to_tnum(&(&member * &member))
}

/// Largest n such that `(p + 30n)² <= 30t + 24`, i.e. how many members of
/// the family must be tested against Template `t`.
///
/// Closed form `⌊(√(30t + 1|19) − p) / 30⌋` with the additive constant
/// picked by the last digit of p²; the square root is the exact integer
/// floor root, so the result is correct at any magnitude. Negative for
/// TNumbers below the family's start.
pub fn n_from_tnum(t: &BigInt, p: &PrimeGte31) -> BigInt {
    let add: u64 = if p.squared_ends_in_1() { 1 } else { 19 };
    let root = (t * TEMPLATE_LEN + add).sqrt();
    (root - p.value()).div_floor(&BigInt::from(TEMPLATE_LEN))
}

/// [`n_from_tnum`] for a number-line integer instead of a TNumber.
pub fn n_from_int(x: &BigInt, p: &PrimeGte31) -> BigInt {
    n_from_tnum(&int_to_tnum(x), p)
}

/// Independent derivation of [`n_from_tnum`]: floor-root the last integer
/// of the Template directly, then correct against the defining
/// inequality. The two must always agree.
pub fn n_from_tnum_checked(t: &BigInt, p: &PrimeGte31) -> BigInt {
    let last: BigInt = t * TEMPLATE_LEN + 24u64;
    let mut n = (last.sqrt() - p.value()).div_floor(&BigInt::from(TEMPLATE_LEN));
    loop {
        let next = p.member_at(&(&n + 1));
        if &next * &next > last {
            break;
        }
        n += 1;
    }
    loop {
        let cur = p.member_at(&n);
        if &cur * &cur <= last || n.is_negative() {
            break;
        }
        n -= 1;
    }
    n
}

/// Templates between member N and member N + diff of one family, toward
/// infinity: `diff · (2p + 30·diff + 60·N)`.
pub fn crit_length_positive(
    p: &PrimeGte31,
    n_fixed: &BigInt,
    diff: &BigInt,
) -> Result<BigInt, SieveError> {
    if diff < &BigInt::from(1) {
        return Err(SieveError::invalid(
            "critical length difference must be >= 1",
        ));
    }
    Ok(diff * (2 * p.value() + TEMPLATE_LEN * diff + 2 * TEMPLATE_LEN * n_fixed))
}

/// Templates between member N and member N − diff, toward zero:
/// `diff · (2p − 30·diff + 60·N)`.
pub fn crit_length_negative(
    p: &PrimeGte31,
    n_fixed: &BigInt,
    diff: &BigInt,
) -> Result<BigInt, SieveError> {
    if diff < &BigInt::from(1) {
        return Err(SieveError::invalid(
            "critical length difference must be >= 1",
        ));
    }
    if (n_fixed - diff).is_negative() {
        return Err(SieveError::invalid(format!(
            "n {} minus difference {} goes below zero",
            n_fixed, diff
        )));
    }
    Ok(diff * (2 * p.value() - TEMPLATE_LEN * diff + 2 * TEMPLATE_LEN * n_fixed))
}

/// Templates between members `from_n` and `to_n` of one family, either
/// direction.
pub fn crit_length(
    p: &PrimeGte31,
    from_n: &BigInt,
    to_n: &BigInt,
) -> Result<BigInt, SieveError> {
    if from_n == to_n {
        return Err(SieveError::invalid("from n and to n can not be equal"));
    }
    if from_n.is_negative() || to_n.is_negative() {
        return Err(SieveError::invalid("n values must be 0 or greater"));
    }
    let diff = (from_n - to_n).abs();
    if from_n < to_n {
        crit_length_positive(p, from_n, &diff)
    } else {
        crit_length_negative(p, from_n, &diff)
    }
}

/// Templates covered by a signed difference from member N.
pub fn crit_length_by_diff(
    p: &PrimeGte31,
    n_fixed: &BigInt,
    diff: &BigInt,
) -> Result<BigInt, SieveError> {
    if n_fixed.is_negative() {
        return Err(SieveError::invalid("n must be 0 or greater"));
    }
    if diff.is_zero() {
        return Err(SieveError::invalid(
            "difference can be positive or negative, but not 0",
        ));
    }
    if (n_fixed + diff).is_negative() {
        return Err(SieveError::invalid(format!(
            "difference {} combined with n {} goes below 0",
            diff, n_fixed
        )));
    }
    let abs = diff.abs();
    if diff.is_positive() {
        crit_length_positive(p, n_fixed, &abs)
    } else {
        crit_length_negative(p, n_fixed, &abs)
    }
}
