//! Template/TNumber arithmetic.
//!
//! A Template is a block of 30 consecutive integers; Template Number T
//! covers `[30T − 5, 30T + 24]`, so T = 1 covers `[25..54]`. Exactly eight
//! residues mod 30 survive the 2/3/5 sieve, and six of them, the offsets
//! {12, 16, 18, 22, 24, 28} past `30T − 5`, form the sextuplet pattern.
//!
//! The 29-basis is the TNumber window `[28, 215 656 468]` of length
//! 7·11·13·17·19·23·29 = 215 656 441; basis k is the same window shifted
//! by k basis lengths.

use num_bigint::BigInt;
use num_integer::Integer;

use crate::SieveError;

/// Length of a Template.
pub const TEMPLATE_LEN: u64 = 30;

/// First TNumber of basis 0 (the start Template of prime 29).
pub const BASIS_BEGIN: u64 = 28;

/// Length of the 29-basis: 7·11·13·17·19·23·29.
pub const BASIS_LEN: u64 = 215_656_441;

/// Last TNumber of basis 0.
pub const BASIS_END: u64 = 215_656_468;

/// First integer covered by basis 0 (first integer of TNumber 28).
pub const FIRST_BASIS_INT: u64 = 835;

/// The six candidate offsets past `30T − 5` forming the sextuplet pattern.
pub const CANDIDATE_OFFSETS: [u64; 6] = [12, 16, 18, 22, 24, 28];

/// First integer of Template `t`: `30t − 5`.
pub fn tnum_to_int(t: &BigInt) -> BigInt {
    t * TEMPLATE_LEN - 5
}

/// TNumber containing integer `x`: `⌊(x + 5) / 30⌋`.
pub fn int_to_tnum(x: &BigInt) -> BigInt {
    (x + 5i64).div_floor(&BigInt::from(TEMPLATE_LEN))
}

/// Last integer of Template `t`: `30t + 24`.
pub fn tnum_last_int(t: &BigInt) -> BigInt {
    t * TEMPLATE_LEN + 24
}

/// First and last TNumber of basis `k` (0-based).
pub fn basis_to_tnum_range(basis: &BigInt) -> (BigInt, BigInt) {
    let shift = basis * BASIS_LEN;
    (&shift + BASIS_BEGIN, shift + BASIS_END)
}

/// Basis number containing TNumber `t`. Errors below the first basis.
pub fn tnum_to_basis(t: &BigInt) -> Result<BigInt, SieveError> {
    if *t < BigInt::from(BASIS_BEGIN) {
        return Err(SieveError::invalid(format!(
            "TNumber {} is below the first basis TNumber {}",
            t, BASIS_BEGIN
        )));
    }
    Ok((t - BASIS_BEGIN).div_floor(&BigInt::from(BASIS_LEN)))
}

/// Basis number containing integer `x`. Errors below integer 835.
pub fn int_to_basis(x: &BigInt) -> Result<BigInt, SieveError> {
    if *x < BigInt::from(FIRST_BASIS_INT) {
        return Err(SieveError::invalid(format!(
            "integer {} is below the first basis integer {}",
            x, FIRST_BASIS_INT
        )));
    }
    tnum_to_basis(&int_to_tnum(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn test_tnum_int_conversions() {
        assert_eq!(tnum_to_int(&big(1)), big(25));
        assert_eq!(tnum_last_int(&big(1)), big(54));
        assert_eq!(int_to_tnum(&big(25)), big(1));
        assert_eq!(int_to_tnum(&big(54)), big(1));
        assert_eq!(int_to_tnum(&big(55)), big(2));
        assert_eq!(tnum_to_int(&big(28)), big(835));
    }

    #[test]
    fn test_round_trip_dense_window() {
        for t in 1..=100_000i64 {
            let t = big(t);
            let x = tnum_to_int(&t);
            assert_eq!(int_to_tnum(&x), t);
            assert_eq!(x.mod_floor(&big(30)), big(25));
        }
    }

    #[test]
    fn test_round_trip_large() {
        let t: BigInt = "194091003877655194091003877655194091003877655"
            .parse()
            .unwrap();
        assert_eq!(int_to_tnum(&tnum_to_int(&t)), t);
        assert_eq!(tnum_to_int(&t).mod_floor(&big(30)), big(25));
    }

    #[test]
    fn test_basis_ranges() {
        assert_eq!(
            basis_to_tnum_range(&big(0)),
            (big(28), big(215_656_468))
        );
        assert_eq!(
            basis_to_tnum_range(&big(1)),
            (big(215_656_469), big(431_312_909))
        );
        assert_eq!(tnum_to_basis(&big(28)).unwrap(), big(0));
        assert_eq!(tnum_to_basis(&big(215_656_468)).unwrap(), big(0));
        assert_eq!(tnum_to_basis(&big(215_656_469)).unwrap(), big(1));
        assert!(tnum_to_basis(&big(27)).is_err());
    }

    #[test]
    fn test_int_to_basis_bounds() {
        assert_eq!(int_to_basis(&big(835)).unwrap(), big(0));
        assert!(int_to_basis(&big(834)).is_err());
    }

    #[test]
    fn test_basis_len_factorization() {
        assert_eq!(7u64 * 11 * 13 * 17 * 19 * 23 * 29, BASIS_LEN);
        assert_eq!(BASIS_BEGIN + BASIS_LEN - 1, BASIS_END);
    }
}
