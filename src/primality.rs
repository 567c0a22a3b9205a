//! Miller-Rabin probable-prime testing.
//!
//! Used for the human-readable output (flagging any candidate a 20-round
//! check rejects) and for classifying clear channels; the sieve itself
//! never depends on it.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::One;
use rand::Rng;

/// Default witness rounds for display and classification checks.
pub const DEFAULT_ROUNDS: u32 = 20;

/// Miller-Rabin probabilistic primality test. Negative numbers are never
/// prime.
pub fn is_probably_prime(n: &BigInt, rounds: u32) -> bool {
    match n.to_biguint() {
        Some(n) => is_probably_prime_uint(&n, rounds),
        None => false,
    }
}

fn is_probably_prime_uint(n: &BigUint, rounds: u32) -> bool {
    let one = BigUint::one();
    let two = &one + &one;
    let three = &two + &one;

    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as 2^r * d
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r: u32 = 0;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    let mut rng = rand::thread_rng();

    'witness: for _ in 0..rounds {
        // Random a in [2, n-2]
        let a = loop {
            let bytes = n.to_bytes_be();
            let mut random_bytes = vec![0u8; bytes.len()];
            rng.fill(&mut random_bytes[..]);
            let a = BigUint::from_bytes_be(&random_bytes) % n;
            if a >= two && a <= &n_minus_1 - &one {
                break a;
            }
        };

        let mut x = a.modpow(&d, n);

        if x == one || x == n_minus_1 {
            continue 'witness;
        }

        for _ in 0..r - 1 {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn test_small_values() {
        assert!(!is_probably_prime(&big(0), DEFAULT_ROUNDS));
        assert!(!is_probably_prime(&big(1), DEFAULT_ROUNDS));
        assert!(is_probably_prime(&big(2), DEFAULT_ROUNDS));
        assert!(is_probably_prime(&big(3), DEFAULT_ROUNDS));
        assert!(!is_probably_prime(&big(49), DEFAULT_ROUNDS));
        assert!(is_probably_prime(&big(104_729), DEFAULT_ROUNDS));
        assert!(!is_probably_prime(&big(-7), DEFAULT_ROUNDS));
    }

    #[test]
    fn test_first_sextuplet_members() {
        // The sextuplet in Template 535: 16057 + {0,4,6,10,12,16}.
        for offset in [0i64, 4, 6, 10, 12, 16] {
            assert!(is_probably_prime(&big(16_057 + offset), DEFAULT_ROUNDS));
        }
        assert!(!is_probably_prime(&big(16_059), DEFAULT_ROUNDS));
    }

    #[test]
    fn test_large_known_prime() {
        // One member of the sextuplet at TNumber 194091003877655.
        let p: BigInt = "5822730116329657".parse().unwrap();
        assert!(is_probably_prime(&p, DEFAULT_ROUNDS));
        let q: BigInt = "5822730116329659".parse().unwrap();
        assert!(!is_probably_prime(&q, DEFAULT_ROUNDS));
    }
}
