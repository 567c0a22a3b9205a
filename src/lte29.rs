//! The basis primes {7, 11, 13, 17, 19, 23, 29}.
//!
//! These seven primes jointly generate the 29-basis: their combined
//! crossing pattern repeats every 7·11·13·17·19·23·29 Template Numbers,
//! and walking one period records every Template where a tuplet can still
//! exist anywhere on the number line.
//!
//! Each prime's "natural progression" is the sequence of crossing
//! residues as T advances from the prime's start Template; it is a
//! permutation of 0..p−1, so a rolling index replaces per-Template
//! modular arithmetic in the generator loop.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

use crate::symbol::Symbol;
use crate::SieveError;

/// The basis primes, ascending.
pub const LTE29_PRIMES: [u32; 7] = [7, 11, 13, 17, 19, 23, 29];

/// One basis prime: value, start Template, natural progression, and the
/// effect celebrated at each progression position.
#[derive(Debug, Clone)]
pub struct PrimeLte29 {
    value: u32,
    value_squared: u32,
    start_tnum: u32,
    natural_progression: Vec<u32>,
    effects_by_index: Vec<Symbol>,
}

impl PrimeLte29 {
    pub fn new(value: u32) -> Result<PrimeLte29, SieveError> {
        if !LTE29_PRIMES.contains(&value) {
            return Err(SieveError::invalid(format!(
                "{} is not a legal basis prime",
                value
            )));
        }
        let value_squared = value * value;
        let start_tnum = (value_squared + 5) / 30;

        let natural_progression: Vec<u32> = (0..value)
            .map(|i| {
                let first_int = 30 * (start_tnum + i) as i64 - 5;
                ((value as i64 - first_int % value as i64) % value as i64) as u32
            })
            .collect();
        let effects_by_index = natural_progression
            .iter()
            .map(|&crossing| effect_at_crossing(value, crossing))
            .collect();

        Ok(PrimeLte29 {
            value,
            value_squared,
            start_tnum,
            natural_progression,
            effects_by_index,
        })
    }

    /// All seven basis primes in ascending order.
    pub fn all_primes() -> Vec<PrimeLte29> {
        LTE29_PRIMES
            .iter()
            .map(|&p| PrimeLte29::new(p).expect("canonical basis primes are legal"))
            .collect()
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn value_squared(&self) -> u32 {
        self.value_squared
    }

    pub fn start_tnum(&self) -> u32 {
        self.start_tnum
    }

    pub fn natural_progression(&self) -> &[u32] {
        &self.natural_progression
    }

    /// Effect at progression index `idx` (the generator's fast path).
    pub fn effect_at_index(&self, idx: usize) -> Symbol {
        self.effects_by_index[idx]
    }

    /// Crossing residue of this prime at Template `t`.
    pub fn crossing_at_tnum(&self, t: &BigInt) -> u32 {
        let first_int = t * 30u32 - 5u32;
        let rem = first_int
            .mod_floor(&BigInt::from(self.value))
            .to_u32()
            .expect("residue below prime value");
        (self.value - rem) % self.value
    }

    /// Index of Template `t`'s crossing within the natural progression.
    pub fn progression_index(&self, t: &BigInt) -> usize {
        let crossing = self.crossing_at_tnum(t);
        self.natural_progression
            .iter()
            .position(|&c| c == crossing)
            .expect("progression is a permutation of 0..p-1")
    }
}

/// Effect of a basis prime crossing at residue `crossing`.
///
/// Fixed per-prime maps, derived on paper against the 2/3/5 Template:
/// one residue clips the right end (left quint survives), one clips the
/// left end (right quint survives), four land inside and destroy, and
/// every other residue leaves the sextuplet untouched.
pub fn effect_at_crossing(prime: u32, crossing: u32) -> Symbol {
    use Symbol::*;
    match prime {
        7 => match crossing {
            0 => LQuint29,
            1 | 2 | 3 | 4 => Destroyed,
            5 => RQuint13,
            _ => Sextuplet,
        },
        11 => match crossing {
            6 => LQuint29,
            0 | 2 | 5 | 7 => Destroyed,
            1 => RQuint13,
            _ => Sextuplet,
        },
        13 => match crossing {
            2 => LQuint29,
            3 | 5 | 9 | 11 => Destroyed,
            12 => RQuint13,
            _ => Sextuplet,
        },
        17 => match crossing {
            11 => LQuint29,
            1 | 5 | 7 | 16 => Destroyed,
            12 => RQuint13,
            _ => Sextuplet,
        },
        19 => match crossing {
            9 => LQuint29,
            3 | 5 | 16 | 18 => Destroyed,
            12 => RQuint13,
            _ => Sextuplet,
        },
        23 => match crossing {
            5 => LQuint29,
            1 | 16 | 18 | 22 => Destroyed,
            12 => RQuint13,
            _ => Sextuplet,
        },
        29 => match crossing {
            28 => LQuint29,
            16 | 18 | 22 | 24 => Destroyed,
            12 => RQuint13,
            _ => Sextuplet,
        },
        _ => Sextuplet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_constructor_rejects_illegal_values() {
        assert!(PrimeLte29::new(5).is_err());
        assert!(PrimeLte29::new(31).is_err());
        assert!(PrimeLte29::new(7).is_ok());
    }

    #[test]
    fn test_start_tnums() {
        let starts: Vec<u32> = PrimeLte29::all_primes()
            .iter()
            .map(|p| p.start_tnum())
            .collect();
        assert_eq!(starts, [1, 4, 5, 9, 12, 17, 28]);
    }

    #[test]
    fn test_natural_progressions_golden() {
        let golden: [(u32, &[u32]); 7] = [
            (7, &[3, 1, 6, 4, 2, 0, 5]),
            (11, &[6, 9, 1, 4, 7, 10, 2, 5, 8, 0, 3]),
            (13, &[11, 7, 3, 12, 8, 4, 0, 9, 5, 1, 10, 6, 2]),
            (17, &[7, 11, 15, 2, 6, 10, 14, 1, 5, 9, 13, 0, 4, 8, 12, 16, 3]),
            (
                19,
                &[6, 14, 3, 11, 0, 8, 16, 5, 13, 2, 10, 18, 7, 15, 4, 12, 1, 9, 17],
            ),
            (
                23,
                &[
                    1, 17, 10, 3, 19, 12, 5, 21, 14, 7, 0, 16, 9, 2, 18, 11, 4, 20, 13,
                    6, 22, 15, 8,
                ],
            ),
            (
                29,
                &[
                    6, 5, 4, 3, 2, 1, 0, 28, 27, 26, 25, 24, 23, 22, 21, 20, 19, 18, 17,
                    16, 15, 14, 13, 12, 11, 10, 9, 8, 7,
                ],
            ),
        ];
        for (value, want) in golden {
            let p = PrimeLte29::new(value).unwrap();
            assert_eq!(p.natural_progression(), want, "p={}", value);
        }
    }

    #[test]
    fn test_progressions_are_permutations() {
        for p in PrimeLte29::all_primes() {
            let mut seen = vec![false; p.value() as usize];
            for &c in p.natural_progression() {
                assert!(!seen[c as usize], "duplicate crossing {} for p={}", c, p.value());
                seen[c as usize] = true;
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_effect_shape_per_prime() {
        for p in LTE29_PRIMES {
            let mut lquints = 0;
            let mut rquints = 0;
            let mut destroyed = 0;
            for crossing in 0..p {
                match effect_at_crossing(p, crossing) {
                    Symbol::LQuint29 => lquints += 1,
                    Symbol::RQuint13 => rquints += 1,
                    Symbol::Destroyed => destroyed += 1,
                    _ => {}
                }
            }
            assert_eq!((lquints, rquints, destroyed), (1, 1, 4), "p={}", p);
        }
    }

    #[test]
    fn test_progression_index_at_basis_start() {
        // Hand-checked seating offsets at the head of the basis,
        // TNumber 28.
        let want = [(7u32, 6usize), (11, 2), (13, 10), (17, 2), (19, 16), (23, 11), (29, 0)];
        let t28 = BigInt::from(28);
        for (value, idx) in want {
            let p = PrimeLte29::new(value).unwrap();
            assert_eq!(p.progression_index(&t28), idx, "p={}", value);
        }
    }

    #[test]
    fn test_crossing_tracks_progression() {
        for p in PrimeLte29::all_primes() {
            for i in 0..p.value() {
                let t = BigInt::from(p.start_tnum() + i);
                assert_eq!(
                    p.crossing_at_tnum(&t),
                    p.natural_progression()[i as usize],
                    "p={} i={}",
                    p.value(),
                    i
                );
            }
        }
    }
}
