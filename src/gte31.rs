//! The eight potPrime families {31, 37, 41, 43, 47, 49, 53, 59}.
//!
//! Every integer coprime to 30 above the basis primes is `p + 30n` for
//! exactly one family p and level n, so these eight families carry the
//! sieve out to any range. 49 is composite but its family spans the same
//! residue class a prime ≡ 19 (mod 30) would; composite members strike
//! redundantly with their smaller prime factors, so the family does no
//! harm and keeps the eight classes uniform.
//!
//! Per family, six lookup rows `(c, q, effect)` project the strike
//! positions of the base natural progression out to any inflation level:
//! member p + 30n strikes a Template at crossing offset `c + n·q`. The
//! row constants, the CQ model and its wait positions are hand-derived
//! and fixed.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::symbol::Symbol;
use crate::template::{int_to_tnum, TEMPLATE_LEN};
use crate::SieveError;

/// Family base values, canonical (ascending) order.
pub const GTE31_VALUES: [u32; 8] = [31, 37, 41, 43, 47, 49, 53, 59];

/// Strike positions per family within one period.
pub const LOOKUP_SIZE: usize = 6;

/// One lookup row: member p + 30n strikes crossing offset `c + n·q` with
/// `effect`.
#[derive(Debug, Clone, Copy)]
pub struct LookupRow {
    pub c: u32,
    pub q: u32,
    pub effect: Symbol,
}

/// One natural-progression position of the CQ model.
///
/// `q30` is the cumulative inflation multiplier up to this index; `wait`
/// marks positions sharing their multiplier with the previous one because
/// the member skipped a whole Template between them; `effect` is the
/// strike effect celebrated at this index (Sextuplet when none).
#[derive(Debug, Clone, Copy)]
pub struct CqEntry {
    pub q30: u32,
    pub wait: bool,
    pub effect: Symbol,
}

/// Immutable state of one potPrime family. Construct once, share by
/// reference.
#[derive(Debug, Clone)]
pub struct PrimeGte31 {
    value_u32: u32,
    value: BigInt,
    value_squared: BigInt,
    start_tnum: BigInt,
    mod30: BigInt,
    mod_const: BigInt,
    s_minus_p: BigInt,
    squared_ends_in_1: bool,
    has_insert_before_0: bool,
    sub_n: u8,
    lookup: [LookupRow; LOOKUP_SIZE],
    cq_model: Vec<CqEntry>,
}

struct FamilyConstants {
    has_insert_before_0: bool,
    lookup: [(u32, u32, Symbol); LOOKUP_SIZE],
    wait_positions: &'static [u32],
    cq_effects: [(u32, Symbol); LOOKUP_SIZE],
}

fn family_constants(value: u32) -> Option<FamilyConstants> {
    use Symbol::{Destroyed as X, LQuint29 as L, RQuint13 as R};
    let c = match value {
        31 => FamilyConstants {
            has_insert_before_0: false,
            lookup: [(6, 6, R), (10, 10, X), (12, 12, X), (16, 16, X), (18, 18, X), (22, 22, L)],
            wait_positions: &[24],
            cq_effects: [(6, R), (10, X), (12, X), (16, X), (18, X), (22, L)],
        },
        37 => FamilyConstants {
            has_insert_before_0: false,
            lookup: [(0, 0, X), (5, 4, X), (15, 12, X), (20, 16, X), (27, 22, L), (30, 24, R)],
            wait_positions: &[1, 7, 12, 17, 22, 28, 33],
            cq_effects: [(0, X), (5, X), (15, X), (20, X), (27, L), (30, R)],
        },
        41 => FamilyConstants {
            has_insert_before_0: true,
            lookup: [(2, 2, L), (8, 6, R), (16, 12, X), (24, 18, X), (27, 20, X), (35, 26, X)],
            wait_positions: &[3, 6, 10, 14, 18, 21, 25, 29, 32, 36, 39],
            cq_effects: [(2, L), (8, R), (16, X), (24, X), (27, X), (35, X)],
        },
        43 => FamilyConstants {
            has_insert_before_0: false,
            lookup: [(0, 0, X), (6, 4, X), (9, 6, R), (23, 16, X), (26, 18, X), (40, 28, L)],
            wait_positions: &[1, 4, 8, 11, 14, 17, 21, 24, 27, 31, 34, 37, 41],
            cq_effects: [(0, X), (6, X), (9, R), (23, X), (26, X), (40, L)],
        },
        47 => FamilyConstants {
            has_insert_before_0: false,
            lookup: [(0, 0, X), (3, 2, L), (19, 12, X), (22, 14, X), (38, 24, R), (41, 26, X)],
            wait_positions: &[1, 4, 6, 9, 12, 15, 17, 20, 23, 26, 28, 31, 34, 37, 40, 42, 45],
            cq_effects: [(0, X), (3, L), (19, X), (22, X), (38, R), (41, X)],
        },
        49 => FamilyConstants {
            has_insert_before_0: true,
            lookup: [(6, 4, X), (16, 10, X), (19, 12, X), (29, 18, X), (39, 24, R), (45, 28, L)],
            wait_positions: &[
                2, 4, 7, 9, 12, 15, 17, 20, 22, 25, 28, 30, 33, 35, 38, 40, 43, 46, 47,
            ],
            cq_effects: [(6, X), (16, X), (19, X), (29, X), (39, R), (45, L)],
        },
        53 => FamilyConstants {
            has_insert_before_0: false,
            lookup: [(0, 0, X), (11, 6, R), (14, 8, L), (25, 14, X), (32, 18, X), (46, 26, X)],
            wait_positions: &[
                1, 3, 5, 8, 10, 12, 15, 17, 19, 21, 24, 26, 28, 31, 33, 35, 38, 40, 42, 45,
                47, 49, 51,
            ],
            cq_effects: [(0, X), (11, R), (14, L), (25, X), (32, X), (46, X)],
        },
        59 => FamilyConstants {
            has_insert_before_0: true,
            lookup: [(15, 8, L), (23, 12, X), (27, 14, X), (35, 18, X), (39, 20, X), (47, 24, R)],
            wait_positions: &[
                1, 3, 5, 7, 9, 11, 14, 16, 18, 20, 22, 24, 26, 28, 30, 32, 34, 36, 38, 40,
                42, 44, 46, 48, 50, 52, 54, 56, 57,
            ],
            cq_effects: [(15, L), (23, X), (27, X), (35, X), (39, X), (47, R)],
        },
        _ => return None,
    };
    Some(c)
}

impl PrimeGte31 {
    pub fn new(value: u32) -> Result<PrimeGte31, SieveError> {
        let constants = family_constants(value).ok_or_else(|| {
            SieveError::invalid(format!("{} is not a legal family base value", value))
        })?;
        let sub_n = GTE31_VALUES.iter().position(|&v| v == value).unwrap() as u8;

        let value_big = BigInt::from(value);
        let value_squared = &value_big * &value_big;
        let start_tnum = int_to_tnum(&value_squared);
        let mod30 = BigInt::from(value % 30);
        // Unwinds Template-mod arithmetic back to plain mod arithmetic:
        // the family's offset into its own start Template, minus mod30.
        let mod_const = &start_tnum % &value_big - &mod30;
        let s_minus_p = &start_tnum - &value_big;
        let squared_ends_in_1 = (value * value) % 10 == 1;

        let lookup = constants
            .lookup
            .map(|(c, q, effect)| LookupRow { c, q, effect });

        let mut cq_model = vec![
            CqEntry {
                q30: 0,
                wait: false,
                effect: Symbol::Sextuplet,
            };
            value as usize
        ];
        let mut q30 = 0u32;
        let mut wait_iter = constants.wait_positions.iter().peekable();
        for (i, entry) in cq_model.iter_mut().enumerate() {
            entry.q30 = q30;
            if wait_iter.peek() == Some(&&(i as u32)) {
                entry.wait = true;
                wait_iter.next();
                continue;
            }
            q30 += 1;
        }
        for (idx, effect) in constants.cq_effects {
            cq_model[idx as usize].effect = effect;
        }

        Ok(PrimeGte31 {
            value_u32: value,
            value: value_big,
            value_squared,
            start_tnum,
            mod30,
            mod_const,
            s_minus_p,
            squared_ends_in_1,
            has_insert_before_0: constants.has_insert_before_0,
            sub_n,
            lookup,
            cq_model,
        })
    }

    /// All eight families in canonical order.
    pub fn all_families() -> Vec<PrimeGte31> {
        GTE31_VALUES
            .iter()
            .map(|&v| PrimeGte31::new(v).expect("canonical family values are legal"))
            .collect()
    }

    pub fn value(&self) -> &BigInt {
        &self.value
    }

    pub fn value_u32(&self) -> u32 {
        self.value_u32
    }

    pub fn value_squared(&self) -> &BigInt {
        &self.value_squared
    }

    pub fn start_tnum(&self) -> &BigInt {
        &self.start_tnum
    }

    pub fn mod30(&self) -> &BigInt {
        &self.mod30
    }

    pub fn mod_const(&self) -> &BigInt {
        &self.mod_const
    }

    pub fn s_minus_p(&self) -> &BigInt {
        &self.s_minus_p
    }

    pub fn squared_ends_in_1(&self) -> bool {
        self.squared_ends_in_1
    }

    pub fn has_insert_before_0(&self) -> bool {
        self.has_insert_before_0
    }

    /// Position in the canonical family ordering, 0..7.
    pub fn sub_n(&self) -> u8 {
        self.sub_n
    }

    pub fn lookup(&self) -> &[LookupRow; LOOKUP_SIZE] {
        &self.lookup
    }

    pub fn cq_model(&self) -> &[CqEntry] {
        &self.cq_model
    }

    /// Family member at level n: `p + 30n`.
    pub fn member_at(&self, n: &BigInt) -> BigInt {
        n * TEMPLATE_LEN + &self.value
    }

    /// Effect of member p + 30n on the Template at crossing `offset`, or
    /// `None` when the member passes it by.
    ///
    /// The probes `c + n·q` are strictly increasing across the six rows
    /// for any fixed n, so the scan stops at the first overshoot.
    pub fn strike_at(&self, offset: &BigInt, n: &BigInt) -> Option<Symbol> {
        for row in &self.lookup {
            let probe = n * row.q + row.c;
            if &probe < offset {
                continue;
            }
            if &probe > offset {
                return None;
            }
            return Some(row.effect);
        }
        None
    }

    /// Reconstruct the inflation-adjusted q for `offset` at level n by
    /// walking the CQ model. Returns `None` when the offset lands in
    /// inflation spacing (no effect possible there). O(p), for analysis
    /// and cross-checking only; the lookup rows are the production path.
    pub fn q_by_reverse_inflation(
        &self,
        n: &BigInt,
        offset: &BigInt,
    ) -> Result<Option<BigInt>, SieveError> {
        let member = self.member_at(n);
        if n.is_negative() || offset.is_negative() || offset >= &member {
            return Err(SieveError::invalid(format!(
                "n ({}) must be >= 0 and offset ({}) must be >= 0 and below member {}",
                n, offset, member
            )));
        }

        let inflated = n.is_positive();
        let mut cnt = BigInt::from(-1);
        let mut running_q = BigInt::from(0);

        for entry in &self.cq_model {
            cnt += 1;
            if &cnt == offset {
                return Ok(Some(running_q));
            }
            if entry.wait {
                // Paired positions share one q; no inflation between them.
                continue;
            }
            if inflated {
                cnt += n;
                running_q += n;
                if &cnt >= offset {
                    return Ok(None);
                }
            }
        }
        Ok(Some(running_q))
    }

    /// Strike decision via reverse inflation; must agree with
    /// [`PrimeGte31::strike_at`] everywhere. Slow, for cross-checks.
    pub fn strike_by_reverse_inflation(
        &self,
        offset: &BigInt,
        n: &BigInt,
    ) -> Result<Option<Symbol>, SieveError> {
        let q = match self.q_by_reverse_inflation(n, offset)? {
            Some(q) => q,
            None => return Ok(None),
        };
        let idx = (offset - q).to_usize().ok_or_else(|| {
            SieveError::invalid(format!("bad progression index for offset {}", offset))
        })?;
        match self.cq_model[idx].effect {
            Symbol::Sextuplet => Ok(None),
            effect => Ok(Some(effect)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn test_constructor_rejects_illegal_values() {
        assert!(PrimeGte31::new(29).is_err());
        assert!(PrimeGte31::new(61).is_err());
        assert!(PrimeGte31::new(31).is_ok());
        assert!(PrimeGte31::new(49).is_ok());
    }

    #[test]
    fn test_family_constants() {
        let p31 = PrimeGte31::new(31).unwrap();
        assert_eq!(p31.start_tnum(), &big(32));
        assert_eq!(p31.mod30(), &big(1));
        assert_eq!(p31.s_minus_p(), &big(1));
        // 32 mod 31 = 1, minus mod30 1 = 0
        assert_eq!(p31.mod_const(), &big(0));
        assert!(p31.squared_ends_in_1());
        assert!(!p31.has_insert_before_0());
        assert_eq!(p31.sub_n(), 0);

        let p59 = PrimeGte31::new(59).unwrap();
        assert_eq!(p59.start_tnum(), &big(116));
        assert_eq!(p59.mod30(), &big(29));
        // 116 mod 59 = 57, minus 29 = 28
        assert_eq!(p59.mod_const(), &big(28));
        assert!(p59.has_insert_before_0());
        assert_eq!(p59.sub_n(), 7);

        let squared_1: Vec<u32> = GTE31_VALUES
            .iter()
            .copied()
            .filter(|&v| PrimeGte31::new(v).unwrap().squared_ends_in_1())
            .collect();
        assert_eq!(squared_1, [31, 41, 49, 59]);
    }

    #[test]
    fn test_lookup_rows_strictly_increasing() {
        for value in GTE31_VALUES {
            let p = PrimeGte31::new(value).unwrap();
            let rows = p.lookup();
            for w in rows.windows(2) {
                assert!(w[0].c < w[1].c, "p={}", value);
                assert!(w[0].q <= w[1].q, "p={}", value);
            }
            assert!(rows[0].c < value, "p={}", value);
            for row in rows {
                assert_ne!(row.effect, Symbol::Sextuplet);
            }
        }
    }

    #[test]
    fn test_cq_model_consistent_with_lookup() {
        // Each lookup row must restate a CQ-model position: the row's c
        // is the progression index, its q the cumulative multiplier
        // there, its effect the one stamped at that index.
        for value in GTE31_VALUES {
            let p = PrimeGte31::new(value).unwrap();
            let model = p.cq_model();
            assert_eq!(model.len(), value as usize);
            for row in p.lookup() {
                let entry = model[row.c as usize];
                assert_eq!(entry.q30, row.q, "p={} c={}", value, row.c);
                assert_eq!(entry.effect, row.effect, "p={} c={}", value, row.c);
            }
            let stamped = model
                .iter()
                .filter(|e| e.effect != Symbol::Sextuplet)
                .count();
            assert_eq!(stamped, LOOKUP_SIZE, "p={}", value);
        }
    }

    #[test]
    fn test_member_at() {
        let p31 = PrimeGte31::new(31).unwrap();
        assert_eq!(p31.member_at(&big(0)), big(31));
        assert_eq!(p31.member_at(&big(1)), big(61));
        assert_eq!(p31.member_at(&big(2)), big(91));
    }

    #[test]
    fn test_strike_at_base_level() {
        let p31 = PrimeGte31::new(31).unwrap();
        assert_eq!(p31.strike_at(&big(6), &big(0)), Some(Symbol::RQuint13));
        assert_eq!(p31.strike_at(&big(10), &big(0)), Some(Symbol::Destroyed));
        assert_eq!(p31.strike_at(&big(22), &big(0)), Some(Symbol::LQuint29));
        assert_eq!(p31.strike_at(&big(7), &big(0)), None);
        assert_eq!(p31.strike_at(&big(23), &big(0)), None);
    }

    #[test]
    fn test_strike_at_inflated() {
        // Row (16, 12, X) of family 41 probes 16 + 3·12 = 52 at n = 3.
        let p41 = PrimeGte31::new(41).unwrap();
        assert_eq!(p41.strike_at(&big(52), &big(3)), Some(Symbol::Destroyed));
        assert_eq!(p41.strike_at(&big(51), &big(3)), None);
    }

    #[test]
    fn test_reverse_inflation_golden() {
        let p31 = PrimeGte31::new(31).unwrap();
        assert_eq!(
            p31.strike_by_reverse_inflation(&big(10), &big(0)).unwrap(),
            Some(Symbol::Destroyed)
        );
        assert_eq!(
            p31.strike_by_reverse_inflation(&big(6), &big(0)).unwrap(),
            Some(Symbol::RQuint13)
        );
        assert_eq!(
            p31.strike_by_reverse_inflation(&big(32), &big(1)).unwrap(),
            Some(Symbol::Destroyed)
        );
    }

    #[test]
    fn test_reverse_inflation_matches_lookup() {
        for value in GTE31_VALUES {
            let p = PrimeGte31::new(value).unwrap();
            for n in 0..4i64 {
                let n = big(n);
                let member = p.member_at(&n);
                let mut offset = big(0);
                while offset < member {
                    assert_eq!(
                        p.strike_at(&offset, &n),
                        p.strike_by_reverse_inflation(&offset, &n).unwrap(),
                        "p={} n={} offset={}",
                        value,
                        n,
                        offset
                    );
                    offset += 1;
                }
            }
        }
    }

    #[test]
    fn test_reverse_inflation_validates() {
        let p31 = PrimeGte31::new(31).unwrap();
        assert!(p31.q_by_reverse_inflation(&big(-1), &big(0)).is_err());
        assert!(p31.q_by_reverse_inflation(&big(0), &big(31)).is_err());
        assert!(p31.q_by_reverse_inflation(&big(0), &big(-2)).is_err());
    }
}
