//! Analysis surface: critical sections, clear channels, and inflation
//! cross-checks.
//!
//! None of this feeds the sieve; it exists to take the machinery apart.
//! Critical sections tile the TNumber line by the squares of successive
//! family members; clear-channel counting asks which Templates no family
//! ever touches; the inflation map rebuilds a member's progression the
//! slow way and holds it against the lookup tables.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::gte31::{PrimeGte31, GTE31_VALUES, LOOKUP_SIZE};
use crate::primality::{is_probably_prime, DEFAULT_ROUNDS};
use crate::residue::{crossing_at_tnum, crossing_mod_simple, effective_tnum, n_from_tnum};
use crate::symbol::Symbol;
use crate::template::tnum_to_int;
use crate::SieveError;

/// Identifies the critical section starting at `(p_subN + 30n)²`: the
/// TNumber range from that square up to the next family square.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CritSectId {
    n: BigInt,
    sub_n: u8,
}

impl CritSectId {
    pub fn new(n: BigInt, sub_n: u8) -> Result<CritSectId, SieveError> {
        if n.is_negative() {
            return Err(SieveError::invalid(format!(
                "critical section n {} must be >= 0",
                n
            )));
        }
        if sub_n as usize >= GTE31_VALUES.len() {
            return Err(SieveError::invalid(format!(
                "critical section subN {} must be 0..7",
                sub_n
            )));
        }
        Ok(CritSectId { n, sub_n })
    }

    pub fn n(&self) -> &BigInt {
        &self.n
    }

    pub fn sub_n(&self) -> u8 {
        self.sub_n
    }

    /// Base value of the family owning this section.
    pub fn family_value(&self) -> u32 {
        GTE31_VALUES[self.sub_n as usize]
    }

    /// Zero-based position in the square ordering: `8n + subN`.
    pub fn linear(&self) -> BigInt {
        &self.n * 8u32 + self.sub_n
    }

    /// One-based display id: `8n + subN + 1`.
    pub fn id_int(&self) -> BigInt {
        self.linear() + 1u32
    }

    pub fn from_linear(linear: &BigInt) -> Result<CritSectId, SieveError> {
        if linear.is_negative() {
            return Err(SieveError::invalid(format!(
                "critical section index {} must be >= 0",
                linear
            )));
        }
        let n = linear / 8u32;
        let sub_n = (linear % 8u32).to_u8().expect("residue below 8");
        CritSectId::new(n, sub_n)
    }

    pub fn from_id_int(id: &BigInt) -> Result<CritSectId, SieveError> {
        if id < &BigInt::from(1) {
            return Err(SieveError::invalid(format!(
                "critical section id {} must be >= 1",
                id
            )));
        }
        CritSectId::from_linear(&(id - 1u32))
    }

    /// Move `k` sections forward (or back for negative `k`).
    pub fn offset_by(&self, k: &BigInt) -> Result<CritSectId, SieveError> {
        CritSectId::from_linear(&(self.linear() + k))
    }

    pub fn next(&self) -> CritSectId {
        self.offset_by(&BigInt::from(1)).expect("forward step stays valid")
    }

    /// Sections between `self` and `other`, signed.
    pub fn distance_to(&self, other: &CritSectId) -> BigInt {
        other.linear() - self.linear()
    }

    /// First TNumber of this section (where its square lands).
    pub fn start_tnum(&self) -> BigInt {
        let family = PrimeGte31::new(self.family_value()).expect("canonical family");
        effective_tnum(&self.n, &family)
    }

    /// The critical section containing TNumber `t`: the largest family
    /// square at or below the end of Template `t`. Errors below TNumber
    /// 32, where no square has landed yet.
    pub fn from_tnum(t: &BigInt) -> Result<CritSectId, SieveError> {
        if t < &BigInt::from(32) {
            return Err(SieveError::invalid(format!(
                "TNumber {} precedes the first family square",
                t
            )));
        }
        let mut best: Option<CritSectId> = None;
        for (sub_n, family) in PrimeGte31::all_families().iter().enumerate() {
            let n = n_from_tnum(t, family);
            if n.is_negative() {
                continue;
            }
            let candidate = CritSectId {
                n,
                sub_n: sub_n as u8,
            };
            if best.as_ref().map_or(true, |b| candidate > *b) {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| {
            SieveError::invalid(format!("no family square at or below TNumber {}", t))
        })
    }
}

/// Clear-channel census over a TNumber window.
#[derive(Debug, Clone, Default)]
pub struct ClearChannelReport {
    /// Templates no family touched within the probed levels.
    pub clear: Vec<BigInt>,
    /// Clear channels whose six candidates are all probable primes.
    pub true_sextuplets: Vec<BigInt>,
    /// Clear channels carrying at least one composite candidate: open in
    /// every probed residue class, yet unused by an actual sextuplet.
    pub unused: Vec<BigInt>,
}

/// For each Template in `[from, to]`, probe every family at levels
/// 0..=max_n (clamped to the levels defined for that Template) and count
/// the Templates nothing strikes. Survivors are classified by a
/// probable-prime check of all six candidate positions.
pub fn count_clear_channels(
    from: &BigInt,
    to: &BigInt,
    max_n: &BigInt,
) -> Result<ClearChannelReport, SieveError> {
    if from > to {
        return Err(SieveError::invalid(format!(
            "from TNumber {} is greater than to TNumber {}",
            from, to
        )));
    }
    if max_n.is_negative() {
        return Err(SieveError::invalid("max n must be >= 0"));
    }
    let families = PrimeGte31::all_families();
    let mut report = ClearChannelReport::default();

    let mut t = from.clone();
    while t <= *to {
        let mut struck = false;
        'families: for family in &families {
            if &t < family.start_tnum() {
                continue;
            }
            let n_ceiling = n_from_tnum(&t, family).min(max_n.clone());
            let mut n = BigInt::zero();
            while n <= n_ceiling {
                let offset = crossing_mod_simple(&t, &n, family);
                if family.strike_at(&offset, &n).is_some() {
                    struck = true;
                    break 'families;
                }
                n += 1;
            }
        }
        if !struck {
            report.clear.push(t.clone());
            let begin = tnum_to_int(&t);
            let all_prime = crate::template::CANDIDATE_OFFSETS
                .iter()
                .all(|&offset| is_probably_prime(&(&begin + offset), DEFAULT_ROUNDS));
            if all_prime {
                report.true_sextuplets.push(t.clone());
            } else {
                report.unused.push(t.clone());
            }
        }
        t += 1;
    }
    Ok(report)
}

/// Effect of a non-inflated crossing residue, shared by every family.
fn effect_at_residue(residue: &BigInt) -> Option<Symbol> {
    match residue.to_u32() {
        Some(12) => Some(Symbol::RQuint13),
        Some(16) | Some(18) | Some(22) | Some(24) => Some(Symbol::Destroyed),
        Some(28) => Some(Symbol::LQuint29),
        _ => None,
    }
}

/// Rebuild the inflated natural progression of `family` at level `n` by
/// walking member-sized steps from the member's square, and check every
/// offset against the lookup-table projection. Returns the six strike
/// offsets with their effects.
///
/// O(p + 30n); keep n small.
pub fn build_inflation_map(
    family: &PrimeGte31,
    n: &BigInt,
) -> Result<Vec<(BigInt, Symbol)>, SieveError> {
    if n.is_negative() {
        return Err(SieveError::invalid("inflation level must be >= 0"));
    }
    let member = family.member_at(n);
    let start = effective_tnum(n, family);
    let mut residue = crossing_at_tnum(&member, &start);

    let mut strikes = Vec::new();
    let mut offset = BigInt::zero();
    while offset < member {
        let expected = effect_at_residue(&residue);
        let probed = family.strike_at(&offset, n);
        if expected != probed {
            return Err(SieveError::invalid(format!(
                "family {} n {} offset {}: progression gives {:?}, lookup gives {:?}",
                family.value(),
                n,
                offset,
                expected,
                probed
            )));
        }
        if let Some(effect) = expected {
            strikes.push((offset.clone(), effect));
        }
        // The member advances 30 integers per Template, so its crossing
        // residue falls by 30 each step.
        residue = (residue - 30i64).mod_floor(&member);
        offset += 1;
    }
    if strikes.len() != LOOKUP_SIZE {
        return Err(SieveError::invalid(format!(
            "family {} n {}: found {} strike positions, expected {}",
            family.value(),
            n,
            strikes.len(),
            LOOKUP_SIZE
        )));
    }
    Ok(strikes)
}

/// Compare the lookup-table strike against reverse inflation for every
/// offset of `family` at level `n`.
pub fn verify_strikes(family: &PrimeGte31, n: &BigInt) -> Result<(), SieveError> {
    let member = family.member_at(n);
    let mut offset = BigInt::zero();
    while offset < member {
        let fast = family.strike_at(&offset, n);
        let slow = family.strike_by_reverse_inflation(&offset, n)?;
        if fast != slow {
            return Err(SieveError::invalid(format!(
                "family {} n {} offset {}: lookup gives {:?}, reverse inflation {:?}",
                family.value(),
                n,
                offset,
                fast,
                slow
            )));
        }
        offset += 1;
    }
    Ok(())
}
