//! Stage A: the 29-basis generator.
//!
//! Walks a TNumber window inside the basis `[28, 215 656 468]` and folds
//! the effects of all seven basis primes into one residual symbol per
//! Template. Seven rolling indexes into the natural progressions replace
//! modular arithmetic; the fold short-circuits as soon as the filter's
//! disallow mask is hit, which for the default filter means the first
//! destroying prime ends the Template.
//!
//! TNumbers 1..27 predate the start Template of prime 29 and cannot be
//! produced by the general loop; [`first_templates`] walks them with the
//! primes 7..23 only and their survivors go to a dedicated file set,
//! never into a basis stream.

use std::io::Write;
use std::path::{Path, PathBuf};

use num_bigint::BigInt;

use crate::files::{
    self, basis_filename, change_file_ext, write_raw_pair, PrettyState, EXT_INFO,
};
use crate::lte29::PrimeLte29;
use crate::symbol::{FilterMode, Symbol, SymbolCounts};
use crate::template::{BASIS_BEGIN, BASIS_LEN};
use crate::SieveError;

/// Window and filter for one basis generation run.
#[derive(Debug, Clone)]
pub struct BasisParams {
    pub from: u64,
    pub to: u64,
    pub filter: FilterMode,
}

impl BasisParams {
    /// The full default basis window, unfiltered.
    pub fn default_basis() -> BasisParams {
        BasisParams {
            from: BASIS_BEGIN,
            to: BASIS_BEGIN + BASIS_LEN - 1,
            filter: FilterMode::All,
        }
    }
}

/// Rolling state for one basis prime.
struct Roller {
    value: u32,
    effects: Vec<Symbol>,
    idx: usize,
    start_idx: usize,
}

/// Iterator over basis survivors `(TNumber, Symbol)`.
pub struct BasisGenerator {
    rollers: Vec<Roller>,
    cur: u64,
    to: u64,
    steps: u64,
    disallow: u32,
    final_pass: u32,
    counts: SymbolCounts,
}

impl BasisGenerator {
    pub fn new(params: &BasisParams) -> Result<BasisGenerator, SieveError> {
        if params.from < BASIS_BEGIN {
            return Err(SieveError::invalid(format!(
                "from TNumber {} is below the basis start {}",
                params.from, BASIS_BEGIN
            )));
        }
        if params.to <= params.from {
            return Err(SieveError::invalid(format!(
                "to TNumber {} must be greater than from TNumber {}",
                params.to, params.from
            )));
        }

        let from = BigInt::from(params.from);
        let rollers = PrimeLte29::all_primes()
            .into_iter()
            .map(|p| {
                let size = p.value() as usize;
                let start = p.progression_index(&from);
                // The loop advances at the top, so seat one position back.
                Roller {
                    value: p.value(),
                    effects: (0..size).map(|i| p.effect_at_index(i)).collect(),
                    idx: (start + size - 1) % size,
                    start_idx: start,
                }
            })
            .collect();

        let (disallow, final_pass) = params.filter.basis_filters();
        Ok(BasisGenerator {
            rollers,
            cur: params.from,
            to: params.to,
            steps: 0,
            disallow,
            final_pass,
            counts: SymbolCounts::new(),
        })
    }

    pub fn counts(&self) -> &SymbolCounts {
        &self.counts
    }

    /// TNumbers consumed so far (survivors and rejects alike).
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Progression indexes seated at the window start, per prime value.
    pub fn start_indexes(&self) -> Vec<(u32, usize)> {
        self.rollers
            .iter()
            .map(|r| (r.value, r.start_idx))
            .collect()
    }

    /// Current progression indexes, per prime value.
    pub fn indexes(&self) -> Vec<(u32, usize)> {
        self.rollers.iter().map(|r| (r.value, r.idx)).collect()
    }

    /// Cycle sanity: the basis length is divisible by every basis prime,
    /// so after any whole number of basis periods every rolling index is
    /// back at one position below its start.
    pub fn cycle_aligned(&self) -> bool {
        self.steps % BASIS_LEN == 0
            && self.rollers.iter().all(|r| {
                let size = r.effects.len();
                r.idx == (r.start_idx + size - 1) % size
            })
    }
}

impl Iterator for BasisGenerator {
    type Item = (u64, Symbol);

    fn next(&mut self) -> Option<(u64, Symbol)> {
        'templates: while self.cur <= self.to {
            let t = self.cur;
            self.cur += 1;
            self.steps += 1;

            let mut result = Symbol::Sextuplet;
            for roller in &mut self.rollers {
                roller.idx += 1;
                if roller.idx == roller.effects.len() {
                    roller.idx = 0;
                }
            }
            for roller in &self.rollers {
                result = result.combine(roller.effects[roller.idx]);
                if result.mask() & self.disallow != 0 {
                    continue 'templates;
                }
            }
            if result.mask() & self.final_pass == 0 {
                continue;
            }

            self.counts.record(result);
            return Some((t, result));
        }
        None
    }
}

/// Outcome of a basis generation run.
#[derive(Debug, Clone)]
pub struct BasisStats {
    pub counts: SymbolCounts,
    pub start_indexes: Vec<(u32, usize)>,
    pub end_indexes: Vec<(u32, usize)>,
}

/// Drain a basis run into a raw pair stream.
pub fn generate_basis(
    params: &BasisParams,
    raw: &mut impl Write,
) -> Result<BasisStats, SieveError> {
    let mut generator = BasisGenerator::new(params)?;
    let start_indexes = generator.start_indexes();
    while let Some((t, symbol)) = generator.next() {
        write_raw_pair(raw, &BigInt::from(t), symbol)?;
    }
    raw.flush()?;
    Ok(BasisStats {
        counts: generator.counts().clone(),
        start_indexes,
        end_indexes: generator.indexes(),
    })
}

/// Generate the basis raw file plus its info sidecar in `dir`, named by
/// the standard convention. Returns the stats and the raw file path.
pub fn generate_basis_files(
    dir: &Path,
    params: &BasisParams,
) -> Result<(BasisStats, PathBuf), SieveError> {
    if !dir.is_dir() {
        return Err(SieveError::MissingFile(dir.to_path_buf()));
    }
    let raw_path = dir.join(basis_filename(
        &BigInt::from(params.from),
        &BigInt::from(params.to),
        params.filter,
    ));
    let mut raw = std::io::BufWriter::new(std::fs::File::create(&raw_path)?);
    let stats = generate_basis(params, &mut raw)?;
    drop(raw);

    let info_path = change_file_ext(&raw_path, EXT_INFO);
    let mut info = std::fs::File::create(info_path)?;
    files::write_basis_info(
        &mut info,
        &BigInt::from(params.from),
        &BigInt::from(params.to),
        params.filter,
        &stats,
    )?;
    Ok((stats, raw_path))
}

/// Survivors of TNumbers 1..27, from the primes 7..23 alone.
///
/// Prime 29 has not started yet in this range, and primes join the fold
/// only from their own start Template. The output stands alone; it must
/// not be prepended to a basis stream.
pub fn first_templates() -> Vec<(u64, Symbol)> {
    let primes: Vec<PrimeLte29> = PrimeLte29::all_primes()
        .into_iter()
        .filter(|p| p.value() < 29)
        .collect();
    let mut idx = vec![0usize; primes.len()];

    let mut survivors = Vec::new();
    for t in 1..=27u64 {
        let mut result = Symbol::Sextuplet;
        for (i, p) in primes.iter().enumerate() {
            if t < p.start_tnum() as u64 {
                continue;
            }
            result = result.combine(p.effect_at_index(idx[i]));
            idx[i] = (idx[i] + 1) % p.value() as usize;
        }
        if result.is_tuplet() {
            survivors.push((t, result));
        }
    }
    survivors
}

/// Write the 1..27 survivors as raw + pretty + info files in `dir`.
pub fn first_templates_files(dir: &Path) -> Result<(SymbolCounts, PathBuf), SieveError> {
    if !dir.is_dir() {
        return Err(SieveError::MissingFile(dir.to_path_buf()));
    }
    let raw_path = dir.join(format!("juusprimes_1_27{}", files::EXT_RAW23));
    let mut raw = std::io::BufWriter::new(std::fs::File::create(&raw_path)?);
    let mut pretty =
        std::fs::File::create(change_file_ext(&raw_path, files::EXT_PRETTY))?;
    let mut pretty_state = PrettyState::new("n/a");

    let mut counts = SymbolCounts::new();
    for (t, symbol) in first_templates() {
        let t_big = BigInt::from(t);
        write_raw_pair(&mut raw, &t_big, symbol)?;
        files::write_pretty_entry(&mut pretty, &t_big, symbol, &mut pretty_state)?;
        counts.record(symbol);
    }
    raw.flush()?;

    let mut info = std::fs::File::create(change_file_ext(&raw_path, EXT_INFO))?;
    files::write_first_templates_info(&mut info, &counts)?;
    Ok((counts, raw_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_windows() {
        let params = BasisParams {
            from: 27,
            to: 100,
            filter: FilterMode::All,
        };
        assert!(BasisGenerator::new(&params).is_err());
        let params = BasisParams {
            from: 50,
            to: 50,
            filter: FilterMode::All,
        };
        assert!(BasisGenerator::new(&params).is_err());
    }

    #[test]
    fn test_start_indexes_at_basis_head() {
        let params = BasisParams {
            from: 28,
            to: 1000,
            filter: FilterMode::All,
        };
        let generator = BasisGenerator::new(&params).unwrap();
        assert_eq!(
            generator.start_indexes(),
            vec![(7, 6), (11, 2), (13, 10), (17, 2), (19, 16), (23, 11), (29, 0)]
        );
    }

    #[test]
    fn test_rolling_indexes_advance_in_lockstep() {
        let params = BasisParams {
            from: 28,
            to: 100_000,
            filter: FilterMode::All,
        };
        let mut generator = BasisGenerator::new(&params).unwrap();
        let starts = generator.start_indexes();
        for _ in generator.by_ref() {}
        let steps = generator.steps();
        assert_eq!(steps, 100_000 - 28 + 1);
        for ((value, start), (_, end)) in starts.iter().zip(generator.indexes()) {
            let want = (start + (steps as usize - 1)) % *value as usize;
            assert_eq!(end, want, "p={}", value);
        }
    }

    #[test]
    fn test_cycle_divisibility() {
        // One whole basis advances every rolling index by a multiple of
        // its prime, which is what makes the pattern repeat.
        for p in crate::lte29::LTE29_PRIMES {
            assert_eq!(BASIS_LEN % p as u64, 0);
        }
    }

    #[test]
    fn test_first_survivors_of_basis() {
        let params = BasisParams {
            from: 28,
            to: 2000,
            filter: FilterMode::All,
        };
        let generator = BasisGenerator::new(&params).unwrap();
        let survivors: Vec<(u64, Symbol)> = generator.collect();
        assert!(!survivors.is_empty());
        // Strictly ascending TNumbers.
        for w in survivors.windows(2) {
            assert!(w[0].0 < w[1].0);
        }
        // Template 535 holds the first sextuplet past the basis start
        // (16057..16073); the basis must leave it fully open.
        assert!(survivors.contains(&(535, Symbol::Sextuplet)));
    }

    #[test]
    fn test_deterministic_runs() {
        let params = BasisParams {
            from: 28,
            to: 50_000,
            filter: FilterMode::All,
        };
        let a: Vec<(u64, Symbol)> = BasisGenerator::new(&params).unwrap().collect();
        let b: Vec<(u64, Symbol)> = BasisGenerator::new(&params).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sextuplet_filter_is_subset_of_all() {
        let all_params = BasisParams {
            from: 28,
            to: 100_000,
            filter: FilterMode::All,
        };
        let sext_params = BasisParams {
            filter: FilterMode::Sextuplets,
            ..all_params.clone()
        };
        let all: Vec<(u64, Symbol)> = BasisGenerator::new(&all_params).unwrap().collect();
        let sext: Vec<(u64, Symbol)> =
            BasisGenerator::new(&sext_params).unwrap().collect();
        assert!(!sext.is_empty());
        for pair in &sext {
            assert_eq!(pair.1, Symbol::Sextuplet);
            assert!(all.contains(pair));
        }
        let all_sext: Vec<&(u64, Symbol)> =
            all.iter().filter(|(_, s)| *s == Symbol::Sextuplet).collect();
        assert_eq!(all_sext.len(), sext.len());
    }

    #[test]
    fn test_first_templates_bootstrap() {
        let survivors = first_templates();
        assert!(!survivors.is_empty());
        for (t, symbol) in &survivors {
            assert!((1..=27).contains(t));
            assert!(symbol.is_tuplet());
        }
        // Template 3 holds the sextuplet 97..113.
        assert!(survivors.iter().any(|&(t, s)| t == 3 && s == Symbol::Sextuplet));
        // Template 1 does not survive: its offset-24 candidate is 49 = 7².
        assert!(!survivors.iter().any(|&(t, _)| t == 1));
    }
}
