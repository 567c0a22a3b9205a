//! Stage B: the tuplet sieve.
//!
//! Consumes a Stage-A basis stream, shifts each entry into the requested
//! basis, and lets every potPrime family member up to the Template's
//! square root try to strike. Survivors are the tuplets.
//!
//! The basis file is re-read from the top each time the requested range
//! crosses a basis boundary; the shift `basis_num · BASIS_LEN` makes the
//! same stream serve every basis out to infinity.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::files::{
    self, change_file_ext, tuplet_filename, write_raw_pair, PrettyState, RawPairReader,
};
use crate::gte31::PrimeGte31;
use crate::residue::{crossing_mod_simple, n_from_tnum};
use crate::symbol::{FilterMode, Symbol, SymbolCounts};
use crate::template::{basis_to_tnum_range, int_to_tnum, tnum_to_basis, BASIS_LEN, FIRST_BASIS_INT};
use crate::SieveError;

/// How the target range of a sieve run is specified.
#[derive(Debug, Clone)]
pub enum RangeSpec {
    /// One whole basis, 0-based.
    Basis(BigInt),
    /// An inclusive TNumber range.
    TNums(BigInt, BigInt),
    /// An inclusive number-line range, converted to Templates.
    Integers(BigInt, BigInt),
}

/// Range and filter for one sieve run.
#[derive(Debug, Clone)]
pub struct SieveParams {
    pub range: RangeSpec,
    pub filter: FilterMode,
}

/// Normalized target range.
#[derive(Debug, Clone)]
pub struct ResolvedRange {
    pub basis_num: BigInt,
    pub from: BigInt,
    pub to: BigInt,
}

impl SieveParams {
    pub fn resolve(&self) -> Result<ResolvedRange, SieveError> {
        let (basis_num, from, to) = match &self.range {
            RangeSpec::Basis(k) => {
                if k.is_negative() {
                    return Err(SieveError::invalid(format!(
                        "basis number {} can not be less than 0",
                        k
                    )));
                }
                let (from, to) = basis_to_tnum_range(k);
                (k.clone(), from, to)
            }
            RangeSpec::TNums(from, to) => {
                (tnum_to_basis(from)?, from.clone(), to.clone())
            }
            RangeSpec::Integers(from, to) => {
                if *from < BigInt::from(FIRST_BASIS_INT) {
                    return Err(SieveError::invalid(format!(
                        "from integer {} is below the first basis integer {}",
                        from, FIRST_BASIS_INT
                    )));
                }
                let from = int_to_tnum(from);
                let to = int_to_tnum(to);
                (tnum_to_basis(&from)?, from, to)
            }
        };
        if from > to {
            return Err(SieveError::invalid(format!(
                "from TNumber {} is greater than to TNumber {}",
                from, to
            )));
        }
        Ok(ResolvedRange {
            basis_num,
            from,
            to,
        })
    }
}

/// Run the strike loop for one Template. `incoming` is the residual
/// symbol from the basis; returns the final symbol, or `None` once the
/// post mask rejects it.
///
/// Families are probed in ascending value order at every level n, so the
/// first member large enough to matter also terminates the scan before a
/// rejected Template wastes further levels.
pub fn resolve_template(
    t: &BigInt,
    incoming: Symbol,
    families: &[PrimeGte31],
    post_mask: u32,
) -> Option<Symbol> {
    let n_max: Vec<BigInt> = families.iter().map(|f| n_from_tnum(t, f)).collect();
    let highest = n_max.first().cloned().unwrap_or_else(BigInt::zero);

    let mut symbol = incoming;
    let mut n = BigInt::zero();
    while n <= highest {
        for (i, family) in families.iter().enumerate() {
            if t < family.start_tnum() || n > n_max[i] {
                continue;
            }
            let offset = crossing_mod_simple(t, &n, family);
            if let Some(hit) = family.strike_at(&offset, &n) {
                symbol = symbol.combine(hit);
                if symbol.mask() & post_mask != 0 {
                    return None;
                }
            }
        }
        n += 1;
    }
    if symbol.mask() & post_mask != 0 {
        return None;
    }
    Some(symbol)
}

/// One emitted Template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupletHit {
    pub tnum: BigInt,
    pub symbol: Symbol,
    /// The basis-0 TNumber this entry came from.
    pub basis_tnum: BigInt,
    /// Set on the first hit after the stream wrapped into a new basis.
    pub wrapped_into: Option<BigInt>,
}

/// Iterator over sieve survivors, pulled from a seekable basis stream.
pub struct TupletSieve<R> {
    reader: RawPairReader<R>,
    families: Vec<PrimeGte31>,
    from: BigInt,
    to: BigInt,
    basis_num: BigInt,
    basis_track: BigInt,
    pre_mask: u32,
    post_mask: u32,
    counts: SymbolCounts,
    twins: Vec<(BigInt, BigInt)>,
    last_sextuplet: Option<BigInt>,
    pending_wrap: Option<BigInt>,
    finished: bool,
}

impl<R: BufRead + Seek> TupletSieve<R> {
    pub fn new(reader: R, params: &SieveParams) -> Result<TupletSieve<R>, SieveError> {
        let range = params.resolve()?;
        let (pre_mask, post_mask) = params.filter.sieve_filters();
        let basis_track = &range.basis_num * BASIS_LEN;
        Ok(TupletSieve {
            reader: RawPairReader::new(reader),
            families: PrimeGte31::all_families(),
            from: range.from,
            to: range.to,
            basis_num: range.basis_num,
            basis_track,
            pre_mask,
            post_mask,
            counts: SymbolCounts::new(),
            twins: Vec::new(),
            last_sextuplet: None,
            pending_wrap: None,
            finished: false,
        })
    }

    pub fn counts(&self) -> &SymbolCounts {
        &self.counts
    }

    /// Twin sextuplets seen so far (TNumber pairs exactly 7 apart).
    pub fn twins(&self) -> &[(BigInt, BigInt)] {
        &self.twins
    }

    /// Basis number currently being read.
    pub fn basis_num(&self) -> &BigInt {
        &self.basis_num
    }

    fn next_entry(&mut self) -> std::io::Result<Option<(BigInt, Symbol)>> {
        if let Some(pair) = self.reader.read_pair()? {
            return Ok(Some(pair));
        }
        // Basis boundary: rewind and continue in the next basis.
        self.reader.rewind()?;
        self.basis_num += 1;
        self.basis_track = &self.basis_num * BASIS_LEN;
        self.pending_wrap = Some(self.basis_num.clone());
        self.reader.read_pair()
    }
}

impl<R: BufRead + Seek> Iterator for TupletSieve<R> {
    type Item = std::io::Result<TupletHit>;

    fn next(&mut self) -> Option<std::io::Result<TupletHit>> {
        if self.finished {
            return None;
        }
        loop {
            let (basis_tnum, incoming) = match self.next_entry() {
                Ok(Some(pair)) => pair,
                Ok(None) => {
                    // Empty stream; nothing will ever arrive.
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            let t = &basis_tnum + &self.basis_track;
            if t < self.from {
                continue;
            }
            if t > self.to {
                self.finished = true;
                return None;
            }
            if incoming.mask() & self.pre_mask == 0 {
                continue;
            }

            let symbol =
                match resolve_template(&t, incoming, &self.families, self.post_mask) {
                    Some(symbol) => symbol,
                    None => continue,
                };

            self.counts.record(symbol);
            if symbol == Symbol::Sextuplet {
                if let Some(last) = &self.last_sextuplet {
                    if &t - last == BigInt::from(7) {
                        self.twins.push((last.clone(), t.clone()));
                    }
                }
                self.last_sextuplet = Some(t.clone());
            }

            return Some(Ok(TupletHit {
                tnum: t,
                symbol,
                basis_tnum,
                wrapped_into: self.pending_wrap.take(),
            }));
        }
    }
}

/// Outcome of a file-producing sieve run.
#[derive(Debug, Clone)]
pub struct SieveStats {
    pub counts: SymbolCounts,
    pub twins: Vec<(BigInt, BigInt)>,
    pub raw_path: PathBuf,
    pub pretty_path: PathBuf,
    pub info_path: PathBuf,
}

/// Sieve `params` against the basis file at `basis_path`, producing the
/// raw/pretty/info file triple in `out_dir`.
pub fn generate_tuplets(
    params: &SieveParams,
    basis_path: &Path,
    out_dir: &Path,
) -> Result<SieveStats, SieveError> {
    if !basis_path.is_file() {
        return Err(SieveError::MissingFile(basis_path.to_path_buf()));
    }
    if !out_dir.is_dir() {
        return Err(SieveError::MissingFile(out_dir.to_path_buf()));
    }
    let range = params.resolve()?;

    let raw_path = out_dir.join(tuplet_filename(
        &range.basis_num,
        &range.from,
        &range.to,
        params.filter,
    ));
    let pretty_path = change_file_ext(&raw_path, files::EXT_PRETTY);
    let info_path = change_file_ext(&raw_path, files::EXT_INFO);

    let mut raw = BufWriter::new(File::create(&raw_path)?);
    let mut pretty = BufWriter::new(File::create(&pretty_path)?);
    files::write_pretty_header(
        &mut pretty,
        &range.from,
        &range.to,
        params.filter,
        basis_path,
    )?;

    let mut pretty_state = PrettyState::new("");
    pretty_state.notify = Some(format!("BASIS:{}", range.basis_num));

    let reader = BufReader::new(File::open(basis_path)?);
    let mut sieve = TupletSieve::new(reader, params)?;
    for hit in sieve.by_ref() {
        let hit = hit?;
        write_raw_pair(&mut raw, &hit.tnum, hit.symbol)?;
        if let Some(basis) = &hit.wrapped_into {
            pretty_state.notify = Some(format!("BASIS WRAPPED:{}", basis));
        }
        pretty_state.basis_tnum = hit.basis_tnum.to_string();
        files::write_pretty_entry(&mut pretty, &hit.tnum, hit.symbol, &mut pretty_state)?;
    }
    raw.flush()?;
    pretty.flush()?;

    let stats = SieveStats {
        counts: sieve.counts().clone(),
        twins: sieve.twins().to_vec(),
        raw_path,
        pretty_path,
        info_path: info_path.clone(),
    };

    let mut info = File::create(&info_path)?;
    files::write_tuplets_info(
        &mut info,
        &range.from,
        &range.to,
        params.filter,
        &stats.counts,
        &stats.twins,
        basis_path,
    )?;
    Ok(stats)
}

/// Sieve a run of consecutive basis numbers (automation surface).
pub fn generate_tuplets_batch(
    from_basis: &BigInt,
    to_basis: &BigInt,
    filter: FilterMode,
    basis_path: &Path,
    out_dir: &Path,
) -> Result<Vec<SieveStats>, SieveError> {
    if from_basis.is_negative() {
        return Err(SieveError::invalid(format!(
            "from basis number {} must be >= 0",
            from_basis
        )));
    }
    if to_basis < from_basis {
        return Err(SieveError::invalid(format!(
            "to basis number {} must be >= from basis number {}",
            to_basis, from_basis
        )));
    }
    let mut all = Vec::new();
    let mut basis = from_basis.clone();
    while &basis <= to_basis {
        let params = SieveParams {
            range: RangeSpec::Basis(basis.clone()),
            filter,
        };
        all.push(generate_tuplets(&params, basis_path, out_dir)?);
        basis += 1;
    }
    Ok(all)
}

/// Scan an existing rawdata file for sextuplet TNumbers exactly 7 apart.
pub fn check_twin_sextuplets(path: &Path) -> Result<Vec<(BigInt, BigInt)>, SieveError> {
    if !path.is_file() {
        return Err(SieveError::MissingFile(path.to_path_buf()));
    }
    let mut reader = RawPairReader::new(BufReader::new(File::open(path)?));
    let mut twins = Vec::new();
    let mut last: Option<BigInt> = None;
    while let Some((tnum, symbol)) = reader.read_pair()? {
        if symbol != Symbol::Sextuplet {
            continue;
        }
        if let Some(prev) = &last {
            if &tnum - prev == BigInt::from(7) {
                twins.push((prev.clone(), tnum.clone()));
            }
        }
        last = Some(tnum);
    }
    Ok(twins)
}
