//! On-disk formats and naming conventions.
//!
//! Raw data files are linear ASCII pair streams: for every entry, one
//! line with the TNumber and one line with the symbol code 0..4. No
//! header, no separator; EOF terminates. Readers treat malformed input
//! (odd line count, non-numeric line, out-of-range symbol) as EOF and
//! keep whatever was read before it.
//!
//! Pretty files are the human-readable mirror; info files describe a run
//! and are never machine-parsed.

use std::fs;
use std::io::{BufRead, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use num_bigint::BigInt;

use crate::basis::BasisStats;
use crate::primality::{is_probably_prime, DEFAULT_ROUNDS};
use crate::symbol::{FilterMode, Symbol, SymbolCounts};
use crate::template::{tnum_last_int, tnum_to_int};
use crate::SieveError;

pub const PREFIX_BASIS: &str = "29basis";
pub const PREFIX_TUPLETS: &str = "juusprimes";
pub const EXT_RAW29: &str = ".rawdata29";
pub const EXT_RAW23: &str = ".rawdata23";
pub const EXT_RAW: &str = ".rawdata";
pub const EXT_PRETTY: &str = ".prettydata";
pub const EXT_INFO: &str = ".info";

/// Decimal string of `n`, or the MD5 hex of that string once it exceeds
/// 31 digits (about the length of the hash), keeping file names bounded
/// and clash-free.
pub fn adjust_num_for_filename(n: &BigInt) -> String {
    let s = n.to_string();
    if s.len() > 31 {
        format!("{:x}", md5::compute(s.as_bytes()))
    } else {
        s
    }
}

/// `29basis_<from>_<to>_<filter>.rawdata29`
pub fn basis_filename(from: &BigInt, to: &BigInt, filter: FilterMode) -> String {
    format!(
        "{}_{}_{}_{}{}",
        PREFIX_BASIS,
        adjust_num_for_filename(from),
        adjust_num_for_filename(to),
        filter.abbrev(),
        EXT_RAW29
    )
}

/// `juusprimes_basis-<k>_<from>_<to>_<filter>.rawdata`
pub fn tuplet_filename(
    basis: &BigInt,
    from: &BigInt,
    to: &BigInt,
    filter: FilterMode,
) -> String {
    format!(
        "{}_basis-{}_{}_{}_{}{}",
        PREFIX_TUPLETS,
        adjust_num_for_filename(basis),
        adjust_num_for_filename(from),
        adjust_num_for_filename(to),
        filter.abbrev(),
        EXT_RAW
    )
}

/// Swap the extension of `path` for `new_ext` (which carries its dot).
pub fn change_file_ext(path: &Path, new_ext: &str) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => &name[..],
    };
    path.with_file_name(format!("{}{}", stem, new_ext))
}

/// Basis raw files in `dir`, sorted by name.
pub fn list_basis_files(dir: &Path) -> Result<Vec<PathBuf>, SieveError> {
    if !dir.is_dir() {
        return Err(SieveError::MissingFile(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(PREFIX_BASIS) && name.ends_with(EXT_RAW29) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Append one raw pair.
pub fn write_raw_pair(
    w: &mut impl Write,
    tnum: &BigInt,
    symbol: Symbol,
) -> std::io::Result<()> {
    writeln!(w, "{}", tnum)?;
    writeln!(w, "{}", symbol.code())
}

/// Reader over a raw pair stream. Any malformed line ends the stream.
pub struct RawPairReader<R> {
    reader: R,
    line: String,
    done: bool,
}

impl<R: BufRead> RawPairReader<R> {
    pub fn new(reader: R) -> RawPairReader<R> {
        RawPairReader {
            reader,
            line: String::new(),
            done: false,
        }
    }

    fn read_line(&mut self) -> std::io::Result<Option<&str>> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim()))
    }

    /// Next `(TNumber, Symbol)` pair, or `None` at (effective) EOF.
    pub fn read_pair(&mut self) -> std::io::Result<Option<(BigInt, Symbol)>> {
        if self.done {
            return Ok(None);
        }
        let tnum: BigInt = match self.read_line()? {
            Some(line) => match line.parse() {
                Ok(t) => t,
                Err(_) => {
                    self.done = true;
                    return Ok(None);
                }
            },
            None => {
                self.done = true;
                return Ok(None);
            }
        };
        let symbol = match self.read_line()? {
            Some(line) => match line.parse::<u8>().ok().and_then(Symbol::from_code) {
                Some(s) => s,
                None => {
                    self.done = true;
                    return Ok(None);
                }
            },
            None => {
                self.done = true;
                return Ok(None);
            }
        };
        Ok(Some((tnum, symbol)))
    }
}

impl<R: BufRead + Seek> RawPairReader<R> {
    /// Back to the top of the stream (basis wrap).
    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.done = false;
        Ok(())
    }
}

/// Carries the per-entry context of a pretty file: the basis-0 TNumber
/// label of the current entry and a one-shot notification (printed once,
/// then cleared) for basis changes.
pub struct PrettyState {
    pub basis_tnum: String,
    pub notify: Option<String>,
}

impl PrettyState {
    pub fn new(basis_tnum: &str) -> PrettyState {
        PrettyState {
            basis_tnum: basis_tnum.to_string(),
            notify: None,
        }
    }
}

/// Header block of a pretty file.
pub fn write_pretty_header(
    w: &mut impl Write,
    from: &BigInt,
    to: &BigInt,
    filter: FilterMode,
    basis_file: &Path,
) -> std::io::Result<()> {
    writeln!(w, "TNumbers from {} to {}", from, to)?;
    writeln!(
        w,
        "(Natural #'s from {} to {})",
        tnum_to_int(from),
        tnum_last_int(to)
    )?;
    writeln!(w, "29Basis file used: {}", basis_file.display())?;
    writeln!(w, "filtered by: {}", filter.description())
}

fn write_candidate(w: &mut impl Write, value: &BigInt) -> std::io::Result<()> {
    write!(w, "{}", value)?;
    // Exact below 2^64; no false negatives above it, so a flag here marks
    // a result worth a second look.
    if !is_probably_prime(value, DEFAULT_ROUNDS) {
        writeln!(w, "  <== ProbablyPrime reports false!")
    } else {
        writeln!(w)
    }
}

/// One human-readable entry: location, shape glyph, and the candidate
/// integers, with destroyed positions shown as `x`.
pub fn write_pretty_entry(
    w: &mut impl Write,
    tnum: &BigInt,
    symbol: Symbol,
    state: &mut PrettyState,
) -> std::io::Result<()> {
    if let Some(notify) = state.notify.take() {
        writeln!(w, "{}\n", notify)?;
    }

    let begin = tnum_to_int(tnum);
    writeln!(w, "TNum = {}", tnum)?;
    writeln!(w, "BeginsAt : {}", begin)?;
    writeln!(w, "EndsAt : {}", tnum_last_int(tnum))?;
    writeln!(w, "[Basis-0-TNum : {}]", state.basis_tnum)?;
    writeln!(w, "---primes---   {} ({})", symbol.glyph(), symbol.code())?;

    match symbol {
        Symbol::Sextuplet | Symbol::LQuint29 => {
            for offset in [12u32, 16, 18, 22, 24] {
                write_candidate(w, &(&begin + offset))?;
            }
            if symbol == Symbol::Sextuplet {
                write_candidate(w, &(&begin + 28u32))?;
            } else {
                writeln!(w, "x")?;
            }
        }
        Symbol::RQuint13 | Symbol::Quad => {
            writeln!(w, "x")?;
            for offset in [16u32, 18, 22, 24] {
                write_candidate(w, &(&begin + offset))?;
            }
            if symbol == Symbol::RQuint13 {
                write_candidate(w, &(&begin + 28u32))?;
            } else {
                writeln!(w, "x")?;
            }
        }
        Symbol::Destroyed => {
            writeln!(w, "Symbol '{}' is not a tuplet shape.", symbol.code())?;
        }
    }
    writeln!(w)
}

/// Final counts block shared by info files.
pub fn write_symbol_counts(
    w: &mut impl Write,
    from: &BigInt,
    to: &BigInt,
    filter: FilterMode,
    counts: &SymbolCounts,
) -> std::io::Result<()> {
    writeln!(w, "\nFinal counts (from TNumber {} to {})", from, to)?;
    writeln!(
        w,
        "(Natural numbers from {} to {})",
        tnum_to_int(from),
        tnum_last_int(to)
    )?;
    writeln!(w, "(filtered by: {})", filter.description())?;
    writeln!(w, "{}\n", counts)
}

const INFO_DATA_FORMAT: &str = "The rawdata file is linear, in TNumber order, \
and uses a pair of lines per entry: the first line is the Template Number, \
the second is the integer symbol of the tuplet structure there. TNumbers \
chunk the number line into blocks of 30: Template T starts at 30*T - 5 and \
ends at 30*T + 24.";

const INFO_SYMBOLS: &str = "Symbol codes:\n\
0 = Sextuplet  = ┣━┫\n\
1 = LQuint_29  = ┣━\n\
2 = RQuint_13  =  ━┫\n\
3 = Quadruplet =  ━\n\
\n\
From/To numbers longer than 31 digits appear as md5 sums in file names to \
keep them under the filename length limit.";

fn write_filter_designations(w: &mut impl Write) -> std::io::Result<()> {
    writeln!(w, "Filter designations in file names:\n")?;
    for mode in FilterMode::ALL_MODES {
        writeln!(w, "{} = {}", mode.abbrev(), mode.description())?;
    }
    writeln!(w)
}

/// Info sidecar of a basis generation run.
pub fn write_basis_info(
    w: &mut impl Write,
    from: &BigInt,
    to: &BigInt,
    filter: FilterMode,
    stats: &BasisStats,
) -> std::io::Result<()> {
    write_symbol_counts(w, from, to, filter, &stats.counts)?;
    writeln!(w, "{}\n", INFO_DATA_FORMAT)?;
    writeln!(w, "{}\n", INFO_SYMBOLS)?;
    write_filter_designations(w)?;
    writeln!(
        w,
        "Starting and ending natural-progression offsets of the basis primes.\n\
         Over one whole basis every offset returns to one below its start,\n\
         which is what makes the pattern repeat.\n"
    )?;
    writeln!(w, "Starting (TNumber {}):", from)?;
    for (value, idx) in &stats.start_indexes {
        writeln!(w, "{}: {}", value, idx)?;
    }
    writeln!(w, "\nEnding (TNumber {}):", to)?;
    for (value, idx) in &stats.end_indexes {
        writeln!(w, "{}: {}", value, idx)?;
    }
    writeln!(w)
}

/// Info sidecar of the TNumbers 1..27 bootstrap.
pub fn write_first_templates_info(
    w: &mut impl Write,
    counts: &SymbolCounts,
) -> std::io::Result<()> {
    writeln!(
        w,
        "Surviving tuplet structures in Template Numbers 1 to 27.\n\n\
         These precede the 29-basis (prime 29 starts at TNumber 28) and are \
         kept separate for completeness. Do not prepend them to a 29basis \
         rawdata file: the generation routines expect the default basis.\n"
    )?;
    writeln!(w, "{}\n", counts)?;
    writeln!(w, "{}\n", INFO_SYMBOLS)
}

/// Info sidecar of a tuplet sieve run.
pub fn write_tuplets_info(
    w: &mut impl Write,
    from: &BigInt,
    to: &BigInt,
    filter: FilterMode,
    counts: &SymbolCounts,
    twins: &[(BigInt, BigInt)],
    basis_file: &Path,
) -> std::io::Result<()> {
    write_symbol_counts(w, from, to, filter, counts)?;
    if twins.is_empty() {
        writeln!(w, "No twin sextuplets found.\n")?;
    } else {
        writeln!(w, "Twin sextuplets found, TNumbers:")?;
        for (a, b) in twins {
            writeln!(w, "{} {}", a, b)?;
        }
        writeln!(w)?;
    }
    writeln!(w, "29Basis file used: {}", basis_file.display())?;
    writeln!(w, "{}\n", INFO_DATA_FORMAT)?;
    writeln!(w, "{}\n", INFO_SYMBOLS)?;
    write_filter_designations(w)
}
