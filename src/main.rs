//! Command-line driver for the sextuplet sieve.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use num_bigint::BigInt;

use sextuplet_sieve::analysis::{count_clear_channels, CritSectId};
use sextuplet_sieve::basis::{first_templates_files, generate_basis_files, BasisParams};
use sextuplet_sieve::config::Config;
use sextuplet_sieve::files::list_basis_files;
use sextuplet_sieve::gte31::PrimeGte31;
use sextuplet_sieve::residue::{crossing_mod_simple, n_from_tnum};
use sextuplet_sieve::sieve::{
    check_twin_sextuplets, generate_tuplets, generate_tuplets_batch, RangeSpec,
    SieveParams,
};
use sextuplet_sieve::symbol::FilterMode;
use sextuplet_sieve::template::{BASIS_BEGIN, BASIS_END};
use sextuplet_sieve::SieveError;

const USAGE: &str = "\
usage: sextuplet-sieve <command> [args]

commands:
  basis <out-dir> [<from> <to>] [filter]
      Generate a 29-basis rawdata file (default window 28..215656468).
  first27 <out-dir>
      Write the surviving Templates 1..27 (pre-basis bootstrap).
  tuplets <basis-file> <out-dir> basis <k> [filter]
  tuplets <basis-file> <out-dir> tnums <from> <to> [filter]
  tuplets <basis-file> <out-dir> ints <from> <to> [filter]
      Sieve tuplets against a basis file.
  tuplets-batch <basis-file> <out-dir> <from-basis> <to-basis> [filter]
      Sieve a run of consecutive basis numbers.
  twins <rawdata-file>
      Report sextuplet TNumbers exactly 7 apart.
  analyze <tnum[,tnum...]> [max-n]
      Show which family members strike the given Templates.
  clear-channels <from> <to> <max-n>
      Count Templates no family touches in the window.
  list-basis <dir>
      List basis rawdata files in a folder.
  config <path>
      Show the configuration stored at <path>.

filter is 1..6: 1=no filter, 2=sextuplets, 3=left quints, 4=right quints,
5=both quints, 6=quads (default 1).";

fn parse_filter(arg: Option<&String>) -> Result<FilterMode, SieveError> {
    match arg {
        None => Ok(FilterMode::All),
        Some(s) => {
            let menu: u32 = s
                .parse()
                .map_err(|_| SieveError::invalid(format!("filter '{}' is not a number", s)))?;
            if menu < 1 {
                return Err(SieveError::invalid("filter must be 1..6"));
            }
            FilterMode::from_code(menu - 1)
        }
    }
}

fn parse_big(s: &str, what: &str) -> Result<BigInt, SieveError> {
    s.parse()
        .map_err(|_| SieveError::invalid(format!("{} '{}' is not an integer", what, s)))
}

fn parse_u64(s: &str, what: &str) -> Result<u64, SieveError> {
    s.parse()
        .map_err(|_| SieveError::invalid(format!("{} '{}' is not an integer", what, s)))
}

fn cmd_basis(args: &[String]) -> Result<(), SieveError> {
    let out_dir = args
        .first()
        .ok_or_else(|| SieveError::invalid("basis: missing output folder"))?;
    let (from, to, filter_arg) = match args.len() {
        1 => (BASIS_BEGIN, BASIS_END, None),
        2 => (BASIS_BEGIN, BASIS_END, Some(&args[1])),
        3 => (
            parse_u64(&args[1], "from TNumber")?,
            parse_u64(&args[2], "to TNumber")?,
            None,
        ),
        _ => (
            parse_u64(&args[1], "from TNumber")?,
            parse_u64(&args[2], "to TNumber")?,
            Some(&args[3]),
        ),
    };
    let params = BasisParams {
        from,
        to,
        filter: parse_filter(filter_arg)?,
    };
    println!(
        "Generating 29 basis from TNumber {} to {}, filtered by {}",
        params.from,
        params.to,
        params.filter.description()
    );
    let (stats, raw_path) = generate_basis_files(Path::new(out_dir), &params)?;
    println!("{}", stats.counts);
    println!("written: {}", raw_path.display());
    Ok(())
}

fn cmd_tuplets(args: &[String]) -> Result<(), SieveError> {
    if args.len() < 4 {
        return Err(SieveError::invalid("tuplets: not enough arguments"));
    }
    let basis_file = PathBuf::from(&args[0]);
    let out_dir = PathBuf::from(&args[1]);
    let (range, filter_arg) = match args[2].as_str() {
        "basis" => (
            RangeSpec::Basis(parse_big(&args[3], "basis number")?),
            args.get(4),
        ),
        "tnums" if args.len() >= 5 => (
            RangeSpec::TNums(
                parse_big(&args[3], "from TNumber")?,
                parse_big(&args[4], "to TNumber")?,
            ),
            args.get(5),
        ),
        "ints" if args.len() >= 5 => (
            RangeSpec::Integers(
                parse_big(&args[3], "from integer")?,
                parse_big(&args[4], "to integer")?,
            ),
            args.get(5),
        ),
        mode => {
            return Err(SieveError::invalid(format!(
                "tuplets: unknown mode '{}' (basis|tnums|ints)",
                mode
            )))
        }
    };
    let params = SieveParams {
        range,
        filter: parse_filter(filter_arg)?,
    };
    let stats = generate_tuplets(&params, &basis_file, &out_dir)?;
    println!("{}", stats.counts);
    if !stats.twins.is_empty() {
        println!("Twin sextuplets found, TNumbers:");
        for (a, b) in &stats.twins {
            println!("{} {}", a, b);
        }
    }
    println!(
        "written:\n{}\n{}\n{}",
        stats.raw_path.display(),
        stats.pretty_path.display(),
        stats.info_path.display()
    );
    Ok(())
}

fn cmd_tuplets_batch(args: &[String]) -> Result<(), SieveError> {
    if args.len() < 4 {
        return Err(SieveError::invalid("tuplets-batch: not enough arguments"));
    }
    let basis_file = PathBuf::from(&args[0]);
    let out_dir = PathBuf::from(&args[1]);
    let from_basis = parse_big(&args[2], "from basis number")?;
    let to_basis = parse_big(&args[3], "to basis number")?;
    let filter = parse_filter(args.get(4))?;
    let all = generate_tuplets_batch(&from_basis, &to_basis, filter, &basis_file, &out_dir)?;
    for stats in &all {
        println!("{}", stats.raw_path.display());
        println!("{}\n", stats.counts);
    }
    Ok(())
}

fn cmd_twins(args: &[String]) -> Result<(), SieveError> {
    let path = args
        .first()
        .ok_or_else(|| SieveError::invalid("twins: missing rawdata file"))?;
    let twins = check_twin_sextuplets(Path::new(path))?;
    for (a, b) in &twins {
        println!("{}\n{}\n", b, a);
    }
    println!("finished: {}", twins.len());
    Ok(())
}

fn cmd_analyze(args: &[String]) -> Result<(), SieveError> {
    let list = args
        .first()
        .ok_or_else(|| SieveError::invalid("analyze: missing TNumber list"))?;
    let max_n: Option<BigInt> = match args.get(1) {
        Some(s) => Some(parse_big(s, "max n")?),
        None => None,
    };
    let families = PrimeGte31::all_families();

    for part in list.split(',') {
        let t = parse_big(part.trim(), "TNumber")?;
        if t < BigInt::from(32) {
            println!("Skipping {}, TNumbers must be >= 32", t);
            continue;
        }
        let section = CritSectId::from_tnum(&t)?;
        println!(
            "==== Target: {}  (critical section id {}, family {}, n {})",
            t,
            section.id_int(),
            section.family_value(),
            section.n()
        );
        for family in &families {
            let mut n_stop = n_from_tnum(&t, family);
            if let Some(cap) = &max_n {
                n_stop = n_stop.min(cap.clone());
            }
            print!("p {}  max n {}: ", family.value(), n_stop);
            let mut struck = false;
            let mut n = BigInt::from(0);
            while n <= n_stop {
                let offset = crossing_mod_simple(&t, &n, family);
                if let Some(effect) = family.strike_at(&offset, &n) {
                    struck = true;
                    print!(
                        "[n={} member {} offset {} -> {}] ",
                        n,
                        family.member_at(&n),
                        offset,
                        effect.glyph().trim()
                    );
                }
                n += 1;
            }
            println!("{}", if struck { "" } else { "ok" });
        }
        println!();
    }
    Ok(())
}

fn cmd_clear_channels(args: &[String]) -> Result<(), SieveError> {
    if args.len() < 3 {
        return Err(SieveError::invalid("clear-channels: need <from> <to> <max-n>"));
    }
    let from = parse_big(&args[0], "from TNumber")?;
    let to = parse_big(&args[1], "to TNumber")?;
    let max_n = parse_big(&args[2], "max n")?;
    let report = count_clear_channels(&from, &to, &max_n)?;
    println!(
        "clear channels: {} ({} true sextuplets, {} unused)",
        report.clear.len(),
        report.true_sextuplets.len(),
        report.unused.len()
    );
    for t in &report.true_sextuplets {
        println!("sextuplet at TNumber {}", t);
    }
    for t in &report.unused {
        println!("unused clear channel at TNumber {}", t);
    }
    Ok(())
}

fn cmd_list_basis(args: &[String]) -> Result<(), SieveError> {
    let dir = args
        .first()
        .ok_or_else(|| SieveError::invalid("list-basis: missing folder"))?;
    let found = list_basis_files(Path::new(dir))?;
    if found.is_empty() {
        println!("<no standard files found>");
    }
    for (i, path) in found.iter().enumerate() {
        println!("{} : {}", i, path.display());
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> Result<(), SieveError> {
    let path = args
        .first()
        .ok_or_else(|| SieveError::invalid("config: missing path"))?;
    let config = Config::load(Path::new(path))?;
    println!("Basis29Path: {}", config.basis_dir.display());
    println!("DataPath: {}", config.data_dir.display());
    Ok(())
}

fn run() -> Result<(), SieveError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(c) => c.as_str(),
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };
    let rest = &args[1..];
    match command {
        "basis" => cmd_basis(rest),
        "first27" => {
            let out_dir = rest
                .first()
                .ok_or_else(|| SieveError::invalid("first27: missing output folder"))?;
            let (counts, raw_path) = first_templates_files(Path::new(out_dir))?;
            println!("{}", counts);
            println!("written: {}", raw_path.display());
            Ok(())
        }
        "tuplets" => cmd_tuplets(rest),
        "tuplets-batch" => cmd_tuplets_batch(rest),
        "twins" => cmd_twins(rest),
        "analyze" => cmd_analyze(rest),
        "clear-channels" => cmd_clear_channels(rest),
        "list-basis" => cmd_list_basis(rest),
        "config" => cmd_config(rest),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => Err(SieveError::invalid(format!("unknown command '{}'", other))),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}
