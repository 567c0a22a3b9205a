//! End-to-end tests through the on-disk formats: Stage A basis files
//! feeding Stage B tuplet runs, with brute-force primality as the
//! referee.

use std::fs;
use std::path::Path;

use num_bigint::BigInt;

use sextuplet_sieve::basis::{
    first_templates_files, generate_basis_files, BasisParams,
};
use sextuplet_sieve::files::{change_file_ext, RawPairReader, EXT_INFO, EXT_PRETTY};
use sextuplet_sieve::primality::{is_probably_prime, DEFAULT_ROUNDS};
use sextuplet_sieve::sieve::{
    generate_tuplets, generate_tuplets_batch, RangeSpec, SieveParams,
};
use sextuplet_sieve::symbol::{FilterMode, Symbol};
use sextuplet_sieve::template::tnum_to_int;
use sextuplet_sieve::SieveError;

fn big(n: i64) -> BigInt {
    BigInt::from(n)
}

fn small_basis_file(dir: &Path, to: u64) -> std::path::PathBuf {
    let params = BasisParams {
        from: 28,
        to,
        filter: FilterMode::All,
    };
    let (_, raw_path) = generate_basis_files(dir, &params).unwrap();
    raw_path
}

/// Shape of Template `t` by direct primality of its six candidates.
fn shape_of(t: &BigInt) -> Option<Symbol> {
    let begin = tnum_to_int(t);
    let prime = |offset: u32| is_probably_prime(&(&begin + offset), DEFAULT_ROUNDS);
    if !(prime(16) && prime(18) && prime(22) && prime(24)) {
        return None;
    }
    match (prime(12), prime(28)) {
        (true, true) => Some(Symbol::Sextuplet),
        (true, false) => Some(Symbol::LQuint29),
        (false, true) => Some(Symbol::RQuint13),
        (false, false) => Some(Symbol::Quad),
    }
}

fn read_pairs(path: &Path) -> Vec<(BigInt, Symbol)> {
    let mut reader =
        RawPairReader::new(std::io::BufReader::new(fs::File::open(path).unwrap()));
    let mut pairs = Vec::new();
    while let Some(pair) = reader.read_pair().unwrap() {
        pairs.push(pair);
    }
    pairs
}

#[test]
fn test_basis_file_naming_and_content() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = small_basis_file(dir.path(), 2000);
    assert_eq!(
        raw_path.file_name().unwrap().to_str().unwrap(),
        "29basis_28_2000_6L5R5Q.rawdata29"
    );
    assert!(change_file_ext(&raw_path, EXT_INFO).is_file());

    let pairs = read_pairs(&raw_path);
    assert!(!pairs.is_empty());
    for w in pairs.windows(2) {
        assert!(w[0].0 < w[1].0, "basis entries must ascend");
    }
    assert!(pairs.contains(&(big(535), Symbol::Sextuplet)));
}

#[test]
fn test_basis_runs_are_reproducible() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let path_a = small_basis_file(dir_a.path(), 20_000);
    let path_b = small_basis_file(dir_b.path(), 20_000);
    assert_eq!(fs::read(path_a).unwrap(), fs::read(path_b).unwrap());
}

#[test]
fn test_sextuplet_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let basis_path = small_basis_file(dir.path(), 2000);

    let params = SieveParams {
        range: RangeSpec::TNums(big(28), big(2000)),
        filter: FilterMode::Sextuplets,
    };
    let stats = generate_tuplets(&params, &basis_path, dir.path()).unwrap();
    assert_eq!(
        stats.raw_path.file_name().unwrap().to_str().unwrap(),
        "juusprimes_basis-0_28_2000_6.rawdata"
    );
    assert_eq!(stats.counts.sextuplets, 3);
    assert_eq!(stats.counts.total(), 3);

    let pairs = read_pairs(&stats.raw_path);
    let tnums: Vec<BigInt> = pairs.iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(tnums, vec![big(535), big(647), big(1459)]);
    assert!(pairs.iter().all(|(_, s)| *s == Symbol::Sextuplet));

    let pretty = fs::read_to_string(&stats.pretty_path).unwrap();
    assert!(pretty.contains("BASIS:0"));
    assert!(pretty.contains("TNum = 535"));
    assert!(pretty.contains("16057"));
    assert!(!pretty.contains("reports false"));

    let info = fs::read_to_string(&stats.info_path).unwrap();
    assert!(info.contains("3 Sextuplets"));
    assert!(info.contains("Sextuplets only"));
}

#[test]
fn test_all_modes_agree_with_brute_force() {
    let dir = tempfile::tempdir().unwrap();
    let basis_path = small_basis_file(dir.path(), 1200);

    let mut expected_by_shape: std::collections::BTreeMap<BigInt, Symbol> =
        Default::default();
    for t in 28..=1200i64 {
        if let Some(symbol) = shape_of(&big(t)) {
            expected_by_shape.insert(big(t), symbol);
        }
    }

    for filter in FilterMode::ALL_MODES {
        let params = SieveParams {
            range: RangeSpec::TNums(big(28), big(1200)),
            filter,
        };
        let stats = generate_tuplets(&params, &basis_path, dir.path()).unwrap();
        let pairs = read_pairs(&stats.raw_path);

        let expected: Vec<(BigInt, Symbol)> = expected_by_shape
            .iter()
            .filter(|(_, s)| {
                let keep = match filter {
                    FilterMode::All => true,
                    FilterMode::Sextuplets => **s == Symbol::Sextuplet,
                    FilterMode::LeftQuints => **s == Symbol::LQuint29,
                    FilterMode::RightQuints => **s == Symbol::RQuint13,
                    FilterMode::BothQuints => {
                        **s == Symbol::LQuint29 || **s == Symbol::RQuint13
                    }
                    FilterMode::Quads => **s == Symbol::Quad,
                };
                keep
            })
            .map(|(t, s)| (t.clone(), *s))
            .collect();
        assert_eq!(pairs, expected, "filter {:?}", filter);
    }
}

#[test]
fn test_batch_runs_and_validation() {
    let dir = tempfile::tempdir().unwrap();
    let basis_path = small_basis_file(dir.path(), 2000);

    // Invalid basis spans are rejected up front.
    assert!(matches!(
        generate_tuplets_batch(&big(-1), &big(0), FilterMode::All, &basis_path, dir.path()),
        Err(SieveError::InvalidInput(_))
    ));
    assert!(matches!(
        generate_tuplets_batch(&big(2), &big(1), FilterMode::All, &basis_path, dir.path()),
        Err(SieveError::InvalidInput(_))
    ));
}

#[test]
fn test_missing_inputs_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let params = SieveParams {
        range: RangeSpec::Basis(big(0)),
        filter: FilterMode::All,
    };
    assert!(matches!(
        generate_tuplets(&params, Path::new("/nonexistent.rawdata29"), dir.path()),
        Err(SieveError::MissingFile(_))
    ));

    let basis_path = small_basis_file(dir.path(), 2000);
    assert!(matches!(
        generate_tuplets(&params, &basis_path, Path::new("/nonexistent-dir")),
        Err(SieveError::MissingFile(_))
    ));
}

#[test]
fn test_corrupt_basis_file_yields_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    let basis_path = small_basis_file(dir.path(), 2000);
    // Truncate mid-pair and append junk.
    let mut data = fs::read(&basis_path).unwrap();
    data.extend_from_slice(b"999\nnot-a-symbol\n");
    let corrupt_path = dir.path().join("29basis_corrupt.rawdata29");
    fs::write(&corrupt_path, &data).unwrap();

    let params = SieveParams {
        range: RangeSpec::TNums(big(28), big(2000)),
        filter: FilterMode::Sextuplets,
    };
    let stats = generate_tuplets(&params, &corrupt_path, dir.path()).unwrap();
    // Everything before the junk is still produced.
    assert_eq!(stats.counts.sextuplets, 3);
}

#[test]
fn test_first27_files() {
    let dir = tempfile::tempdir().unwrap();
    let (counts, raw_path) = first_templates_files(dir.path()).unwrap();
    assert!(counts.total() > 0);
    assert!(raw_path.file_name().unwrap().to_str().unwrap().ends_with(".rawdata23"));
    assert!(change_file_ext(&raw_path, EXT_PRETTY).is_file());
    assert!(change_file_ext(&raw_path, EXT_INFO).is_file());

    // Below 27·30 + 24 every composite candidate has a prime factor
    // under 29, so the bootstrap survivors are exactly the Templates
    // whose candidates spell a tuplet shape.
    let pairs = read_pairs(&raw_path);
    let by_tnum: std::collections::BTreeMap<BigInt, Symbol> =
        pairs.iter().cloned().collect();
    for t in 1..=27i64 {
        assert_eq!(
            by_tnum.get(&big(t)).copied(),
            shape_of(&big(t)),
            "bootstrap shape mismatch at TNumber {}",
            t
        );
    }
    assert_eq!(by_tnum.get(&big(3)).copied(), Some(Symbol::Sextuplet));
}
