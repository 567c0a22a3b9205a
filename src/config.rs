//! Plain-text configuration: where basis files live and where tuplet
//! output goes.
//!
//! One line per setting, `<id>^<label>^<value>`. Id 0 is the basis
//! folder, id 1 the data folder; unknown ids and malformed lines are
//! ignored so the format can grow without breaking old files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::SieveError;

const ID_BASIS_PATH: &str = "0";
const ID_DATA_PATH: &str = "1";
const LABEL_BASIS_PATH: &str = "Basis29Path";
const LABEL_DATA_PATH: &str = "DataPath";

/// Folder settings for the sieve drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub basis_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    /// Both folders defaulted to `dir` (conventionally the home folder).
    pub fn with_default_dir(dir: &Path) -> Config {
        Config {
            basis_dir: dir.to_path_buf(),
            data_dir: dir.to_path_buf(),
        }
    }

    /// Read settings from `path`. Lines that do not parse, and ids that
    /// are unknown, are skipped; values naming a non-existent folder are
    /// rejected.
    pub fn load(path: &Path) -> Result<Config, SieveError> {
        if !path.is_file() {
            return Err(SieveError::MissingFile(path.to_path_buf()));
        }
        let mut config = Config::with_default_dir(Path::new("."));
        for line in fs::read_to_string(path)?.lines() {
            let fields: Vec<&str> = line.split('^').collect();
            if fields.len() != 3 {
                continue;
            }
            let value = Path::new(fields[2].trim());
            match fields[0].trim() {
                ID_BASIS_PATH => {
                    if !value.is_dir() {
                        return Err(SieveError::invalid(format!(
                            "'{}' is not a valid path to a folder",
                            value.display()
                        )));
                    }
                    config.basis_dir = value.to_path_buf();
                }
                ID_DATA_PATH => {
                    if !value.is_dir() {
                        return Err(SieveError::invalid(format!(
                            "'{}' is not a valid path to a folder",
                            value.display()
                        )));
                    }
                    config.data_dir = value.to_path_buf();
                }
                _ => {}
            }
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), SieveError> {
        let mut f = fs::File::create(path)?;
        writeln!(
            f,
            "{}^{}^{}",
            ID_BASIS_PATH,
            LABEL_BASIS_PATH,
            self.basis_dir.display()
        )?;
        writeln!(
            f,
            "{}^{}^{}",
            ID_DATA_PATH,
            LABEL_DATA_PATH,
            self.data_dir.display()
        )?;
        Ok(())
    }
}
