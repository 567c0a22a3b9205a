//! # sextuplet-sieve
//!
//! Enumeration of prime sextuplets (p, p+4, p+6, p+10, p+12, p+16), their
//! left/right quintuplets, and quadruplets over arbitrarily large ranges of
//! the number line.
//!
//! The engine is a two-stage deterministic residue-class sieve over
//! "Templates" (blocks of 30 consecutive integers):
//!
//! - **Stage A** walks the 29-basis: the primes {7..29} repeat their
//!   combined crossing pattern every 7·11·13·17·19·23·29 = 215 656 441
//!   Template Numbers. One pass records, per surviving Template, which
//!   tuplet shape is still possible.
//! - **Stage B** extends a basis stream out to any range using the eight
//!   families {31, 37, 41, 43, 47, 49, 53, 59}: every candidate divisor is
//!   of the form p + 30n, and constant-time lookup tables decide whether
//!   the inflated prime strikes one of the six tuplet positions of a
//!   target Template.
//!
//! Both stages are exposed as iterators ([`basis::BasisGenerator`],
//! [`sieve::TupletSieve`]); the file-producing drivers in [`basis`] and
//! [`sieve`] wrap them in the on-disk raw/pretty/info formats.

use std::path::PathBuf;

pub mod analysis;
pub mod basis;
pub mod config;
pub mod files;
pub mod gte31;
pub mod lte29;
pub mod primality;
pub mod residue;
pub mod sieve;
pub mod symbol;
pub mod template;

/// Errors surfaced by the sieve operations.
///
/// Corrupt basis data is deliberately *not* represented here: raw pair
/// readers treat malformed input as end-of-file and return what was read.
#[derive(Debug, thiserror::Error)]
pub enum SieveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing file or folder: {0}")]
    MissingFile(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SieveError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SieveError::InvalidInput(msg.into())
    }
}
