//! Tuplet symbols, their combination algebra, and filter modes.
//!
//! A symbol records which tuplet shape is still possible at a Template
//! after the strikes applied so far. Two strikes destroy disjoint
//! candidate positions, so combining them yields the intersection of the
//! still-possible shapes: left + right quintuplet leaves the inner
//! quadruplet, anything + destroyed is destroyed.

use std::fmt;

use crate::SieveError;

/// Tuplet shape still possible at a Template. The integer codes are the
/// byte values used in raw data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// All six candidate positions open: (p, p+4, p+6, p+10, p+12, p+16).
    Sextuplet = 0,
    /// Left-handed quintuplet, first five positions (ends at offset 24).
    LQuint29 = 1,
    /// Right-handed quintuplet, last five positions (starts at offset 16).
    RQuint13 = 2,
    /// Inner quadruplet, offsets 16..24.
    Quad = 3,
    /// No tuplet shape possible.
    Destroyed = 4,
}

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Sextuplet,
        Symbol::LQuint29,
        Symbol::RQuint13,
        Symbol::Quad,
        Symbol::Destroyed,
    ];

    /// File/byte code, 0..4.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Symbol> {
        match code {
            0 => Some(Symbol::Sextuplet),
            1 => Some(Symbol::LQuint29),
            2 => Some(Symbol::RQuint13),
            3 => Some(Symbol::Quad),
            4 => Some(Symbol::Destroyed),
            _ => None,
        }
    }

    /// Bit used by the filter masks.
    pub fn mask(self) -> u32 {
        1 << (self as u32)
    }

    /// Combine two strike results on the same Template.
    ///
    /// Commutative and associative, with `Sextuplet` as identity and
    /// `Destroyed` absorbing.
    pub fn combine(self, other: Symbol) -> Symbol {
        use Symbol::*;
        match (self, other) {
            (Destroyed, _) | (_, Destroyed) => Destroyed,
            (Sextuplet, s) | (s, Sextuplet) => s,
            (Quad, _) | (_, Quad) => Quad,
            (LQuint29, LQuint29) => LQuint29,
            (RQuint13, RQuint13) => RQuint13,
            (LQuint29, RQuint13) | (RQuint13, LQuint29) => Quad,
        }
    }

    /// True for shapes that survive as tuplets (code <= Quad).
    pub fn is_tuplet(self) -> bool {
        self != Symbol::Destroyed
    }

    /// Full display glyph, as used in pretty files.
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Sextuplet => "┣━┫",
            Symbol::LQuint29 => "┣━ ",
            Symbol::RQuint13 => " ━┫",
            Symbol::Quad => " ━ ",
            Symbol::Destroyed => " X ",
        }
    }

    /// Compact glyph; sextuplets get a quieter dot in dense listings.
    pub fn brief_glyph(self) -> &'static str {
        match self {
            Symbol::Sextuplet => " ● ",
            other => other.glyph(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

const MASK_S: u32 = 1 << 0;
const MASK_L: u32 = 1 << 1;
const MASK_R: u32 = 1 << 2;
const MASK_Q: u32 = 1 << 3;
const MASK_X: u32 = 1 << 4;

/// Which tuplet shapes a generation run keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Everything that is still a tuplet.
    All,
    Sextuplets,
    LeftQuints,
    RightQuints,
    BothQuints,
    Quads,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 6] = [
        FilterMode::All,
        FilterMode::Sextuplets,
        FilterMode::LeftQuints,
        FilterMode::RightQuints,
        FilterMode::BothQuints,
        FilterMode::Quads,
    ];

    /// Numeric selector as used by the driver (0-based, matching the
    /// order of [`FilterMode::ALL_MODES`]).
    pub fn from_code(code: u32) -> Result<FilterMode, SieveError> {
        FilterMode::ALL_MODES
            .get(code as usize)
            .copied()
            .ok_or_else(|| {
                SieveError::invalid(format!("filter code {} out of range 0..5", code))
            })
    }

    /// Masks for the basis generator: `disallow` short-circuits the
    /// per-prime fold, `final_pass` selects what is emitted.
    ///
    /// The `All` mode only short-circuits on destruction and passes plain
    /// sextuplets through; that is what makes the resulting basis file
    /// reusable for every later filter choice.
    pub fn basis_filters(self) -> (u32, u32) {
        match self {
            FilterMode::All => (MASK_X, MASK_S | MASK_L | MASK_R | MASK_Q),
            FilterMode::Sextuplets => (MASK_L | MASK_R | MASK_Q | MASK_X, MASK_S),
            FilterMode::LeftQuints => (MASK_R | MASK_Q | MASK_X, MASK_L),
            FilterMode::RightQuints => (MASK_L | MASK_Q | MASK_X, MASK_R),
            FilterMode::BothQuints => (MASK_Q | MASK_X, MASK_L | MASK_R),
            FilterMode::Quads => (MASK_X, MASK_Q),
        }
    }

    /// Masks for the tuplet sieve: `pre` admits incoming basis symbols
    /// (a sextuplet may still be whittled down to the requested shape),
    /// `post` rejects finished symbols.
    pub fn sieve_filters(self) -> (u32, u32) {
        match self {
            FilterMode::All => (MASK_S | MASK_L | MASK_R | MASK_Q, MASK_X),
            FilterMode::Sextuplets => (MASK_S, MASK_L | MASK_R | MASK_Q | MASK_X),
            FilterMode::LeftQuints => (MASK_S | MASK_L, MASK_S | MASK_R | MASK_Q | MASK_X),
            FilterMode::RightQuints => (MASK_S | MASK_R, MASK_S | MASK_L | MASK_Q | MASK_X),
            FilterMode::BothQuints => {
                (MASK_S | MASK_L | MASK_R, MASK_S | MASK_Q | MASK_X)
            }
            FilterMode::Quads => {
                (MASK_S | MASK_L | MASK_R | MASK_Q, MASK_S | MASK_L | MASK_R | MASK_X)
            }
        }
    }

    /// Short designation used in file names.
    pub fn abbrev(self) -> &'static str {
        match self {
            FilterMode::All => "6L5R5Q",
            FilterMode::Sextuplets => "6",
            FilterMode::LeftQuints => "L5",
            FilterMode::RightQuints => "R5",
            FilterMode::BothQuints => "L5R5",
            FilterMode::Quads => "Q",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FilterMode::All => "no filter",
            FilterMode::Sextuplets => "Sextuplets only",
            FilterMode::LeftQuints => "Left Quints only",
            FilterMode::RightQuints => "Right Quints only",
            FilterMode::BothQuints => "Left and Right Quints only",
            FilterMode::Quads => "Quads only",
        }
    }
}

/// Per-run tally of emitted symbols, in file-code order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolCounts {
    pub sextuplets: u64,
    pub lquints: u64,
    pub rquints: u64,
    pub quads: u64,
}

impl SymbolCounts {
    pub fn new() -> SymbolCounts {
        SymbolCounts::default()
    }

    pub fn record(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::Sextuplet => self.sextuplets += 1,
            Symbol::LQuint29 => self.lquints += 1,
            Symbol::RQuint13 => self.rquints += 1,
            Symbol::Quad => self.quads += 1,
            Symbol::Destroyed => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.sextuplets + self.lquints + self.rquints + self.quads
    }
}

impl fmt::Display for SymbolCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Sextuplets", self.sextuplets)?;
        writeln!(f, "{} LQuints", self.lquints)?;
        writeln!(f, "{} RQuints", self.rquints)?;
        writeln!(f, "{} Quads", self.quads)?;
        write!(f, "Sum of found Symbols: {}", self.total())
    }
}
