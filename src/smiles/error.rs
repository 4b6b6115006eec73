use thiserror::Error;

use crate::kekulize::KekulizeError;

/// Errors produced when reading a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    EmptyInput,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("invalid element '{text}' at position {pos}")]
    InvalidElement { pos: usize, text: String },

    #[error("unclosed bracket atom starting at position {pos}")]
    UnclosedBracket { pos: usize },

    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },

    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },

    #[error("bond symbol at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },

    #[error("invalid charge at position {pos}")]
    InvalidCharge { pos: usize },

    #[error("isotope overflow at position {pos}")]
    InvalidIsotope { pos: usize },

    #[error("atom class overflow at position {pos}")]
    InvalidAtomClass { pos: usize },

    #[error("invalid ring bond {digit} at position {pos}")]
    InvalidRingBond { digit: u16, pos: usize },

    #[error("conflicting bond types on ring closure {digit}")]
    RingBondConflict { digit: u16 },

    #[error(transparent)]
    Kekulize(#[from] KekulizeError),
}
