//! SMILES reading and writing.
//!
//! Reading runs lexing, graph building, implicit hydrogens, kekulization,
//! radical assignment and aromaticity perception, in that order. Writing
//! comes in a display form and a canonical form.

pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod writer;

use crate::mol::Mol;
pub use error::SmilesError;
pub use writer::{canonical_smiles_with_order, to_canonical_smiles, to_smiles};

/// Parse a SMILES string. Surrounding whitespace is ignored.
pub fn parse_smiles(s: &str) -> Result<Mol, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    parser::build(&tokens)
}

pub fn from_smiles(s: &str) -> Result<Mol, SmilesError> {
    parse_smiles(s)
}
