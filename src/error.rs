//! Crate-level error type.
//!
//! Toolkit errors ([`SmilesError`]) and persistence errors
//! ([`VocabularyError`]) have their own enums; everything the BDE pipeline
//! surfaces to a caller is an [`Error`].

use thiserror::Error;

use crate::preprocess::VocabularyError;
use crate::smiles::SmilesError;

/// Errors from featurization, fragmentation and prediction.
#[derive(Debug, Error)]
pub enum Error {
    /// The input string is not a valid molecular structure.
    #[error("failed to parse SMILES '{smiles}': {source}")]
    Parse {
        smiles: String,
        #[source]
        source: SmilesError,
    },

    /// A caller-declared bound is smaller than the structure needs.
    #[error("{what} is {max} but the molecule needs {actual}")]
    SizeConstraint {
        /// Which bound (`max_num_nodes` or `max_num_edges`).
        what: &'static str,
        actual: usize,
        max: usize,
    },

    /// A bond index past the explicit-hydrogen structure's bond count.
    #[error("bond index {index} out of range for a molecule with {total} bonds")]
    BondIndexOutOfRange { index: usize, total: usize },

    /// The inference collaborator reported a failure.
    #[error("model inference failed: {0}")]
    Model(String),

    /// The inference collaborator returned arrays that do not cover the batch.
    #[error("model output is {rows}x{columns}, batch needs at least {need_rows}x{need_columns}")]
    ModelOutput {
        rows: usize,
        columns: usize,
        need_rows: usize,
        need_columns: usize,
    },

    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),

    /// The reference table could not be read.
    #[error("reference table: {0}")]
    Reference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options that cannot be honoured, such as a zero batch size.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A consistency check inside the crate failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn parse(smiles: &str, source: SmilesError) -> Self {
        Error::Parse {
            smiles: smiles.to_string(),
            source,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Reference(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_the_input() {
        let err = Error::parse("C1CC", SmilesError::UnclosedRing { digit: 1 });
        let msg = err.to_string();
        assert!(msg.contains("'C1CC'"), "{msg}");
        assert!(msg.contains("unclosed ring 1"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn out_of_range_message() {
        let err = Error::BondIndexOutOfRange { index: 9, total: 7 };
        assert_eq!(err.to_string(), "bond index 9 out of range for a molecule with 7 bonds");
    }

    #[test]
    fn size_constraint_message() {
        let err = Error::SizeConstraint {
            what: "max_num_edges",
            actual: 14,
            max: 10,
        };
        assert_eq!(err.to_string(), "max_num_edges is 10 but the molecule needs 14");
    }
}
