//! Bond dissociation energy estimation on a molecular graph.
//!
//! The crate has two layers. The chemistry toolkit ([`Mol`], SMILES
//! reading and writing, hydrogens, rings, aromaticity, stereo and canonical
//! ranking) provides the structures. The BDE layer builds on it:
//! [`fragment`] enumerates homolytic cleavages, [`preprocess`] turns
//! molecules into integer tensors, and [`predict`] runs a [`BdeModel`] over
//! batches and joins its output back onto bonds.
//!
//! ```no_run
//! use bondcrab::{enumerate_fragments, Molecule};
//!
//! let ethanol = Molecule::new("OCC")?;
//! for row in enumerate_fragments(&ethanol, true)? {
//!     println!("{} {} + {}", row.bond_index, row.fragment1, row.fragment2);
//! }
//! # Ok::<(), bondcrab::Error>(())
//! ```

pub mod aromaticity;
pub mod atom;
pub mod bond;
pub mod canonical;
pub mod chirality;
pub mod conjugation;
pub mod element;
pub mod error;
pub mod fragment;
pub mod graph_ops;
pub mod hydrogen;
pub mod kekulize;
pub mod mol;
pub mod molecule;
pub mod predict;
pub mod preprocess;
pub mod rings;
pub mod smiles;
pub mod valence;

pub use atom::{Atom, Chirality};
pub use bond::{Bond, BondOrder, BondStereo};
pub use error::{Error, Result};
pub use fragment::{enumerate_fragments, enumerate_fragments_with, FragmentOptions, FragmentRecord};
pub use hydrogen::{add_hs, remove_hs};
pub use kekulize::{kekulize, KekulizeError};
pub use mol::Mol;
pub use molecule::Molecule;
pub use predict::{
    BdeModel, ModelOutput, PredictOptions, PredictionRow, Predictor, ReferenceTable, ValidityReport,
};
pub use preprocess::{
    FeatureMap, FeatureSet, FeaturizeOptions, Preprocessor, PreprocessorConfig, Tokenizer, VocabularyError,
};
pub use rings::RingInfo;
pub use smiles::{from_smiles, parse_smiles, to_canonical_smiles, to_smiles, SmilesError};
