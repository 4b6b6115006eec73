//! A parsed molecule together with its canonical SMILES.

use std::cell::OnceCell;
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::error::{Error, Result};
use crate::hydrogen::{add_hs, remove_hs};
use crate::mol::Mol;
use crate::smiles::{parse_smiles, to_canonical_smiles};

/// A successfully parsed structure and its canonical SMILES.
///
/// The structure is the parse of the canonical string itself, so anything
/// that re-reads [`Molecule::smiles`] sees the same atom and bond numbering.
/// The explicit-hydrogen form is derived on first use and cached.
#[derive(Clone)]
pub struct Molecule {
    smiles: String,
    mol: Mol,
    mol_h: OnceCell<Mol>,
}

impl Molecule {
    /// Parse `smiles` and canonicalize it. Explicit hydrogens in the input
    /// are folded into their atoms first.
    pub fn new(smiles: &str) -> Result<Self> {
        let parsed = parse_smiles(smiles).map_err(|e| Error::parse(smiles, e))?;
        let canonical = to_canonical_smiles(&remove_hs(&parsed));
        let mol = parse_smiles(&canonical).map_err(|e| {
            Error::Internal(format!("canonical SMILES '{canonical}' of '{smiles}' does not parse: {e}"))
        })?;
        Ok(Self {
            smiles: canonical,
            mol,
            mol_h: OnceCell::new(),
        })
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn mol(&self) -> &Mol {
        &self.mol
    }

    /// The structure with every hydrogen as an atom. Bond indices used by
    /// fragment records and feature tensors refer to this form.
    pub fn mol_with_hs(&self) -> &Mol {
        self.mol_h.get_or_init(|| add_hs(&self.mol))
    }

    pub fn num_bonds_with_hs(&self) -> usize {
        self.mol_with_hs().bond_count()
    }

    /// Endpoints of bond `index` in the explicit-hydrogen structure.
    pub fn bond_with_explicit_h(&self, index: usize) -> Result<(NodeIndex, NodeIndex)> {
        let mol_h = self.mol_with_hs();
        let total = mol_h.bond_count();
        if index >= total {
            return Err(Error::BondIndexOutOfRange { index, total });
        }
        mol_h
            .bond_endpoints(EdgeIndex::new(index))
            .ok_or(Error::BondIndexOutOfRange { index, total })
    }
}

impl fmt::Debug for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Molecule")
            .field("smiles", &self.smiles)
            .field("atoms", &self.mol.atom_count())
            .field("bonds", &self.mol.bond_count())
            .finish()
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.smiles)
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.smiles == other.smiles
    }
}

impl Eq for Molecule {}

impl std::str::FromStr for Molecule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Molecule::new(s)
    }
}
