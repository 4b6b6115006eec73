//! Atom and bond descriptors.
//!
//! Descriptors are plain values computed from the structure alone; their
//! `Display` form is what the tokenizers learn, so vocabularies stay
//! readable in the persisted JSON.

use std::fmt;
use std::str::FromStr;

use petgraph::graph::{EdgeIndex, NodeIndex};

use super::VocabularyError;
use crate::atom::Chirality;
use crate::conjugation::conjugated_bonds;
use crate::mol::Mol;
use crate::rings::RingInfo;

/// Rings at or above this size share the `max` ring descriptor.
pub const MAX_RING_SIZE: usize = 6;

/// Which descriptor functions a preprocessor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureSet {
    /// Element, degree, charge, aromaticity and ring membership.
    Basic,
    /// Adds radicals, chirality, ring size and hydrogen count.
    #[default]
    Extended,
}

impl FeatureSet {
    pub fn name(self) -> &'static str {
        match self {
            FeatureSet::Basic => "basic",
            FeatureSet::Extended => "extended",
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureSet {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(FeatureSet::Basic),
            "extended" => Ok(FeatureSet::Extended),
            other => Err(VocabularyError::UnknownFeatures(other.to_string())),
        }
    }
}

/// Smallest ring size, `max` from [`MAX_RING_SIZE`] up, `0` outside rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingSize {
    Acyclic,
    Size(usize),
    Max,
}

impl RingSize {
    pub fn capped(size: Option<usize>) -> Self {
        match size {
            None => RingSize::Acyclic,
            Some(s) if s < MAX_RING_SIZE => RingSize::Size(s),
            Some(_) => RingSize::Max,
        }
    }
}

impl fmt::Display for RingSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingSize::Acyclic => f.write_str("0"),
            RingSize::Size(s) => write!(f, "{s}"),
            RingSize::Max => f.write_str("max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomDescriptor {
    Basic {
        symbol: &'static str,
        degree: usize,
        formal_charge: i8,
        aromatic: bool,
        in_ring: bool,
    },
    Extended {
        symbol: &'static str,
        radical_electrons: u8,
        formal_charge: i8,
        chirality: Chirality,
        aromatic: bool,
        ring_size: RingSize,
        degree: usize,
        total_hs: u8,
    },
}

impl fmt::Display for AtomDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomDescriptor::Basic {
                symbol,
                degree,
                formal_charge,
                aromatic,
                in_ring,
            } => write!(f, "({symbol}, {degree}, {formal_charge}, {aromatic}, {in_ring})"),
            AtomDescriptor::Extended {
                symbol,
                radical_electrons,
                formal_charge,
                chirality,
                aromatic,
                ring_size,
                degree,
                total_hs,
            } => write!(
                f,
                "({symbol}, {radical_electrons}, {formal_charge}, {chirality}, {aromatic}, {ring_size}, {degree}, {total_hs})"
            ),
        }
    }
}

/// A bond seen along one directed edge: `begin` is the edge's source atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BondDescriptor {
    pub set: FeatureSet,
    pub begin: &'static str,
    pub end: &'static str,
    pub order: &'static str,
    pub conjugated: bool,
    pub ring_size: RingSize,
}

impl fmt::Display for BondDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} {} {}", self.begin, self.end, self.order, self.conjugated)?;
        match (self.set, self.ring_size) {
            (FeatureSet::Basic, ring) => write!(f, " {}", ring != RingSize::Acyclic),
            (FeatureSet::Extended, RingSize::Acyclic) => Ok(()),
            (FeatureSet::Extended, ring) => write!(f, " R{ring}"),
        }
    }
}

/// Per-molecule data the descriptors share: ring sizes and conjugation.
pub struct FeatureContext<'a> {
    mol: &'a Mol,
    rings: RingInfo,
    conjugated: Vec<bool>,
}

impl<'a> FeatureContext<'a> {
    pub fn new(mol: &'a Mol) -> Self {
        Self {
            mol,
            rings: RingInfo::new(mol),
            conjugated: conjugated_bonds(mol),
        }
    }

    pub fn mol(&self) -> &'a Mol {
        self.mol
    }
}

pub fn atom_descriptor(set: FeatureSet, ctx: &FeatureContext<'_>, idx: NodeIndex) -> AtomDescriptor {
    let mol = ctx.mol;
    let atom = mol.atom(idx);
    match set {
        FeatureSet::Basic => AtomDescriptor::Basic {
            symbol: atom.symbol(),
            degree: mol.degree(idx),
            formal_charge: atom.formal_charge,
            aromatic: atom.is_aromatic,
            in_ring: ctx.rings.is_ring_atom(idx),
        },
        FeatureSet::Extended => AtomDescriptor::Extended {
            symbol: atom.symbol(),
            radical_electrons: atom.radical_electrons,
            formal_charge: atom.formal_charge,
            chirality: atom.chirality,
            aromatic: atom.is_aromatic,
            ring_size: RingSize::capped(ctx.rings.atom_ring_size(idx)),
            degree: mol.degree(idx),
            total_hs: mol.total_hs(idx),
        },
    }
}

/// Descriptor of bond `e` read from its end atom when `flipped`.
pub fn bond_descriptor(set: FeatureSet, ctx: &FeatureContext<'_>, e: EdgeIndex, flipped: bool) -> BondDescriptor {
    let mol = ctx.mol;
    let bond = mol.bond(e);
    let (begin, end) = match mol.bond_endpoints(e) {
        Some((a, b)) => (mol.atom(a).symbol(), mol.atom(b).symbol()),
        None => ("*", "*"),
    };
    let (begin, end) = if flipped { (end, begin) } else { (begin, end) };
    BondDescriptor {
        set,
        begin,
        end,
        order: bond.type_name(),
        conjugated: ctx.conjugated.get(e.index()).copied().unwrap_or(false),
        ring_size: RingSize::capped(ctx.rings.bond_ring_size(e)),
    }
}
