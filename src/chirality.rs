//! Stereo bookkeeping: ligand order for tetrahedral tags, carrying tags into
//! derived structures, and perception of potential stereo elements.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Chirality;
use crate::bond::{BondOrder, BondStereo};
use crate::canonical::symmetry_classes;
use crate::mol::{permutation_parity, Mol};
use crate::rings::RingInfo;

/// Smallest ring a double bond may sit in and still carry cis/trans.
const MIN_STEREO_RING: usize = 8;

/// One of the (up to four) things around a tetrahedral centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ligand {
    ImplicitH,
    Atom(NodeIndex),
}

/// The order chirality tags refer to: the suppressed hydrogen first (if
/// there is exactly one), then neighbours by ascending index.
pub fn ligands(mol: &Mol, idx: NodeIndex) -> Vec<Ligand> {
    let mut out = Vec::with_capacity(4);
    if mol.atom(idx).hydrogen_count == 1 {
        out.push(Ligand::ImplicitH);
    }
    out.extend(mol.neighbors(idx).into_iter().map(Ligand::Atom));
    out
}

/// Re-express `tag` for a new ligand order. `old` lists the centre's former
/// ligands already translated into the new structure's terms; the tag is
/// dropped when a ligand went missing.
pub fn carry_chirality(tag: Chirality, old: &[Ligand], new: &[Ligand]) -> Chirality {
    if !tag.is_set() || old.len() != new.len() || old.len() < 3 {
        return Chirality::None;
    }
    let mut a = old.to_vec();
    let mut b = new.to_vec();
    a.sort();
    b.sort();
    if a != b {
        return Chirality::None;
    }
    tag.permuted(permutation_parity(old, new))
}

/// Atoms that can be tetrahedral stereocentres: four ligands (an implicit
/// hydrogen counts) with four different symmetry classes, single bonds only.
pub fn potential_stereocenters(mol: &Mol) -> Vec<NodeIndex> {
    let classes = symmetry_classes(mol);
    mol.atoms()
        .filter(|&idx| is_potential_center(mol, idx, &classes))
        .collect()
}

fn is_potential_center(mol: &Mol, idx: NodeIndex, classes: &[usize]) -> bool {
    let atom = mol.atom(idx);
    if atom.is_aromatic || atom.hydrogen_count > 1 || atom.radical_electrons > 0 {
        return false;
    }
    let lig = ligands(mol, idx);
    if lig.len() != 4 {
        return false;
    }
    if mol
        .bonds_of(idx)
        .iter()
        .any(|&e| mol.bond(e).order != BondOrder::Single || mol.bond(e).is_aromatic)
    {
        return false;
    }
    let mut keys: Vec<Option<usize>> = lig
        .iter()
        .map(|l| match l {
            Ligand::ImplicitH => None,
            Ligand::Atom(n) => Some(classes[n.index()]),
        })
        .collect();
    keys.sort();
    keys.dedup();
    keys.len() == 4
}

/// Double bonds that can carry cis/trans: outside small rings, each end with
/// two different substituents (or a single one on a nitrogen lone pair).
pub fn potential_stereo_bonds(mol: &Mol) -> Vec<EdgeIndex> {
    let classes = symmetry_classes(mol);
    let rings = RingInfo::new(mol);
    mol.bonds()
        .filter(|&e| is_potential_stereo_bond(mol, e, &classes, &rings))
        .collect()
}

fn is_potential_stereo_bond(mol: &Mol, e: EdgeIndex, classes: &[usize], rings: &RingInfo) -> bool {
    let bond = mol.bond(e);
    if bond.order != BondOrder::Double || bond.is_aromatic {
        return false;
    }
    if rings.bond_ring_size(e).is_some_and(|s| s < MIN_STEREO_RING) {
        return false;
    }
    let Some((a, b)) = mol.bond_endpoints(e) else {
        return false;
    };
    end_is_stereogenic(mol, a, b, classes) && end_is_stereogenic(mol, b, a, classes)
}

fn end_is_stereogenic(mol: &Mol, atom: NodeIndex, partner: NodeIndex, classes: &[usize]) -> bool {
    let doubles = mol
        .bonds_of(atom)
        .iter()
        .filter(|&&e| mol.bond(e).order != BondOrder::Single)
        .count();
    if doubles > 1 {
        return false;
    }
    let subs: Vec<NodeIndex> = mol
        .neighbors(atom)
        .into_iter()
        .filter(|&n| n != partner)
        .collect();
    let hs = mol.atom(atom).hydrogen_count;
    match (subs.as_slice(), hs) {
        ([x, y], 0) => classes[x.index()] != classes[y.index()],
        ([_], 1) => true,
        ([_], 0) => mol.atom(atom).atomic_num == 7,
        _ => false,
    }
}

/// Drop tags from atoms and bonds that are not stereogenic.
pub fn cleanup_stereo(mol: &mut Mol) {
    let centers = potential_stereocenters(mol);
    let bonds = potential_stereo_bonds(mol);
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        if mol.atom(idx).chirality.is_set() && !centers.contains(&idx) {
            mol.atom_mut(idx).chirality = Chirality::None;
        }
    }
    let edges: Vec<EdgeIndex> = mol.bonds().collect();
    for e in edges {
        if mol.bond(e).stereo.is_set() && !bonds.contains(&e) {
            mol.bond_mut(e).stereo = BondStereo::None;
        }
    }
}

/// Potential stereo elements split by whether a configuration is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoCounts {
    pub atom_assigned: usize,
    pub atom_unassigned: usize,
    pub bond_assigned: usize,
    pub bond_unassigned: usize,
}

impl StereoCounts {
    pub fn assigned(&self) -> usize {
        self.atom_assigned + self.bond_assigned
    }

    pub fn unassigned(&self) -> usize {
        self.atom_unassigned + self.bond_unassigned
    }
}

impl std::ops::Add for StereoCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            atom_assigned: self.atom_assigned + rhs.atom_assigned,
            atom_unassigned: self.atom_unassigned + rhs.atom_unassigned,
            bond_assigned: self.bond_assigned + rhs.bond_assigned,
            bond_unassigned: self.bond_unassigned + rhs.bond_unassigned,
        }
    }
}

pub fn count_stereo(mol: &Mol) -> StereoCounts {
    let mut counts = StereoCounts::default();
    for idx in potential_stereocenters(mol) {
        if mol.atom(idx).chirality.is_set() {
            counts.atom_assigned += 1;
        } else {
            counts.atom_unassigned += 1;
        }
    }
    for e in potential_stereo_bonds(mol) {
        if mol.bond(e).stereo.is_set() {
            counts.bond_assigned += 1;
        } else {
            counts.bond_unassigned += 1;
        }
    }
    counts
}
