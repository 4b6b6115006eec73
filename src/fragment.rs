//! Homolytic bond cleavage: every bond whose removal splits the molecule in
//! two, the radical fragments it yields, and how stereo changes.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::EdgeIndex;
use serde::Serialize;

use crate::bond::BondOrder;
use crate::chirality::{cleanup_stereo, count_stereo, StereoCounts};
use crate::error::{Error, Result};
use crate::graph_ops::{components_without, extract};
use crate::hydrogen::remove_hs;
use crate::mol::Mol;
use crate::molecule::Molecule;
use crate::rings::RingInfo;
use crate::smiles::to_canonical_smiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOptions {
    /// Keep only the lowest bond index of each distinct fragment pair.
    pub drop_duplicates: bool,
    /// Skip double and triple bonds.
    pub single_bonds_only: bool,
}

impl Default for FragmentOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            single_bonds_only: true,
        }
    }
}

/// One breakable bond and the pair of radicals it leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentRecord {
    /// Canonical SMILES of the parent.
    pub molecule: String,
    /// Bond index in the explicit-hydrogen structure.
    pub bond_index: usize,
    /// Sorted element symbols of the two ends, e.g. `C-H`.
    pub bond_type: String,
    pub fragment1: String,
    pub fragment2: String,
    pub delta_assigned_stereo: i64,
    pub delta_unassigned_stereo: i64,
}

impl FragmentRecord {
    pub fn fragments(&self) -> (&str, &str) {
        (&self.fragment1, &self.fragment2)
    }
}

pub fn enumerate_fragments(molecule: &Molecule, drop_duplicates: bool) -> Result<Vec<FragmentRecord>> {
    enumerate_fragments_with(
        molecule,
        &FragmentOptions {
            drop_duplicates,
            ..FragmentOptions::default()
        },
    )
}

/// Rows in ascending bond index. With `drop_duplicates`, a bond whose
/// fragment pair was already produced by a lower index is left out.
///
/// A cut must leave exactly two pieces, so a disconnected input such as a
/// salt (`[Na+].[Cl-]`) or a mixture (`CC.O`) yields no rows.
pub fn enumerate_fragments_with(molecule: &Molecule, opts: &FragmentOptions) -> Result<Vec<FragmentRecord>> {
    let mol_h = molecule.mol_with_hs();
    let components = components_without(mol_h, None).len();
    if components > 1 {
        log::debug!(
            "{}: {} disconnected components, no cut leaves two fragments",
            molecule.smiles(),
            components
        );
    }
    let rings = RingInfo::new(mol_h);
    let parent = parent_stereo(molecule);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut rows = Vec::new();
    let mut breakable = 0usize;
    for e in mol_h.bonds() {
        if !is_breakable(mol_h, &rings, e, opts) {
            continue;
        }
        let Some(record) = cleave(molecule, e, parent)? else {
            continue;
        };
        breakable += 1;
        if opts.drop_duplicates && !seen.insert((record.fragment1.clone(), record.fragment2.clone())) {
            continue;
        }
        rows.push(record);
    }
    log::debug!(
        "{}: {} breakable bonds, {} rows",
        molecule.smiles(),
        breakable,
        rows.len()
    );
    Ok(rows)
}

/// Break one bond of the explicit-hydrogen structure regardless of its order.
/// `Ok(None)` when the bond does not disconnect the molecule.
pub fn fragment_bond(molecule: &Molecule, bond_index: usize) -> Result<Option<FragmentRecord>> {
    molecule.bond_with_explicit_h(bond_index)?;
    cleave(molecule, EdgeIndex::new(bond_index), parent_stereo(molecule))
}

/// Whether the enumeration policy breaks bond `e`.
pub fn is_breakable(mol_h: &Mol, rings: &RingInfo, e: EdgeIndex, opts: &FragmentOptions) -> bool {
    let bond = mol_h.bond(e);
    if rings.is_ring_bond(e) {
        return false;
    }
    !opts.single_bonds_only || (bond.order == BondOrder::Single && !bond.is_aromatic)
}

fn parent_stereo(molecule: &Molecule) -> StereoCounts {
    let mut mol = molecule.mol().clone();
    cleanup_stereo(&mut mol);
    count_stereo(&mol)
}

fn cleave(molecule: &Molecule, e: EdgeIndex, parent: StereoCounts) -> Result<Option<FragmentRecord>> {
    let mol_h = molecule.mol_with_hs();
    let Some((a, b)) = mol_h.bond_endpoints(e) else {
        return Ok(None);
    };
    let parts = components_without(mol_h, Some(e));
    if parts.len() != 2 {
        return Ok(None);
    }

    let electrons = mol_h.bond(e).order.valence();
    let mut cut = mol_h.clone();
    for end in [a, b] {
        let atom = cut.atom_mut(end);
        atom.radical_electrons += electrons;
        atom.no_implicit = true;
    }

    let pieces: Vec<Mol> = parts
        .iter()
        .map(|part| {
            let mut frag = remove_hs(&extract(&cut, part));
            cleanup_stereo(&mut frag);
            frag
        })
        .collect();
    check_stoichiometry(mol_h, &pieces).map_err(|detail| {
        Error::Internal(format!(
            "bond {} of {}: {detail}",
            e.index(),
            molecule.smiles()
        ))
    })?;

    let stereo = count_stereo(&pieces[0]) + count_stereo(&pieces[1]);
    let mut smiles: Vec<String> = pieces.iter().map(to_canonical_smiles).collect();
    smiles.sort();
    let mut symbols = [mol_h.atom(a).symbol(), mol_h.atom(b).symbol()];
    symbols.sort();

    let [fragment1, fragment2]: [String; 2] = smiles
        .try_into()
        .map_err(|_| Error::Internal("cleavage produced more than two fragments".into()))?;
    Ok(Some(FragmentRecord {
        molecule: molecule.smiles().to_string(),
        bond_index: e.index(),
        bond_type: symbols.join("-"),
        fragment1,
        fragment2,
        delta_assigned_stereo: stereo.assigned() as i64 - parent.assigned() as i64,
        delta_unassigned_stereo: stereo.unassigned() as i64 - parent.unassigned() as i64,
    }))
}

/// Element counts with suppressed hydrogens included.
fn element_counts(mol: &Mol) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        *counts.entry(atom.atomic_num).or_insert(0) += 1;
        if atom.hydrogen_count > 0 {
            *counts.entry(crate::element::HYDROGEN).or_insert(0) += atom.hydrogen_count as usize;
        }
    }
    counts
}

fn check_stoichiometry(parent: &Mol, pieces: &[Mol]) -> std::result::Result<(), String> {
    let expected = element_counts(parent);
    let mut found: BTreeMap<u8, usize> = BTreeMap::new();
    for piece in pieces {
        for (z, n) in element_counts(piece) {
            *found.entry(z).or_insert(0) += n;
        }
    }
    if expected == found {
        Ok(())
    } else {
        Err(format!("fragments hold {found:?}, parent holds {expected:?}"))
    }
}
