//! Hydrogen and radical-electron bookkeeping.
//!
//! Bare SMILES atoms get hydrogens from their lowest default valence. Atoms
//! with a fixed hydrogen count (bracket atoms, cleaved fragments) keep it,
//! and whatever valence they leave unused becomes unpaired electrons.

use petgraph::graph::NodeIndex;

use crate::element::{self, outer_shell_electrons};
use crate::mol::Mol;

/// Kekulé bond orders plus suppressed hydrogens.
pub fn total_valence(mol: &Mol, idx: NodeIndex) -> u8 {
    mol.bond_order_sum(idx) + mol.atom(idx).hydrogen_count
}

/// Valence a SMILES reader would count for a bare atom: aromatic bonds
/// count one, and an aromatic atom adds one for its share of the pi system.
pub(crate) fn smiles_valence(mol: &Mol, idx: NodeIndex) -> u8 {
    let bonds: u8 = mol
        .bonds_of(idx)
        .iter()
        .map(|&e| {
            let bond = mol.bond(e);
            if bond.is_aromatic {
                1
            } else {
                bond.order.valence()
            }
        })
        .sum();
    bonds + u8::from(mol.atom(idx).is_aromatic)
}

/// Hydrogens a reader infers for a bare atom, `None` outside the organic
/// subset.
pub(crate) fn implicit_hydrogens(mol: &Mol, idx: NodeIndex) -> Option<u8> {
    let atom = mol.atom(idx);
    if !element::is_organic_subset(atom.atomic_num) {
        return None;
    }
    let used = smiles_valence(mol, idx);
    let target = element::target_valence(atom.atomic_num, 0, used)?;
    Some(target.saturating_sub(used))
}

pub fn assign_implicit_hydrogens(mol: &mut Mol) {
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        if mol.atom(idx).no_implicit {
            continue;
        }
        let hs = implicit_hydrogens(mol, idx).unwrap_or(0);
        mol.atom_mut(idx).hydrogen_count = hs;
    }
}

/// Unpaired electrons on an atom with a fixed hydrogen count.
pub fn num_radical_electrons(mol: &Mol, idx: NodeIndex) -> u8 {
    let atom = mol.atom(idx);
    let used = total_valence(mol, idx);

    if element::default_valences(atom.atomic_num).is_empty() {
        if mol.degree(idx) > 0 {
            return 0;
        }
        // isolated metal or noble-gas atom: odd valence electron count
        let electrons = outer_shell_electrons(atom.atomic_num) as i16 - atom.formal_charge as i16;
        return if electrons > 0 { (electrons % 2) as u8 } else { 0 };
    }

    match element::target_valence(atom.atomic_num, atom.formal_charge, used) {
        Some(target) if target > used => target - used,
        _ => 0,
    }
}

/// Fill `radical_electrons` for atoms whose hydrogen count was given.
pub fn assign_radicals(mol: &mut Mol) {
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        if !mol.atom(idx).no_implicit {
            continue;
        }
        let radicals = num_radical_electrons(mol, idx);
        mol.atom_mut(idx).radical_electrons = radicals;
    }
}
