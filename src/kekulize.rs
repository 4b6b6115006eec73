//! Kekulization assigns alternating single and double bonds to aromatic
//! systems.
//!
//! Aromatic bonds come from lowercase SMILES atoms or `:` bonds and arrive
//! flagged with `is_aromatic`. Every atom of the aromatic system that still
//! lacks a double bond is matched to exactly one neighbour through
//! augmenting paths; matched bonds become double. Afterwards all aromatic
//! flags are cleared so aromaticity can be perceived from the Kekulé form.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::bond::BondOrder;
use crate::element;
use crate::mol::Mol;

/// No Kekulé structure exists; holds the atoms left without a double bond.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KekulizeError {
    #[error("cannot kekulize aromatic system: unmatched atoms {}", format_atoms(.0))]
    Unkekulizable(Vec<NodeIndex>),
}

fn format_atoms(atoms: &[NodeIndex]) -> String {
    let ids: Vec<String> = atoms.iter().map(|a| a.index().to_string()).collect();
    format!("[{}]", ids.join(", "))
}

pub fn kekulize(mol: &mut Mol) -> Result<(), KekulizeError> {
    let n = mol.atom_count();
    let mut adj: Vec<Vec<(NodeIndex, EdgeIndex)>> = vec![Vec::new(); n];
    for e in mol.bonds() {
        if !mol.bond(e).is_aromatic {
            continue;
        }
        if let Some((a, b)) = mol.bond_endpoints(e) {
            adj[a.index()].push((b, e));
            adj[b.index()].push((a, e));
        }
    }

    let needs_double: Vec<bool> = mol
        .atoms()
        .map(|idx| !adj[idx.index()].is_empty() && needs_double_bond(mol, idx))
        .collect();

    let mut matched: Vec<Option<EdgeIndex>> = vec![None; n];
    let mut unmatched = Vec::new();
    for start in mol.atoms() {
        if !needs_double[start.index()] || matched[start.index()].is_some() {
            continue;
        }
        if !augment(mol, &adj, &needs_double, &mut matched, start) {
            unmatched.push(start);
        }
    }
    if !unmatched.is_empty() {
        return Err(KekulizeError::Unkekulizable(unmatched));
    }

    let doubles: HashSet<EdgeIndex> = matched.iter().filter_map(|e| *e).collect();
    let edges: Vec<EdgeIndex> = mol.bonds().collect();
    for e in edges {
        let bond = mol.bond_mut(e);
        if bond.is_aromatic {
            bond.order = if doubles.contains(&e) {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
            bond.is_aromatic = false;
        }
    }
    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        mol.atom_mut(idx).is_aromatic = false;
    }
    Ok(())
}

/// Aromatic bonds count one toward the valence; an atom one short of its
/// target needs a double bond. An atom with a fixed hydrogen count two
/// short takes the double bond and keeps one unpaired electron.
fn needs_double_bond(mol: &Mol, idx: NodeIndex) -> bool {
    let atom = mol.atom(idx);
    let used: u8 = mol
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
        .sum::<u8>()
        + atom.hydrogen_count;
    let has_double = mol
        .bonds_of(idx)
        .iter()
        .any(|&e| !mol.bond(e).is_aromatic && mol.bond(e).order != BondOrder::Single);
    if has_double {
        return false;
    }
    match element::target_valence(atom.atomic_num, atom.formal_charge, used) {
        Some(target) => {
            let gap = target.saturating_sub(used);
            gap == 1 || (gap == 2 && atom.no_implicit && atom.hydrogen_count == 0)
        }
        None => false,
    }
}

fn augment(
    mol: &Mol,
    adj: &[Vec<(NodeIndex, EdgeIndex)>],
    needs_double: &[bool],
    matched: &mut [Option<EdgeIndex>],
    start: NodeIndex,
) -> bool {
    let n = mol.atom_count();
    let mut prev: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    visited[start.index()] = true;
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        for &(v, e) in &adj[u.index()] {
            if !needs_double[v.index()] || visited[v.index()] || matched[u.index()] == Some(e) {
                continue;
            }
            visited[v.index()] = true;
            prev[v.index()] = Some((u, e));

            let Some(matched_e) = matched[v.index()] else {
                flip_path(matched, &prev, start, v);
                return true;
            };
            let Some(w) = mol.other_end(matched_e, v) else {
                continue;
            };
            if !visited[w.index()] {
                visited[w.index()] = true;
                prev[w.index()] = Some((v, matched_e));
                queue.push_back(w);
            }
        }
    }
    false
}

fn flip_path(
    matched: &mut [Option<EdgeIndex>],
    prev: &[Option<(NodeIndex, EdgeIndex)>],
    start: NodeIndex,
    end: NodeIndex,
) {
    let mut cur = end;
    let mut take = true;
    while cur != start {
        let Some((p, e)) = prev[cur.index()] else {
            break;
        };
        if take {
            matched[cur.index()] = Some(e);
            matched[p.index()] = Some(e);
        }
        take = !take;
        cur = p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;
    use crate::smiles::SmilesError;

    fn double_count(mol: &Mol) -> usize {
        mol.bonds()
            .filter(|&e| mol.bond(e).order == BondOrder::Double)
            .count()
    }

    fn no_atom_has_two_doubles(mol: &Mol) -> bool {
        mol.atoms().all(|idx| {
            mol.bonds_of(idx)
                .iter()
                .filter(|&&e| mol.bond(e).order == BondOrder::Double)
                .count()
                <= 1
        })
    }

    #[test]
    fn benzene() {
        let mol = from_smiles("c1ccccc1").unwrap();
        assert_eq!(double_count(&mol), 3);
        assert!(no_atom_has_two_doubles(&mol));
        assert!(mol.atoms().all(|i| mol.atom(i).hydrogen_count == 1));
    }

    #[test]
    fn naphthalene() {
        let mol = from_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(mol.bond_count(), 11);
        assert_eq!(double_count(&mol), 5);
        assert!(no_atom_has_two_doubles(&mol));
    }

    #[test]
    fn five_membered_heterocycles() {
        for smiles in ["[nH]1cccc1", "o1cccc1", "s1cccc1", "c1c[nH]cn1", "[cH-]1cccc1"] {
            let mol = from_smiles(smiles).unwrap();
            assert_eq!(double_count(&mol), 2, "{smiles}");
        }
    }

    #[test]
    fn anthracene() {
        let mol = from_smiles("c1ccc2cc3ccccc3cc2c1").unwrap();
        assert_eq!(double_count(&mol), 7);
        assert!(no_atom_has_two_doubles(&mol));
    }

    #[test]
    fn aryl_radical_left_by_a_c_h_cut() {
        let mol = from_smiles("[c]1ccccc1").unwrap();
        assert_eq!(double_count(&mol), 3);
        assert!(no_atom_has_two_doubles(&mol));
    }

    #[test]
    fn exocyclic_double_bond() {
        let mol = from_smiles("O=c1cccc[nH]1").unwrap();
        assert_eq!(double_count(&mol), 3);
    }

    #[test]
    fn odd_ring_without_heteroatom_fails() {
        assert!(matches!(
            from_smiles("c1cccc1"),
            Err(SmilesError::Kekulize(KekulizeError::Unkekulizable(_)))
        ));
        assert!(from_smiles("n1cccc1").is_err());
    }

    #[test]
    fn error_display() {
        let err = KekulizeError::Unkekulizable(vec![NodeIndex::new(0), NodeIndex::new(3)]);
        assert_eq!(
            err.to_string(),
            "cannot kekulize aromatic system: unmatched atoms [0, 3]"
        );
    }
}
