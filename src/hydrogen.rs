//! Converting between suppressed and explicit hydrogens.
//!
//! Both directions build a new [`Mol`]; the input is never modified.

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::chirality::{carry_chirality, ligands, Ligand};
use crate::graph_ops::{remap_bond_stereo, remap_chirality};
use crate::mol::Mol;

/// Make every suppressed hydrogen a graph atom.
///
/// Existing atoms and bonds keep their indices. New hydrogens are appended
/// parent by parent in atom order and their bonds in the same order, so a
/// bond index at or past the input's bond count always names an X–H bond.
pub fn add_hs(mol: &Mol) -> Mol {
    let mut out = Mol::new();
    for idx in mol.atoms() {
        let mut atom = mol.atom(idx).clone();
        atom.hydrogen_count = 0;
        atom.no_implicit = true;
        out.add_atom(atom);
    }
    for e in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(e) {
            out.add_bond(a, b, mol.bond(e).clone());
        }
    }

    let mut added: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    for idx in mol.atoms() {
        for k in 0..mol.atom(idx).hydrogen_count {
            let h = out.add_atom(Atom {
                no_implicit: true,
                ..Atom::new(crate::element::HYDROGEN)
            });
            out.add_bond(idx, h, Bond::single());
            if k == 0 {
                added[idx.index()] = Some(h);
            }
        }
    }

    for idx in mol.atoms() {
        let tag = mol.atom(idx).chirality;
        if !tag.is_set() {
            continue;
        }
        let old: Vec<Ligand> = ligands(mol, idx)
            .into_iter()
            .map(|l| match (l, added[idx.index()]) {
                (Ligand::ImplicitH, Some(h)) => Ligand::Atom(h),
                (other, _) => other,
            })
            .collect();
        let new = ligands(&out, idx);
        out.atom_mut(idx).chirality = carry_chirality(tag, &old, &new);
    }
    out
}

/// Which hydrogens [`remove_hs`] folds back into their neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveHsOptions {
    pub keep_isotopes: bool,
    pub keep_charged: bool,
}

impl Default for RemoveHsOptions {
    fn default() -> Self {
        Self {
            keep_isotopes: true,
            keep_charged: true,
        }
    }
}

fn is_removable(mol: &Mol, idx: NodeIndex, opts: &RemoveHsOptions) -> bool {
    let atom = mol.atom(idx);
    if !atom.is_hydrogen() || atom.radical_electrons > 0 || mol.degree(idx) != 1 {
        return false;
    }
    if opts.keep_isotopes && atom.isotope != 0 {
        return false;
    }
    if opts.keep_charged && atom.formal_charge != 0 {
        return false;
    }
    let Some(&parent) = mol.neighbors(idx).first() else {
        return false;
    };
    let bond_single = mol
        .bond_between(idx, parent)
        .is_some_and(|e| mol.bond(e).order == BondOrder::Single);
    bond_single && !mol.atom(parent).is_hydrogen()
}

pub fn remove_hs(mol: &Mol) -> Mol {
    remove_hs_with(mol, &RemoveHsOptions::default())
}

/// Fold removable hydrogens into their neighbour's hydrogen count. A lone
/// hydrogen atom (the `[H]` radical, H2) is kept.
pub fn remove_hs_with(mol: &Mol, opts: &RemoveHsOptions) -> Mol {
    let removable: Vec<bool> = mol.atoms().map(|i| is_removable(mol, i, opts)).collect();

    let mut out = Mol::new();
    let mut map: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    for idx in mol.atoms() {
        if removable[idx.index()] {
            continue;
        }
        map[idx.index()] = Some(out.add_atom(mol.atom(idx).clone()));
    }
    for e in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(e) else {
            continue;
        };
        match (map[a.index()], map[b.index()]) {
            (Some(na), Some(nb)) => {
                out.add_bond(na, nb, mol.bond(e).clone());
            }
            (Some(parent), None) | (None, Some(parent)) => {
                out.atom_mut(parent).hydrogen_count += 1;
            }
            (None, None) => {}
        }
    }

    remap_chirality(mol, &mut out, &map, Some(Ligand::ImplicitH));
    remap_bond_stereo(&mut out, &map);
    out
}
