//! Bond conjugation flags.
//!
//! Aromatic bonds are conjugated. Otherwise a multiple bond is conjugated
//! with a neighbouring bond when all three atoms can donate or accept pi
//! electrons (sp2/sp-like, at most three connections).

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bond::BondOrder;
use crate::element::{default_valences, outer_shell_electrons};
use crate::mol::Mol;
use crate::valence::total_valence;

fn connections(mol: &Mol, idx: NodeIndex) -> u8 {
    mol.degree(idx) as u8 + mol.atom(idx).hydrogen_count
}

/// Electrons available for a pi system: unused valence plus lone pairs,
/// minus unpaired electrons. `-1` for atoms that cannot take part.
fn pi_available(mol: &Mol, idx: NodeIndex) -> i16 {
    let atom = mol.atom(idx);
    let Some(&default_valence) = default_valences(atom.atomic_num).first() else {
        return -1;
    };
    if default_valence <= 1 {
        return -1;
    }
    let degree = connections(mol, idx);
    if degree > 3 {
        return -1;
    }
    let outer = outer_shell_electrons(atom.atomic_num) as i16;
    let lone = (outer - default_valence as i16 - atom.formal_charge as i16).max(0);
    (default_valence as i16 - degree as i16) + lone - atom.radical_electrons as i16
}

fn is_candidate(mol: &Mol, idx: NodeIndex) -> bool {
    let atom = mol.atom(idx);
    let Some(&default_valence) = default_valences(atom.atomic_num).first() else {
        return false;
    };
    if default_valence <= 1 {
        return false;
    }
    if atom.formal_charge == 0 && total_valence(mol, idx) > default_valence {
        return false;
    }
    let outer = outer_shell_electrons(atom.atomic_num);
    // third-row and heavier N/O analogues only join through two or more bonds
    let row_ok = atom.atomic_num <= 10 || (outer != 5 && outer != 6) || (outer == 6 && connections(mol, idx) < 2);
    row_ok && pi_available(mol, idx) > 0
}

/// One flag per bond, by bond index.
pub fn conjugated_bonds(mol: &Mol) -> Vec<bool> {
    let mut conjugated = vec![false; mol.bond_count()];

    for e in mol.bonds() {
        if mol.bond(e).is_aromatic {
            conjugated[e.index()] = true;
        }
    }

    for center in mol.atoms() {
        if !is_candidate(mol, center) || !(2..=3).contains(&connections(mol, center)) {
            continue;
        }
        let bonds: Vec<EdgeIndex> = mol.bonds_of(center);
        for &multiple in &bonds {
            if mol.bond(multiple).order == BondOrder::Single {
                continue;
            }
            let Some(far) = mol.other_end(multiple, center) else {
                continue;
            };
            if !is_candidate(mol, far) {
                continue;
            }
            for &other in &bonds {
                if other == multiple {
                    continue;
                }
                let Some(next) = mol.other_end(other, center) else {
                    continue;
                };
                if connections(mol, next) <= 3 && is_candidate(mol, next) {
                    conjugated[multiple.index()] = true;
                    conjugated[other.index()] = true;
                }
            }
        }
    }

    conjugated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrogen::add_hs;
    use crate::smiles::from_smiles;

    fn conj(smiles: &str) -> Vec<bool> {
        conjugated_bonds(&from_smiles(smiles).unwrap())
    }

    #[test]
    fn isolated_bonds() {
        assert_eq!(conj("CC"), vec![false]);
        assert_eq!(conj("C=C"), vec![false]);
        assert_eq!(conj("CC=C"), vec![false, false]);
        assert!(conj("C1CCCCC1").iter().all(|&c| !c));
    }

    #[test]
    fn dienes_and_enones() {
        assert_eq!(conj("C=CC=C"), vec![true, true, true]);
        assert_eq!(conj("C=CC=O"), vec![true, true, true]);
    }

    #[test]
    fn carbonyl_neighbours() {
        // C-C, C=O, C-O
        assert_eq!(conj("CC(=O)O"), vec![false, true, true]);
        // C-C, C-N, C=O
        assert_eq!(conj("CC(N)=O"), vec![false, true, true]);
    }

    #[test]
    fn aryl_substituents() {
        assert!(conj("Nc1ccccc1")[0]);
        assert!(conj("Oc1ccccc1")[0]);
        assert!(!conj("Cc1ccccc1")[0]);
    }

    #[test]
    fn explicit_hydrogens_do_not_change_flags() {
        let mol = from_smiles("C=CC=O").unwrap();
        let with_h = conjugated_bonds(&add_hs(&mol));
        assert_eq!(&with_h[..3], &[true, true, true]);
        assert!(with_h[3..].iter().all(|&c| !c));
    }
}
