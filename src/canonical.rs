//! Canonical atom ranking.
//!
//! Atoms start from ordered invariants and are refined by their
//! neighbours' ranks until the partition stops splitting. Stereo tags are
//! folded in once ranks can tell ligands apart. The refined partition gives
//! the symmetry classes; canonical ranks additionally break the remaining
//! ties by trying each member of the first tied class and keeping the
//! candidate whose SMILES sorts first.

use petgraph::graph::NodeIndex;

use crate::chirality::{ligands, Ligand};
use crate::mol::{permutation_parity, Mol};
use crate::smiles::writer::write_ranked;

/// Tie-break candidates explored before falling back to the first member
/// of each tied class.
const TIE_BREAK_BUDGET: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AtomInvariant {
    atomic_num: u8,
    isotope: u16,
    heavy_degree: usize,
    total_hs: u8,
    formal_charge: i8,
    radical_electrons: u8,
    is_aromatic: bool,
}

fn atom_invariant(mol: &Mol, idx: NodeIndex) -> AtomInvariant {
    let atom = mol.atom(idx);
    AtomInvariant {
        atomic_num: atom.atomic_num,
        isotope: atom.isotope,
        heavy_degree: mol.heavy_degree(idx),
        total_hs: mol.total_hs(idx),
        formal_charge: atom.formal_charge,
        radical_electrons: atom.radical_electrons,
        is_aromatic: atom.is_aromatic,
    }
}

/// Rank = number of atoms with a strictly smaller key, so a tied class of
/// size k owns ranks `r..r + k`.
fn ranks_from_keys<K: Ord>(keys: &[K]) -> Vec<usize> {
    let n = keys.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0usize; n];
    for pos in 1..n {
        let (prev, cur) = (order[pos - 1], order[pos]);
        ranks[cur] = if keys[cur] == keys[prev] {
            ranks[prev]
        } else {
            pos
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

fn bond_code(mol: &Mol, e: petgraph::graph::EdgeIndex) -> u8 {
    let bond = mol.bond(e);
    if bond.is_aromatic {
        4
    } else {
        bond.order.valence()
    }
}

fn refine(mol: &Mol, ranks: &mut Vec<usize>) {
    let mut distinct = count_distinct(ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = mol
            .atoms()
            .map(|a| {
                let mut nbrs: Vec<(usize, u8)> = mol
                    .bonds_of(a)
                    .into_iter()
                    .filter_map(|e| Some((ranks[mol.other_end(e, a)?.index()], bond_code(mol, e))))
                    .collect();
                nbrs.sort_unstable();
                (ranks[a.index()], nbrs)
            })
            .collect();
        let next = ranks_from_keys(&keys);
        let next_distinct = count_distinct(&next);
        if next_distinct == distinct {
            return;
        }
        *ranks = next;
        distinct = next_distinct;
    }
}

/// Ligand ranks around `idx`; implicit hydrogen ranks below every atom.
fn ligand_ranks(mol: &Mol, idx: NodeIndex, ranks: &[usize]) -> Vec<Option<usize>> {
    ligands(mol, idx)
        .into_iter()
        .map(|l| match l {
            Ligand::Atom(n) => Some(ranks[n.index()]),
            Ligand::ImplicitH => None,
        })
        .collect()
}

fn has_ties<T: Ord + Clone>(values: &[T]) -> bool {
    let mut sorted = values.to_vec();
    sorted.sort();
    sorted.windows(2).any(|w| w[0] == w[1])
}

/// Per-atom stereo descriptor under the given ranks: tetrahedral handedness
/// relative to ligand rank order, and the cis/trans relation of the
/// top-ranked substituents on a stereo double bond.
fn stereo_keys(mol: &Mol, ranks: &[usize]) -> Vec<(u8, u8)> {
    let mut keys = vec![(0u8, 0u8); mol.atom_count()];

    for idx in mol.atoms() {
        let tag = mol.atom(idx).chirality;
        if !tag.is_set() {
            continue;
        }
        let lig = ligand_ranks(mol, idx, ranks);
        keys[idx.index()].0 = if has_ties(&lig) {
            3
        } else {
            let mut sorted = lig.clone();
            sorted.sort();
            match tag.permuted(permutation_parity(&lig, &sorted)) {
                crate::atom::Chirality::Ccw => 1,
                _ => 2,
            }
        };
    }

    for e in mol.bonds() {
        let stereo = mol.bond(e).stereo;
        let (Some((ra, rb)), Some((a, b))) = (stereo.refs(), mol.bond_endpoints(e)) else {
            continue;
        };
        let key = match (top_substituent(mol, a, b, ranks), top_substituent(mol, b, a, ranks)) {
            (Some(ta), Some(tb)) => {
                let cis = stereo.is_cis() ^ (ta != ra) ^ (tb != rb);
                if cis {
                    4
                } else {
                    5
                }
            }
            _ => 3,
        };
        keys[a.index()].1 = key;
        keys[b.index()].1 = key;
    }
    keys
}

/// Highest-ranked neighbour of `atom` other than `partner`; `None` when two
/// substituents tie.
fn top_substituent(mol: &Mol, atom: NodeIndex, partner: NodeIndex, ranks: &[usize]) -> Option<NodeIndex> {
    let mut subs: Vec<NodeIndex> = mol
        .neighbors(atom)
        .into_iter()
        .filter(|&n| n != partner)
        .collect();
    subs.sort_by_key(|n| std::cmp::Reverse(ranks[n.index()]));
    match subs.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, second, ..] if ranks[first.index()] != ranks[second.index()] => Some(*first),
        _ => None,
    }
}

fn refine_with_stereo(mol: &Mol, ranks: &mut Vec<usize>) {
    refine(mol, ranks);
    loop {
        let before = count_distinct(ranks);
        let stereo = stereo_keys(mol, ranks);
        let keys: Vec<(usize, (u8, u8))> = (0..ranks.len()).map(|i| (ranks[i], stereo[i])).collect();
        *ranks = ranks_from_keys(&keys);
        refine(mol, ranks);
        if count_distinct(ranks) == before {
            return;
        }
    }
}

/// Ranks that tie exactly for atoms related by the graph's symmetry (as far
/// as iterative refinement can tell).
pub fn symmetry_classes(mol: &Mol) -> Vec<usize> {
    let invariants: Vec<AtomInvariant> = mol.atoms().map(|a| atom_invariant(mol, a)).collect();
    let mut ranks = ranks_from_keys(&invariants);
    refine_with_stereo(mol, &mut ranks);
    ranks
}

/// A unique rank per atom, independent of the input atom order.
pub fn canonical_ranks(mol: &Mol) -> Vec<usize> {
    canonicalize(mol).1
}

pub(crate) fn canonicalize(mol: &Mol) -> (String, Vec<usize>) {
    let classes = symmetry_classes(mol);
    let mut budget = TIE_BREAK_BUDGET;
    break_ties(mol, classes, &mut budget)
}

fn break_ties(mol: &Mol, ranks: Vec<usize>, budget: &mut usize) -> (String, Vec<usize>) {
    let n = ranks.len();
    let mut counts = vec![0usize; n];
    for &r in &ranks {
        counts[r] += 1;
    }
    let Some(tied) = (0..n).find(|&r| counts[r] > 1) else {
        return (write_ranked(mol, &ranks), ranks);
    };

    let members: Vec<usize> = (0..n).filter(|&i| ranks[i] == tied).collect();
    let tries = if *budget > 0 { members.len() } else { 1 };

    let mut best: Option<(String, Vec<usize>)> = None;
    for &candidate in members.iter().take(tries) {
        let mut trial = ranks.clone();
        for &m in &members {
            if m != candidate {
                trial[m] = tied + 1;
            }
        }
        refine_with_stereo(mol, &mut trial);
        *budget = budget.saturating_sub(1);
        let result = break_ties(mol, trial, budget);
        if best.as_ref().map_or(true, |(s, _)| result.0 < *s) {
            best = Some(result);
        }
    }
    best.unwrap_or_else(|| (write_ranked(mol, &ranks), ranks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn classes(smiles: &str) -> Vec<usize> {
        symmetry_classes(&from_smiles(smiles).unwrap())
    }

    #[test]
    fn ethane_atoms_equivalent() {
        let c = classes("CC");
        assert_eq!(c[0], c[1]);
    }

    #[test]
    fn propane_ends_equivalent() {
        let c = classes("CCC");
        assert_eq!(c[0], c[2]);
        assert_ne!(c[0], c[1]);
    }

    #[test]
    fn ethanol_all_distinct() {
        let c = classes("CCO");
        assert_eq!(count_distinct(&c), 3);
    }

    #[test]
    fn benzene_single_class() {
        let c = classes("c1ccccc1");
        assert!(c.iter().all(|&r| r == c[0]));
    }

    #[test]
    fn refinement_splits_by_distance() {
        // pentane: C0/C4, C1/C3, C2
        let c = classes("CCCCC");
        assert_eq!(c[0], c[4]);
        assert_eq!(c[1], c[3]);
        assert_eq!(count_distinct(&c), 3);
    }

    #[test]
    fn canonical_ranks_unique() {
        for smiles in ["CC", "c1ccccc1", "CC(C)(C)C", "OCCO", "C1CC1"] {
            let mol = from_smiles(smiles).unwrap();
            let ranks = canonical_ranks(&mol);
            assert_eq!(count_distinct(&ranks), mol.atom_count(), "{smiles}");
        }
    }

    #[test]
    fn chirality_splits_nothing_in_symmetric_centre() {
        // both substituent arms identical, the tag cannot order them
        let c = classes("C[C@H](CC)CC");
        assert_eq!(c[2], c[4]);
    }

    #[test]
    fn ranks_from_keys_ties_share_lowest() {
        assert_eq!(ranks_from_keys(&[5, 1, 5, 3]), vec![2, 0, 2, 1]);
    }
}
