use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Chirality;
use crate::bond::BondStereo;
use crate::chirality::{carry_chirality, ligands, Ligand};
use crate::mol::Mol;

/// Atom sets of the connected pieces, each sorted, in order of their lowest
/// atom index.
pub fn connected_components(mol: &Mol) -> Vec<Vec<NodeIndex>> {
    components_without(mol, None)
}

pub fn num_components(mol: &Mol) -> usize {
    connected_components(mol).len()
}

/// Connected pieces left after deleting `skip`.
pub fn components_without(mol: &Mol, skip: Option<EdgeIndex>) -> Vec<Vec<NodeIndex>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for node in mol.atoms() {
        if visited[node.index()] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            component.push(current);
            for e in mol.bonds_of(current) {
                if Some(e) == skip {
                    continue;
                }
                if let Some(next) = mol.other_end(e, current) {
                    if !visited[next.index()] {
                        stack.push(next);
                    }
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

/// The induced subgraph on `atoms`, renumbered in the order given.
///
/// Stereo tags follow their atoms; a centre that lost a ligand loses its
/// tag, and a double bond whose reference atom was cut off switches to the
/// remaining substituent on that end.
pub fn extract(mol: &Mol, atoms: &[NodeIndex]) -> Mol {
    let mut map: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    let mut out = Mol::new();
    for &idx in atoms {
        map[idx.index()] = Some(out.add_atom(mol.atom(idx).clone()));
    }
    for e in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(e) else {
            continue;
        };
        if let (Some(na), Some(nb)) = (map[a.index()], map[b.index()]) {
            out.add_bond(na, nb, mol.bond(e).clone());
        }
    }
    remap_chirality(mol, &mut out, &map, None);
    remap_bond_stereo(&mut out, &map);
    out
}

/// Re-express chirality tags after a rebuild. `map` takes old atoms to new
/// ones; an old ligand with no image becomes `missing` (or is lost).
pub(crate) fn remap_chirality(
    old: &Mol,
    new: &mut Mol,
    map: &[Option<NodeIndex>],
    missing: Option<Ligand>,
) {
    for idx in old.atoms() {
        let Some(new_idx) = map[idx.index()] else {
            continue;
        };
        let tag = old.atom(idx).chirality;
        if !tag.is_set() {
            continue;
        }
        let before = ligands(old, idx);
        let translated: Vec<Ligand> = before
            .iter()
            .filter_map(|l| match *l {
                Ligand::Atom(n) => map[n.index()].map(Ligand::Atom).or(missing),
                Ligand::ImplicitH => Some(Ligand::ImplicitH),
            })
            .collect();
        new.atom_mut(new_idx).chirality = if translated.len() == before.len() {
            carry_chirality(tag, &translated, &ligands(new, new_idx))
        } else {
            Chirality::None
        };
    }
}

/// Bonds copied into `mol` still name reference atoms by their old index;
/// translate them, substituting the other neighbour on the same end (and
/// flipping cis/trans) where the reference did not survive.
pub(crate) fn remap_bond_stereo(mol: &mut Mol, map: &[Option<NodeIndex>]) {
    let edges: Vec<EdgeIndex> = mol.bonds().collect();
    for e in edges {
        let stereo = mol.bond(e).stereo;
        let (Some((ra, rb)), Some((a, b))) = (stereo.refs(), mol.bond_endpoints(e)) else {
            continue;
        };
        let moved = remap_ref(mol, map, ra, a, b).zip(remap_ref(mol, map, rb, b, a));
        mol.bond_mut(e).stereo = match moved {
            Some(((na, fa), (nb, fb))) => stereo.with_refs(na, nb, fa ^ fb),
            None => BondStereo::None,
        };
    }
}

fn remap_ref(
    mol: &Mol,
    map: &[Option<NodeIndex>],
    old_ref: NodeIndex,
    end: NodeIndex,
    partner: NodeIndex,
) -> Option<(NodeIndex, bool)> {
    if let Some(r) = map.get(old_ref.index()).copied().flatten() {
        if mol.bond_between(end, r).is_some() {
            return Some((r, false));
        }
    }
    mol.neighbors(end)
        .into_iter()
        .find(|&n| n != partner)
        .map(|n| (n, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    #[test]
    fn components() {
        let mol = from_smiles("CC.O.c1ccccc1").unwrap();
        let parts = connected_components(&mol);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], vec![NodeIndex::new(0), NodeIndex::new(1)]);
        assert_eq!(parts[1], vec![NodeIndex::new(2)]);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(num_components(&Mol::new()), 0);
    }

    #[test]
    fn skipping_a_bond() {
        let mol = from_smiles("CCO").unwrap();
        assert_eq!(components_without(&mol, Some(EdgeIndex::new(1))).len(), 2);
        let ring = from_smiles("C1CC1").unwrap();
        assert_eq!(components_without(&ring, Some(EdgeIndex::new(0))).len(), 1);
    }

    #[test]
    fn extract_keeps_inner_bonds() {
        let mol = from_smiles("CCOC").unwrap();
        let piece = extract(&mol, &[NodeIndex::new(2), NodeIndex::new(3)]);
        assert_eq!(piece.atom_count(), 2);
        assert_eq!(piece.bond_count(), 1);
        assert_eq!(piece.atom(NodeIndex::new(0)).atomic_num, 8);
    }

    #[test]
    fn extract_carries_chirality() {
        let mol = from_smiles("C[C@H](O)CC.O").unwrap();
        let chain: Vec<NodeIndex> = (0..5).map(NodeIndex::new).collect();
        let piece = extract(&mol, &chain);
        assert_eq!(piece.atom(NodeIndex::new(1)).chirality, mol.atom(NodeIndex::new(1)).chirality);

        let cut = extract(&mol, &[NodeIndex::new(1), NodeIndex::new(2), NodeIndex::new(3)]);
        assert_eq!(cut.atom(NodeIndex::new(0)).chirality, Chirality::None);
    }

    #[test]
    fn extract_moves_stereo_reference() {
        // F/C(Cl)=C/F: drop the first F, Cl takes over and the relation flips
        let mol = from_smiles("F/C(Cl)=C/F").unwrap();
        assert!(!mol.bond(EdgeIndex::new(2)).stereo.is_cis());
        let atoms: Vec<NodeIndex> = (1..5).map(NodeIndex::new).collect();
        let piece = extract(&mol, &atoms);
        let e = piece.bonds().find(|&e| piece.bond(e).stereo.is_set()).unwrap();
        assert!(piece.bond(e).stereo.is_cis());
    }
}
