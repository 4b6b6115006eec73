//! Ring perception.
//!
//! Every bond that is not a bridge lies on a cycle; the smallest such cycle
//! is found with a breadth-first search that ignores the bond itself. The
//! distinct smallest cycles form the ring list used for aromaticity, and
//! their sizes give per-atom and per-bond ring sizes for featurization.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Vec<NodeIndex>>,
    bond_ring_size: Vec<Option<usize>>,
    atom_ring_size: Vec<Option<usize>>,
}

impl RingInfo {
    pub fn new(mol: &Mol) -> Self {
        let mut bond_ring_size = vec![None; mol.bond_count()];
        let mut atom_ring_size: Vec<Option<usize>> = vec![None; mol.atom_count()];
        let mut rings = Vec::new();
        let mut seen = HashSet::new();

        for e in mol.bonds() {
            let Some(ring) = smallest_cycle_through(mol, e) else {
                continue;
            };
            let size = ring.len();
            bond_ring_size[e.index()] = Some(size);
            for &a in &ring {
                let slot = &mut atom_ring_size[a.index()];
                *slot = Some(slot.map_or(size, |s| s.min(size)));
            }
            if seen.insert(normalize(&ring)) {
                rings.push(ring);
            }
        }

        rings.sort_by_key(|r| r.len());
        Self {
            rings,
            bond_ring_size,
            atom_ring_size,
        }
    }

    /// Distinct smallest rings, each in cyclic order, smallest first.
    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn is_ring_bond(&self, e: EdgeIndex) -> bool {
        self.bond_ring_size(e).is_some()
    }

    pub fn is_ring_atom(&self, a: NodeIndex) -> bool {
        self.atom_ring_size(a).is_some()
    }

    pub fn bond_ring_size(&self, e: EdgeIndex) -> Option<usize> {
        self.bond_ring_size.get(e.index()).copied().flatten()
    }

    pub fn atom_ring_size(&self, a: NodeIndex) -> Option<usize> {
        self.atom_ring_size.get(a.index()).copied().flatten()
    }
}

/// Shortest path from one end of `bond` to the other that avoids `bond`.
fn smallest_cycle_through(mol: &Mol, bond: EdgeIndex) -> Option<Vec<NodeIndex>> {
    let (start, goal) = mol.bond_endpoints(bond)?;
    let mut prev: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    let mut queue = VecDeque::new();
    visited[start.index()] = true;
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        for e in mol.bonds_of(u) {
            if e == bond {
                continue;
            }
            let Some(v) = mol.other_end(e, u) else {
                continue;
            };
            if visited[v.index()] {
                continue;
            }
            visited[v.index()] = true;
            prev[v.index()] = Some(u);
            if v == goal {
                let mut path = vec![goal];
                let mut cur = goal;
                while let Some(p) = prev[cur.index()] {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(v);
        }
    }
    None
}

/// Rotation- and direction-independent key for a cycle.
fn normalize(ring: &[NodeIndex]) -> Vec<NodeIndex> {
    let n = ring.len();
    let Some(start) = (0..n).min_by_key(|&i| ring[i]) else {
        return Vec::new();
    };
    let forward: Vec<NodeIndex> = (0..n).map(|k| ring[(start + k) % n]).collect();
    let backward: Vec<NodeIndex> = (0..n).map(|k| ring[(start + n - k) % n]).collect();
    forward.min(backward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    #[test]
    fn acyclic() {
        let mol = from_smiles("CCCC(C)O").unwrap();
        let info = RingInfo::new(&mol);
        assert_eq!(info.num_rings(), 0);
        assert!(mol.bonds().all(|e| !info.is_ring_bond(e)));
    }

    #[test]
    fn cyclohexanol() {
        let mol = from_smiles("OC1CCCCC1").unwrap();
        let info = RingInfo::new(&mol);
        assert_eq!(info.num_rings(), 1);
        assert_eq!(info.rings()[0].len(), 6);
        assert!(!info.is_ring_bond(EdgeIndex::new(0)));
        assert!(!info.is_ring_atom(NodeIndex::new(0)));
        assert_eq!(info.atom_ring_size(NodeIndex::new(1)), Some(6));
    }

    #[test]
    fn fused_rings() {
        let mol = from_smiles("C1CCC2CCCC2C1").unwrap();
        let info = RingInfo::new(&mol);
        assert_eq!(info.num_rings(), 2);
        assert_eq!(info.rings()[0].len(), 5);
        assert_eq!(info.rings()[1].len(), 6);
        // fusion atoms report the smaller ring
        assert_eq!(info.atom_ring_size(NodeIndex::new(3)), Some(5));
        assert_eq!(info.atom_ring_size(NodeIndex::new(0)), Some(6));
    }

    #[test]
    fn spiro_and_bridge() {
        let mol = from_smiles("C1CC12CC2").unwrap();
        let info = RingInfo::new(&mol);
        assert_eq!(info.num_rings(), 2);
        let mol = from_smiles("C1CC1CC1CC1").unwrap();
        let info = RingInfo::new(&mol);
        assert_eq!(info.num_rings(), 2);
        assert!(!info.is_ring_bond(EdgeIndex::new(3)));
    }
}
