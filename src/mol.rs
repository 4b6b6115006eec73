use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::atom::Atom;
use crate::bond::Bond;

/// A molecular graph.
///
/// Atoms and bonds are never removed in place: derived structures (explicit
/// hydrogens, fragments) are rebuilt, so indices stay stable for the life of
/// a `Mol`. Bond begin/end follow the order the bond was added in.
#[derive(Clone, Default)]
pub struct Mol {
    graph: UnGraph<Atom, Bond>,
}

impl Mol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &UnGraph<Atom, Bond> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut Atom {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &Bond {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut Bond {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// Bonds incident to `idx`, ascending by bond index.
    pub fn bonds_of(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        let mut bonds: Vec<EdgeIndex> = self.graph.edges(idx).map(|e| e.id()).collect();
        bonds.sort_unstable();
        bonds
    }

    /// Neighbours of `idx`, ascending by atom index.
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut nbrs: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        nbrs.sort_unstable();
        nbrs
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// The atom across `bond` from `atom`.
    pub fn other_end(&self, bond: EdgeIndex, atom: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.bond_endpoints(bond)?;
        if a == atom {
            Some(b)
        } else if b == atom {
            Some(a)
        } else {
            None
        }
    }

    /// Suppressed plus explicit hydrogen neighbours.
    pub fn total_hs(&self, idx: NodeIndex) -> u8 {
        let explicit = self
            .graph
            .neighbors(idx)
            .filter(|&n| self.graph[n].is_hydrogen())
            .count() as u8;
        self.graph[idx].hydrogen_count + explicit
    }

    /// Neighbours that are not hydrogen.
    pub fn heavy_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors(idx)
            .filter(|&n| !self.graph[n].is_hydrogen())
            .count()
    }

    /// Sum of Kekulé bond orders around `idx`.
    pub fn bond_order_sum(&self, idx: NodeIndex) -> u8 {
        self.graph.edges(idx).map(|e| e.weight().order.valence()).sum()
    }
}

impl std::fmt::Debug for Mol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}

/// True when `to` is an even permutation of `from`. Both slices must hold
/// the same distinct elements; a mismatch counts as odd.
pub(crate) fn permutation_parity<T: PartialEq>(from: &[T], to: &[T]) -> bool {
    let n = from.len();
    if n != to.len() {
        return false;
    }
    let mut perm = Vec::with_capacity(n);
    for f in from {
        match to.iter().position(|t| t == f) {
            Some(p) => perm.push(p),
            None => return false,
        }
    }
    let mut visited = vec![false; n];
    let mut swaps = 0usize;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut j = i;
        let mut cycle_len = 0;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    swaps % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::BondOrder;

    fn ethanol() -> Mol {
        let mut mol = Mol::new();
        let c0 = mol.add_atom(Atom::new(6));
        let c1 = mol.add_atom(Atom::new(6));
        let o = mol.add_atom(Atom::new(8));
        let h = mol.add_atom(Atom::new(1));
        mol.add_bond(c0, c1, Bond::single());
        mol.add_bond(c1, o, Bond::single());
        mol.add_bond(o, h, Bond::single());
        mol.atom_mut(c0).hydrogen_count = 3;
        mol.atom_mut(c1).hydrogen_count = 2;
        mol
    }

    #[test]
    fn neighbors_sorted() {
        let mol = ethanol();
        let c1 = NodeIndex::new(1);
        assert_eq!(mol.neighbors(c1), vec![NodeIndex::new(0), NodeIndex::new(2)]);
        assert_eq!(mol.bonds_of(c1), vec![EdgeIndex::new(0), EdgeIndex::new(1)]);
    }

    #[test]
    fn hydrogen_counts() {
        let mol = ethanol();
        assert_eq!(mol.total_hs(NodeIndex::new(2)), 1);
        assert_eq!(mol.heavy_degree(NodeIndex::new(2)), 1);
        assert_eq!(mol.total_hs(NodeIndex::new(0)), 3);
    }

    #[test]
    fn other_end_and_order_sum() {
        let mut mol = ethanol();
        mol.bond_mut(EdgeIndex::new(0)).order = BondOrder::Double;
        assert_eq!(
            mol.other_end(EdgeIndex::new(0), NodeIndex::new(1)),
            Some(NodeIndex::new(0))
        );
        assert_eq!(mol.other_end(EdgeIndex::new(0), NodeIndex::new(3)), None);
        assert_eq!(mol.bond_order_sum(NodeIndex::new(1)), 3);
    }

    #[test]
    fn parity() {
        assert!(permutation_parity(&[1, 2, 3, 4], &[1, 2, 3, 4]));
        assert!(!permutation_parity(&[1, 2, 3, 4], &[2, 1, 3, 4]));
        assert!(permutation_parity(&[1, 2, 3, 4], &[2, 3, 1, 4]));
        assert!(!permutation_parity(&[1, 2, 3], &[1, 2, 5]));
    }
}
