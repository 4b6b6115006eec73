use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Chirality;
use crate::bond::BondOrder;
use crate::canonical::canonicalize;
use crate::chirality::{ligands, Ligand};
use crate::element;
use crate::mol::{permutation_parity, Mol};
use crate::valence;

/// Write `mol` in atom-index order. Suitable for display; use
/// [`to_canonical_smiles`] for anything that is compared or stored.
pub fn to_smiles(mol: &Mol) -> String {
    let ranks: Vec<usize> = (0..mol.atom_count()).collect();
    write_ranked(mol, &ranks)
}

/// A SMILES string that is identical for every input spelling of the same
/// structure, stereo tags included.
pub fn to_canonical_smiles(mol: &Mol) -> String {
    canonicalize(mol).0
}

/// Canonical SMILES plus, for each atom of `mol`, the index it gets when
/// the string is read back.
pub fn canonical_smiles_with_order(mol: &Mol) -> (String, Vec<usize>) {
    let (smiles, ranks) = canonicalize(mol);
    let order = Layout::new(mol, &ranks).visit;
    (smiles, order)
}

/// Spanning forest of the depth-first walk: tree bonds become chains and
/// branches, the rest become ring closures.
struct Layout {
    roots: Vec<NodeIndex>,
    parent: Vec<Option<NodeIndex>>,
    children: Vec<Vec<NodeIndex>>,
    /// Ring bonds opened at an atom (written before the partner).
    opens: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    /// Position of each atom in the written string.
    visit: Vec<usize>,
}

impl Layout {
    /// Walk each component from its lowest-ranked atom, visiting neighbours
    /// in rank order.
    fn new(mol: &Mol, ranks: &[usize]) -> Self {
        let n = mol.atom_count();
        let adjacency: Vec<Vec<(NodeIndex, EdgeIndex)>> = mol
            .atoms()
            .map(|a| {
                let mut nbrs: Vec<(NodeIndex, EdgeIndex)> = mol
                    .bonds_of(a)
                    .into_iter()
                    .filter_map(|e| Some((mol.other_end(e, a)?, e)))
                    .collect();
                nbrs.sort_by_key(|(b, _)| ranks[b.index()]);
                nbrs
            })
            .collect();

        let mut starts: Vec<NodeIndex> = mol.atoms().collect();
        starts.sort_by_key(|a| ranks[a.index()]);

        let mut layout = Self {
            roots: Vec::new(),
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            opens: vec![Vec::new(); n],
            visit: vec![0; n],
        };
        let mut visited = vec![false; n];
        let mut used = vec![false; mol.bond_count()];
        let mut counter = 0;

        for root in starts {
            if visited[root.index()] {
                continue;
            }
            layout.roots.push(root);
            visited[root.index()] = true;
            layout.visit[root.index()] = counter;
            counter += 1;

            let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];
            while let Some(&(u, next)) = stack.last() {
                let Some(&(v, e)) = adjacency[u.index()].get(next) else {
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if used[e.index()] {
                    continue;
                }
                used[e.index()] = true;
                if visited[v.index()] {
                    layout.opens[v.index()].push((u, e));
                } else {
                    visited[v.index()] = true;
                    layout.visit[v.index()] = counter;
                    counter += 1;
                    layout.parent[v.index()] = Some(u);
                    layout.children[u.index()].push(v);
                    stack.push((v, 0));
                }
            }
        }

        for opens in &mut layout.opens {
            opens.sort_by_key(|(b, _)| ranks[b.index()]);
        }
        layout
    }

    fn is_tree_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.parent[a.index()] == Some(b) || self.parent[b.index()] == Some(a)
    }

    /// The atom written to the left of a tree bond.
    fn left_of(&self, a: NodeIndex, b: NodeIndex) -> NodeIndex {
        if self.parent[b.index()] == Some(a) {
            a
        } else {
            b
        }
    }
}

/// `/` (true) or `\` (false) for tree bonds next to stereo double bonds.
///
/// A substituent `y` of double-bond atom `x` has sign `up == (left == y)`;
/// two substituents on opposite ends are cis exactly when their signs match.
fn bond_directions(mol: &Mol, layout: &Layout) -> Vec<Option<bool>> {
    let mut dirs: Vec<Option<bool>> = vec![None; mol.bond_count()];

    let mut stereo_bonds: Vec<EdgeIndex> = mol
        .bonds()
        .filter(|&e| {
            let bond = mol.bond(e);
            bond.order == BondOrder::Double && bond.stereo.is_set()
        })
        .collect();
    stereo_bonds.sort_by_key(|&e| {
        mol.bond_endpoints(e)
            .map_or(usize::MAX, |(a, b)| layout.visit[a.index()].min(layout.visit[b.index()]))
    });

    for e in stereo_bonds {
        let stereo = mol.bond(e).stereo;
        let (Some((ra, rb)), Some((a, b))) = (stereo.refs(), mol.bond_endpoints(e)) else {
            continue;
        };
        let (ra, rb) = if mol.bond_between(a, ra).is_some() { (ra, rb) } else { (rb, ra) };
        // start from the end written first
        let (a, b, ra, rb) = if layout.visit[a.index()] <= layout.visit[b.index()] {
            (a, b, ra, rb)
        } else {
            (b, a, rb, ra)
        };
        let side_a = substituent_bonds(mol, layout, a, b);
        let side_b = substituent_bonds(mol, layout, b, a);
        if side_a.is_empty() || side_b.is_empty() {
            continue;
        }
        // the first substituent bond written on this side is always `/`,
        // whichever neighbour the stereo tag references
        let sign_a = match existing_sign(layout, &dirs, a, ra, &side_a) {
            Some(s) => s,
            None => {
                let (y, first) = side_a[0];
                dirs[first.index()] = Some(true);
                let s = sign(layout, true, a, y);
                if y == ra {
                    s
                } else {
                    !s
                }
            }
        };
        let want_b = if stereo.is_cis() { sign_a } else { !sign_a };
        if existing_sign(layout, &dirs, b, rb, &side_b).is_none() {
            set_sign(layout, &mut dirs, b, rb, &side_b, want_b);
        }
    }
    dirs
}

/// Tree bonds from `x` to its substituents (everything but `partner`), in
/// the order they are written.
fn substituent_bonds(mol: &Mol, layout: &Layout, x: NodeIndex, partner: NodeIndex) -> Vec<(NodeIndex, EdgeIndex)> {
    let mut side: Vec<(NodeIndex, EdgeIndex)> = mol
        .bonds_of(x)
        .into_iter()
        .filter_map(|e| Some((mol.other_end(e, x)?, e)))
        .filter(|&(y, _)| y != partner && layout.is_tree_bond(x, y))
        .collect();
    side.sort_by_key(|&(y, _)| layout.visit[y.index()]);
    side
}

fn sign(layout: &Layout, up: bool, x: NodeIndex, y: NodeIndex) -> bool {
    up == (layout.left_of(x, y) == y)
}

/// Sign of the reference substituent implied by a direction already placed
/// on one of `x`'s substituent bonds.
fn existing_sign(
    layout: &Layout,
    dirs: &[Option<bool>],
    x: NodeIndex,
    reference: NodeIndex,
    side: &[(NodeIndex, EdgeIndex)],
) -> Option<bool> {
    side.iter().find_map(|&(y, e)| {
        let up = dirs[e.index()]?;
        let s = sign(layout, up, x, y);
        Some(if y == reference { s } else { !s })
    })
}

fn set_sign(
    layout: &Layout,
    dirs: &mut [Option<bool>],
    x: NodeIndex,
    reference: NodeIndex,
    side: &[(NodeIndex, EdgeIndex)],
    reference_sign: bool,
) {
    let Some(&(y, e)) = side.first() else {
        return;
    };
    let s = if y == reference {
        reference_sign
    } else {
        !reference_sign
    };
    let up = if layout.left_of(x, y) == y { s } else { !s };
    dirs[e.index()] = Some(up);
}

struct Writer<'a> {
    mol: &'a Mol,
    layout: Layout,
    dirs: Vec<Option<bool>>,
    digits: HashMap<EdgeIndex, u16>,
    in_use: Vec<bool>,
    out: String,
}

/// Write `mol` with `ranks` choosing the start atom of each component and
/// the order neighbours are visited in.
pub(crate) fn write_ranked(mol: &Mol, ranks: &[usize]) -> String {
    let layout = Layout::new(mol, ranks);
    let dirs = bond_directions(mol, &layout);
    let mut writer = Writer {
        mol,
        layout,
        dirs,
        digits: HashMap::new(),
        in_use: vec![false; 100],
        out: String::new(),
    };
    let roots = writer.layout.roots.clone();
    for (i, root) in roots.into_iter().enumerate() {
        if i > 0 {
            writer.out.push('.');
        }
        writer.write_atom(root);
    }
    writer.out
}

impl Writer<'_> {
    fn write_atom(&mut self, u: NodeIndex) {
        let mol = self.mol;

        // closings first, by digit; then openings, by partner rank
        let mut closes: Vec<(NodeIndex, EdgeIndex, u16)> = mol
            .bonds_of(u)
            .into_iter()
            .filter_map(|e| Some((mol.other_end(e, u)?, e, *self.digits.get(&e)?)))
            .collect();
        closes.sort_by_key(|&(_, _, d)| d);
        let opens = self.layout.opens[u.index()].clone();

        let mut ring_partners: Vec<NodeIndex> = closes.iter().map(|&(p, _, _)| p).collect();
        ring_partners.extend(opens.iter().map(|&(p, _)| p));
        let chirality = self.written_chirality(u, &ring_partners);
        write_atom_symbol(mol, u, chirality, &mut self.out);

        for &(_, e, digit) in &closes {
            self.digits.remove(&e);
            push_digit(digit, &mut self.out);
        }
        for &(partner, e) in &opens {
            let digit = self.next_digit();
            self.in_use[digit as usize] = true;
            self.digits.insert(e, digit);
            self.out.push_str(bond_symbol(mol, e, u, partner));
            push_digit(digit, &mut self.out);
        }
        for &(_, _, digit) in &closes {
            self.in_use[digit as usize] = false;
        }

        let children = self.layout.children[u.index()].clone();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let branch = i < last;
            if branch {
                self.out.push('(');
            }
            if let Some(e) = mol.bond_between(u, child) {
                match self.dirs[e.index()] {
                    Some(true) => self.out.push('/'),
                    Some(false) => self.out.push('\\'),
                    None => self.out.push_str(bond_symbol(mol, e, u, child)),
                }
            }
            self.write_atom(child);
            if branch {
                self.out.push(')');
            }
        }
    }

    /// Lowest ring digit not currently open. Digits run 1..=99; past that
    /// the count of simultaneously open rings is beyond any real molecule.
    fn next_digit(&self) -> u16 {
        (1..100u16)
            .find(|&d| !self.in_use[d as usize])
            .unwrap_or(99)
    }

    /// The stored tag re-expressed for the order neighbours appear in the
    /// output: the atom before, the bracket hydrogen, ring digits, branches.
    fn written_chirality(&self, u: NodeIndex, ring_partners: &[NodeIndex]) -> Chirality {
        let tag = self.mol.atom(u).chirality;
        if !tag.is_set() {
            return Chirality::None;
        }
        let mut written: Vec<Ligand> = Vec::with_capacity(4);
        if let Some(p) = self.layout.parent[u.index()] {
            written.push(Ligand::Atom(p));
        }
        if self.mol.atom(u).hydrogen_count > 0 {
            written.push(Ligand::ImplicitH);
        }
        written.extend(ring_partners.iter().map(|&p| Ligand::Atom(p)));
        written.extend(self.layout.children[u.index()].iter().map(|&c| Ligand::Atom(c)));

        let stored = ligands(self.mol, u);
        if written.len() != stored.len() {
            return Chirality::None;
        }
        tag.permuted(permutation_parity(&written, &stored))
    }
}

fn bond_symbol(mol: &Mol, e: EdgeIndex, a: NodeIndex, b: NodeIndex) -> &'static str {
    let bond = mol.bond(e);
    if bond.is_aromatic {
        return "";
    }
    match bond.order {
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Single if mol.atom(a).is_aromatic && mol.atom(b).is_aromatic => "-",
        BondOrder::Single => "",
    }
}

fn push_digit(digit: u16, out: &mut String) {
    if digit < 10 {
        out.push_str(&digit.to_string());
    } else {
        out.push('%');
        out.push_str(&format!("{digit:02}"));
    }
}

/// Bare when a reader would rebuild the atom exactly from the symbol alone.
fn can_write_bare(mol: &Mol, idx: NodeIndex) -> bool {
    let atom = mol.atom(idx);
    element::is_organic_subset(atom.atomic_num)
        && atom.isotope == 0
        && atom.formal_charge == 0
        && atom.radical_electrons == 0
        && !atom.chirality.is_set()
        && valence::implicit_hydrogens(mol, idx) == Some(atom.hydrogen_count)
}

fn write_atom_symbol(mol: &Mol, idx: NodeIndex, chirality: Chirality, out: &mut String) {
    let atom = mol.atom(idx);
    let symbol = element::symbol(atom.atomic_num);
    let symbol = if atom.is_aromatic {
        symbol.to_ascii_lowercase()
    } else {
        symbol.to_string()
    };

    if can_write_bare(mol, idx) && !chirality.is_set() {
        out.push_str(&symbol);
        return;
    }

    out.push('[');
    if atom.isotope != 0 {
        out.push_str(&atom.isotope.to_string());
    }
    out.push_str(&symbol);
    match chirality {
        Chirality::Ccw => out.push('@'),
        Chirality::Cw => out.push_str("@@"),
        Chirality::None => {}
    }
    match atom.hydrogen_count {
        0 => {}
        1 => out.push('H'),
        n => {
            out.push('H');
            out.push_str(&n.to_string());
        }
    }
    match atom.formal_charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => {
            out.push('+');
            out.push_str(&c.to_string());
        }
        c => {
            out.push('-');
            out.push_str(&c.unsigned_abs().to_string());
        }
    }
    out.push(']');
}
