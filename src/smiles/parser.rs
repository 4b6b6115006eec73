use std::collections::BTreeMap;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::aromaticity;
use crate::atom::{Atom, Chirality};
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::chirality::{ligands, Ligand};
use crate::kekulize::kekulize;
use crate::mol::{permutation_parity, Mol};
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{AtomToken, BondToken, ChiralityToken, Token};
use crate::valence;

/// A neighbour position in SMILES order. Ring digits hold their slot until
/// the ring closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Atom(NodeIndex),
    ImplicitH,
    Ring(u16),
}

#[derive(Debug, Clone, Copy)]
struct RingOpen {
    atom: NodeIndex,
    bond: Option<BondToken>,
}

/// A directional bond symbol and the atom written to its left.
#[derive(Debug, Clone, Copy)]
struct Direction {
    up: bool,
    left: NodeIndex,
}

#[derive(Default)]
struct Parser {
    mol: Mol,
    order: Vec<Vec<Slot>>,
    chirality: Vec<ChiralityToken>,
    directions: Vec<Option<Direction>>,
    current: Option<NodeIndex>,
    pending: Option<(BondToken, usize)>,
    branches: Vec<(NodeIndex, usize)>,
    rings: BTreeMap<u16, RingOpen>,
}

/// Build a molecule from tokens. Bonds are numbered in the order they are
/// written; a ring bond is created at its closing digit.
pub fn build(tokens: &[Token]) -> Result<Mol, SmilesError> {
    let mut parser = Parser::default();
    for token in tokens {
        parser.feed(token)?;
    }
    parser.finish()
}

impl Parser {
    fn feed(&mut self, token: &Token) -> Result<(), SmilesError> {
        match token {
            Token::Atom(tok) => self.atom(tok),
            Token::Bond(bond, pos) => {
                if self.current.is_none() {
                    return Err(SmilesError::DanglingBond { pos: *pos });
                }
                self.pending = Some((*bond, *pos));
                Ok(())
            }
            Token::OpenParen(pos) => {
                let cur = self
                    .current
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                self.no_pending()?;
                self.branches.push((cur, *pos));
                Ok(())
            }
            Token::CloseParen(pos) => {
                self.no_pending()?;
                let (atom, _) = self
                    .branches
                    .pop()
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                self.current = Some(atom);
                Ok(())
            }
            Token::Dot(_) => {
                self.no_pending()?;
                self.current = None;
                Ok(())
            }
            Token::RingClosure { bond, digit, pos } => self.ring(*bond, *digit, *pos),
        }
    }

    fn no_pending(&mut self) -> Result<(), SmilesError> {
        match self.pending.take() {
            Some((_, pos)) => Err(SmilesError::DanglingBond { pos }),
            None => Ok(()),
        }
    }

    fn atom(&mut self, tok: &AtomToken) -> Result<(), SmilesError> {
        let idx = self.mol.add_atom(Atom {
            atomic_num: tok.atomic_num,
            formal_charge: tok.charge,
            isotope: tok.isotope,
            hydrogen_count: tok.hcount.unwrap_or(0),
            is_aromatic: tok.is_aromatic,
            no_implicit: tok.is_bracket(),
            ..Atom::default()
        });
        self.order.push(Vec::new());
        self.chirality.push(tok.chirality);

        if let Some(prev) = self.current {
            let bond = self.pending.take().map(|(b, _)| b);
            self.connect(prev, idx, bond, prev);
            self.order[prev.index()].push(Slot::Atom(idx));
            self.order[idx.index()].push(Slot::Atom(prev));
        } else {
            self.no_pending()?;
        }
        if tok.hcount.unwrap_or(0) > 0 {
            self.order[idx.index()].push(Slot::ImplicitH);
        }
        self.current = Some(idx);
        Ok(())
    }

    fn ring(&mut self, bond: Option<BondToken>, digit: u16, pos: usize) -> Result<(), SmilesError> {
        let cur = self
            .current
            .ok_or(SmilesError::InvalidRingBond { digit, pos })?;

        let Some(open) = self.rings.remove(&digit) else {
            self.rings.insert(digit, RingOpen { atom: cur, bond });
            self.order[cur.index()].push(Slot::Ring(digit));
            return Ok(());
        };

        if open.atom == cur || self.mol.bond_between(open.atom, cur).is_some() {
            return Err(SmilesError::InvalidRingBond { digit, pos });
        }
        let (token, left) = match (open.bond, bond) {
            (Some(a), Some(b)) if a != b && !(a.is_directional() && b.is_directional()) => {
                return Err(SmilesError::RingBondConflict { digit });
            }
            (Some(a), _) => (Some(a), open.atom),
            (None, Some(b)) => (Some(b), cur),
            (None, None) => (None, open.atom),
        };
        self.connect(open.atom, cur, token, left);

        let slots = &mut self.order[open.atom.index()];
        if let Some(slot) = slots.iter_mut().find(|s| **s == Slot::Ring(digit)) {
            *slot = Slot::Atom(cur);
        }
        self.order[cur.index()].push(Slot::Atom(open.atom));
        Ok(())
    }

    fn connect(&mut self, a: NodeIndex, b: NodeIndex, token: Option<BondToken>, left: NodeIndex) {
        let both_aromatic = self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic;
        let bond = match token {
            Some(BondToken::Double) => Bond::new(BondOrder::Double),
            Some(BondToken::Triple) => Bond::new(BondOrder::Triple),
            Some(BondToken::Aromatic) => Bond {
                is_aromatic: true,
                ..Bond::single()
            },
            None if both_aromatic => Bond {
                is_aromatic: true,
                ..Bond::single()
            },
            _ => Bond::single(),
        };
        let direction = match token {
            Some(BondToken::Up) => Some(Direction { up: true, left }),
            Some(BondToken::Down) => Some(Direction { up: false, left }),
            _ => None,
        };
        self.mol.add_bond(a, b, bond);
        self.directions.push(direction);
    }

    fn finish(mut self) -> Result<Mol, SmilesError> {
        self.no_pending()?;
        if let Some(&(_, pos)) = self.branches.first() {
            return Err(SmilesError::UnmatchedParen { pos });
        }
        if let Some(&digit) = self.rings.keys().next() {
            return Err(SmilesError::UnclosedRing { digit });
        }

        valence::assign_implicit_hydrogens(&mut self.mol);
        self.assign_double_bond_stereo();
        self.assign_chirality();

        let mut mol = self.mol;
        kekulize(&mut mol)?;
        valence::assign_radicals(&mut mol);
        aromaticity::perceive(&mut mol);
        Ok(mol)
    }

    /// Sign of the substituent `y` on double-bond atom `x`: the bond symbol
    /// read as if `y` were written before `x`.
    fn substituent_sign(&self, x: NodeIndex) -> Option<(NodeIndex, bool)> {
        self.mol.bonds_of(x).into_iter().find_map(|e| {
            let dir = self.directions[e.index()]?;
            let y = self.mol.other_end(e, x)?;
            Some((y, dir.up == (dir.left == y)))
        })
    }

    fn assign_double_bond_stereo(&mut self) {
        let doubles: Vec<EdgeIndex> = self
            .mol
            .bonds()
            .filter(|&e| {
                let bond = self.mol.bond(e);
                bond.order == BondOrder::Double && !bond.is_aromatic
            })
            .collect();

        for e in doubles {
            let Some((a, b)) = self.mol.bond_endpoints(e) else {
                continue;
            };
            let (Some((ya, sa)), Some((yb, sb))) = (self.substituent_sign(a), self.substituent_sign(b))
            else {
                continue;
            };
            self.mol.bond_mut(e).stereo = if sa == sb {
                BondStereo::Cis(ya, yb)
            } else {
                BondStereo::Trans(ya, yb)
            };
        }
    }

    fn assign_chirality(&mut self) {
        for idx in 0..self.chirality.len() {
            let tag = match self.chirality[idx] {
                ChiralityToken::None => continue,
                ChiralityToken::CounterClockwise => Chirality::Ccw,
                ChiralityToken::Clockwise => Chirality::Cw,
            };
            let node = NodeIndex::new(idx);
            if self.mol.atom(node).hydrogen_count > 1 {
                continue;
            }
            let written: Vec<Ligand> = self.order[idx]
                .iter()
                .filter_map(|slot| match *slot {
                    Slot::Atom(n) => Some(Ligand::Atom(n)),
                    Slot::ImplicitH => Some(Ligand::ImplicitH),
                    Slot::Ring(_) => None,
                })
                .collect();
            let stored = ligands(&self.mol, node);
            if written.len() < 3 || written.len() != stored.len() {
                continue;
            }
            self.mol.atom_mut(node).chirality =
                tag.permuted(permutation_parity(&written, &stored));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::tokenizer::tokenize;

    fn parse(s: &str) -> Result<Mol, SmilesError> {
        build(&tokenize(s)?)
    }

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn bonds_numbered_in_written_order() {
        // ring bond C0-C5 closes last
        let mol = parse("C1CCCCC1O").unwrap();
        assert_eq!(mol.bond_count(), 7);
        assert_eq!(mol.bond_endpoints(EdgeIndex::new(4)), Some((n(4), n(5))));
        assert_eq!(mol.bond_endpoints(EdgeIndex::new(5)), Some((n(0), n(5))));
        assert_eq!(mol.bond_endpoints(EdgeIndex::new(6)), Some((n(5), n(6))));
    }

    #[test]
    fn branches() {
        let mol = parse("CC(C)(O)N").unwrap();
        assert_eq!(mol.neighbors(n(1)), vec![n(0), n(2), n(3), n(4)]);
        assert_eq!(mol.atom(n(1)).hydrogen_count, 0);
        assert_eq!(mol.atom(n(3)).hydrogen_count, 1);
    }

    #[test]
    fn disconnected_components() {
        let mol = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 0);
    }

    #[test]
    fn trans_and_cis() {
        let trans = parse("F/C=C/F").unwrap();
        assert_eq!(trans.bond(EdgeIndex::new(1)).stereo, BondStereo::Trans(n(0), n(3)));
        let cis = parse("F/C=C\\F").unwrap();
        assert_eq!(cis.bond(EdgeIndex::new(1)).stereo, BondStereo::Cis(n(0), n(3)));
        let branched = parse("C(/F)=C/F").unwrap();
        assert!(branched.bond(EdgeIndex::new(1)).stereo.is_cis());
    }

    #[test]
    fn chirality_relative_to_ligand_order() {
        let a = parse("[C@H](F)(Cl)Br").unwrap();
        assert_eq!(a.atom(n(0)).chirality, Chirality::Ccw);
        let b = parse("F[C@H](Cl)Br").unwrap();
        assert_eq!(b.atom(n(1)).chirality, Chirality::Cw);
        let c = parse("F[C@@H](Cl)Br").unwrap();
        assert_eq!(c.atom(n(1)).chirality, Chirality::Ccw);
    }

    #[test]
    fn chirality_at_ring_opening() {
        let mol = parse("[C@@]1(F)(Cl)CO1").unwrap();
        // written order: O4 (ring), F1, Cl2, C3; stored order: F1, Cl2, C3, O4
        assert_eq!(mol.atom(n(0)).chirality, Chirality::Ccw);
    }

    #[test]
    fn errors() {
        assert!(matches!(parse("C1CC"), Err(SmilesError::UnclosedRing { digit: 1 })));
        assert!(matches!(parse("C(C"), Err(SmilesError::UnmatchedParen { pos: 1 })));
        assert!(matches!(parse("CC)"), Err(SmilesError::UnmatchedParen { pos: 2 })));
        assert!(matches!(parse("C="), Err(SmilesError::DanglingBond { pos: 1 })));
        assert!(matches!(parse("=C"), Err(SmilesError::DanglingBond { pos: 0 })));
        assert!(matches!(parse("C11"), Err(SmilesError::InvalidRingBond { .. })));
        assert!(matches!(parse("C=1CC-1"), Err(SmilesError::RingBondConflict { digit: 1 })));
    }
}
