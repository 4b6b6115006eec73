//! Hückel aromaticity on a Kekulé structure.
//!
//! Each ring atom contributes pi electrons by element, charge and bonding.
//! A ring whose atoms all contribute and whose total is 4n+2 is aromatic;
//! pairs of fused rings that fail individually are tried as one envelope
//! (azulene). Aromatic rings get their atoms and ring bonds flagged.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::Mol;
use crate::rings::RingInfo;

pub fn perceive(mol: &mut Mol) {
    let ring_info = RingInfo::new(mol);
    let rings = ring_info.rings();

    let electrons: Vec<Option<u32>> = rings
        .iter()
        .map(|ring| ring_electrons(mol, &ring_info, ring))
        .collect();

    let mut aromatic_rings: Vec<bool> = electrons
        .iter()
        .map(|e| e.is_some_and(is_huckel))
        .collect();

    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            if aromatic_rings[i] && aromatic_rings[j] {
                continue;
            }
            if electrons[i].is_none() || electrons[j].is_none() {
                continue;
            }
            let shared: HashSet<NodeIndex> = rings[i]
                .iter()
                .filter(|a| rings[j].contains(*a))
                .copied()
                .collect();
            if shared.len() != 2 {
                continue;
            }
            let envelope: u32 = rings[i]
                .iter()
                .chain(rings[j].iter().filter(|a| !shared.contains(*a)))
                .filter_map(|&a| pi_electrons(mol, &ring_info, a))
                .sum();
            if is_huckel(envelope) {
                aromatic_rings[i] = true;
                aromatic_rings[j] = true;
            }
        }
    }

    for (ring, &aromatic) in rings.iter().zip(&aromatic_rings) {
        if !aromatic {
            continue;
        }
        for k in 0..ring.len() {
            let a = ring[k];
            let b = ring[(k + 1) % ring.len()];
            mol.atom_mut(a).is_aromatic = true;
            if let Some(e) = mol.bond_between(a, b) {
                mol.bond_mut(e).is_aromatic = true;
            }
        }
    }
}

fn ring_electrons(mol: &Mol, ring_info: &RingInfo, ring: &[NodeIndex]) -> Option<u32> {
    ring.iter()
        .map(|&a| pi_electrons(mol, ring_info, a))
        .sum::<Option<u32>>()
}

fn is_huckel(electrons: u32) -> bool {
    electrons >= 2 && (electrons - 2) % 4 == 0
}

/// Pi electrons an atom donates to a ring it belongs to, `None` when it
/// cannot take part in an aromatic system.
fn pi_electrons(mol: &Mol, ring_info: &RingInfo, idx: NodeIndex) -> Option<u32> {
    let atom = mol.atom(idx);
    let mut ring_double = false;
    let mut exo_double_to_heteroatom = false;
    for e in mol.bonds_of(idx) {
        match mol.bond(e).order {
            BondOrder::Single => {}
            BondOrder::Triple => return None,
            BondOrder::Double => {
                if ring_info.is_ring_bond(e) {
                    ring_double = true;
                } else {
                    let other = mol.other_end(e, idx)?;
                    if matches!(mol.atom(other).atomic_num, 7 | 8 | 16) {
                        exo_double_to_heteroatom = true;
                    } else {
                        return None;
                    }
                }
            }
        }
    }
    let connections = mol.degree(idx) + atom.hydrogen_count as usize;

    match (atom.atomic_num, atom.formal_charge) {
        (6, 0) | (14, 0) => match (ring_double, exo_double_to_heteroatom) {
            (true, _) => Some(1),
            (false, true) => Some(0),
            (false, false) => None,
        },
        (6, -1) => Some(if ring_double { 1 } else { 2 }),
        (6, 1) => Some(if ring_double { 1 } else { 0 }),
        (7, 0) | (15, 0) | (33, 0) => {
            if ring_double {
                Some(1)
            } else if connections == 3 && !exo_double_to_heteroatom {
                Some(2)
            } else {
                None
            }
        }
        (7, 1) | (15, 1) => ring_double.then_some(1),
        (7, -1) => (!ring_double && connections == 2).then_some(2),
        (8, 0) | (16, 0) | (34, 0) | (52, 0) => {
            (!ring_double && !exo_double_to_heteroatom && connections == 2).then_some(2)
        }
        (8, 1) | (16, 1) | (34, 1) => ring_double.then_some(1),
        (5, 0) => {
            if ring_double {
                Some(1)
            } else if connections == 3 {
                Some(0)
            } else {
                None
            }
        }
        _ => None,
    }
}
