use std::collections::HashSet;

use proptest::prelude::*;

use bondcrab::{enumerate_fragments, FeaturizeOptions, Molecule, Preprocessor};

/// Acyclic, single-bonded chains with branches, e.g. `CC(O)NC`.
fn chain() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::sample::select(vec!["C", "N", "O"]), any::<bool>()), 1..9).prop_map(|atoms| {
        let mut out = String::new();
        for (i, (symbol, branch)) in atoms.iter().enumerate() {
            if *branch && i > 0 && i + 1 < atoms.len() && *symbol == "C" {
                out.push_str("C(C)");
            } else {
                out.push_str(symbol);
            }
        }
        out
    })
}

fn trained() -> Preprocessor {
    let mut p = Preprocessor::default();
    p.fit(["CCO", "CNC", "OCCN", "CC(C)C", "CC(C)(C)O"]).unwrap();
    p
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn deduplicated_pairs_are_unique(smiles in chain()) {
        let molecule = Molecule::new(&smiles).unwrap();
        let rows = enumerate_fragments(&molecule, true).unwrap();
        let pairs: HashSet<(&str, &str)> = rows.iter().map(|r| r.fragments()).collect();
        prop_assert_eq!(pairs.len(), rows.len());
        prop_assert!(rows.windows(2).all(|w| w[0].bond_index < w[1].bond_index));
    }

    #[test]
    fn one_row_per_bond_without_dedup(smiles in chain()) {
        let molecule = Molecule::new(&smiles).unwrap();
        let rows = enumerate_fragments(&molecule, false).unwrap();
        // every bond of an acyclic single-bonded chain is breakable
        prop_assert_eq!(rows.len(), molecule.num_bonds_with_hs());
        for (row, expected) in rows.iter().zip(0..) {
            prop_assert_eq!(row.bond_index, expected);
        }
    }

    #[test]
    fn connectivity_padding(smiles in chain(), extra in 0usize..6) {
        let mut p = trained();
        let molecule = Molecule::new(&smiles).unwrap();
        let bonds = molecule.num_bonds_with_hs();
        let opts = FeaturizeOptions {
            max_num_nodes: None,
            max_num_edges: Some(2 * bonds + extra),
            train: false,
        };
        let f = p.featurize(&molecule, &opts).unwrap();
        prop_assert_eq!(f.num_edges, 2 * bonds);
        prop_assert_eq!(f.connectivity.nrows(), 2 * bonds + extra);
        for (k, row) in f.connectivity.rows().into_iter().enumerate() {
            if k >= 2 * bonds {
                prop_assert!(row.iter().all(|&v| v == 0));
            } else {
                prop_assert_ne!(row[0], row[1]);
            }
        }
    }

    #[test]
    fn frozen_featurization_is_deterministic(smiles in chain()) {
        let mut p = trained();
        let atom_classes = p.atom_classes();
        let bond_classes = p.bond_classes();
        let molecule = Molecule::new(&smiles).unwrap();
        let opts = FeaturizeOptions::default();
        let a = p.featurize(&molecule, &opts).unwrap();
        let b = p.featurize(&molecule, &opts).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(p.atom_classes(), atom_classes);
        prop_assert_eq!(p.bond_classes(), bond_classes);
    }
}
