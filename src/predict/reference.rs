//! Reference BDE/BDFE values keyed by (canonical molecule, bond index).

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Deserialize;

use crate::error::Result;
use crate::hydrogen::{add_hs, remove_hs};
use crate::mol::Mol;
use crate::molecule::Molecule;
use crate::smiles::{canonical_smiles_with_order, parse_smiles};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceValues {
    pub bde: Option<f64>,
    pub bdfe: Option<f64>,
    /// Dataset split the value came from (`train`, `valid`, `test`).
    pub set: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReferenceRecord {
    molecule: String,
    bond_index: usize,
    bde: Option<f64>,
    bdfe: Option<f64>,
    set: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: HashMap<(String, usize), ReferenceValues>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `molecule,bond_index,bde,bdfe,set` CSV, gzip-compressed when
    /// the path ends in `.gz`.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let gzipped = path.extension().is_some_and(|ext| ext == "gz");
        let table = if gzipped {
            Self::from_reader(GzDecoder::new(file))?
        } else {
            Self::from_reader(file)?
        };
        log::info!("loaded {} reference rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Molecule keys are canonicalized and their bond indices moved onto
    /// the canonical structure. Rows that cannot be placed are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let mut by_molecule: BTreeMap<String, Vec<ReferenceRecord>> = BTreeMap::new();
        for record in csv.deserialize::<ReferenceRecord>() {
            match record {
                Ok(record) => {
                    by_molecule.entry(record.molecule.clone()).or_default().push(record);
                }
                Err(err) => log::warn!("skipping malformed reference row: {err}"),
            }
        }

        let mut table = Self::new();
        for (raw, records) in by_molecule {
            let molecule = match Molecule::new(&raw) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!("skipping {} reference rows: {err}", records.len());
                    continue;
                }
            };
            let remap = if molecule.smiles() == raw {
                None
            } else {
                match bond_index_map(&raw, &molecule) {
                    Some(map) => Some(map),
                    None => {
                        log::warn!("cannot map bond indices of '{raw}' onto '{}'", molecule.smiles());
                        continue;
                    }
                }
            };
            for record in records {
                let index = match &remap {
                    None => Some(record.bond_index),
                    Some(map) => map.get(record.bond_index).copied().flatten(),
                };
                let Some(index) = index.filter(|&i| i < molecule.num_bonds_with_hs()) else {
                    log::warn!("reference bond {} of '{raw}' is out of range", record.bond_index);
                    continue;
                };
                table.insert(
                    molecule.smiles(),
                    index,
                    ReferenceValues {
                        bde: record.bde,
                        bdfe: record.bdfe,
                        set: record.set,
                    },
                );
            }
        }
        Ok(table)
    }

    /// `molecule` must already be canonical.
    pub fn insert(&mut self, molecule: &str, bond_index: usize, values: ReferenceValues) {
        self.rows.insert((molecule.to_string(), bond_index), values);
    }

    pub fn get(&self, molecule: &str, bond_index: usize) -> Option<&ReferenceValues> {
        self.rows.get(&(molecule.to_string(), bond_index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// For each explicit-hydrogen bond index of `raw`, the matching bond index
/// of `molecule`. Heavy atoms are matched through the canonical write order;
/// the k-th hydrogen of an atom maps to the k-th hydrogen of its image.
fn bond_index_map(raw: &str, molecule: &Molecule) -> Option<Vec<Option<usize>>> {
    let heavy = remove_hs(&parse_smiles(raw).ok()?);
    let (smiles, order) = canonical_smiles_with_order(&heavy);
    if smiles != molecule.smiles() || heavy.atom_count() != molecule.mol().atom_count() {
        return None;
    }
    let raw_h = add_hs(&heavy);
    let canon_h = molecule.mol_with_hs();
    let image = |idx: NodeIndex| NodeIndex::new(order[idx.index()]);

    let map = raw_h
        .bonds()
        .map(|e| {
            let (a, b) = raw_h.bond_endpoints(e)?;
            let heavy_count = heavy.atom_count();
            match (a.index() < heavy_count, b.index() < heavy_count) {
                (true, true) => canon_h.bond_between(image(a), image(b)).map(|f| f.index()),
                (true, false) => hydrogen_image(&raw_h, canon_h, a, e, image(a)),
                (false, true) => hydrogen_image(&raw_h, canon_h, b, e, image(b)),
                (false, false) => None,
            }
        })
        .collect();
    Some(map)
}

fn hydrogen_bonds(mol: &Mol, parent: NodeIndex) -> Vec<EdgeIndex> {
    mol.bonds_of(parent)
        .into_iter()
        .filter(|&e| mol.other_end(e, parent).is_some_and(|n| mol.atom(n).is_hydrogen()))
        .collect()
}

fn hydrogen_image(raw_h: &Mol, canon_h: &Mol, parent: NodeIndex, e: EdgeIndex, target: NodeIndex) -> Option<usize> {
    let k = hydrogen_bonds(raw_h, parent).iter().position(|&f| f == e)?;
    hydrogen_bonds(canon_h, target).get(k).map(|f| f.index())
}
