//! Molecule to model-input tensors.
//!
//! A molecule becomes a directed graph (two edges per bond), each node and
//! edge gets a descriptor, and two tokenizers turn descriptors into integer
//! classes. The resulting [`FeatureMap`] is what the batching stage pads and
//! stacks for the model.

pub mod features;
pub mod tokenizer;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::hydrogen::add_hs;
use crate::mol::Mol;
use crate::molecule::Molecule;
use crate::smiles::parse_smiles;

pub use features::{atom_descriptor, bond_descriptor, FeatureContext, FeatureSet};
pub use tokenizer::{Tokenizer, UNKNOWN_CLASS};

/// Version written to and required from persisted preprocessor files.
pub const FILE_VERSION: u32 = 1;

/// Value of every padding entry in every tensor.
pub const PADDING_VALUE: i32 = 0;

/// Problems with a persisted preprocessor.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("malformed preprocessor JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported preprocessor file version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("unknown feature set '{0}'")]
    UnknownFeatures(String),

    #[error("duplicate descriptor {0} in vocabulary")]
    Duplicate(String),
}

/// What a preprocessor reads a molecule from.
#[derive(Debug, Clone, Copy)]
pub enum Structure<'a> {
    Smiles(&'a str),
    Mol(&'a Mol),
}

impl<'a> From<&'a str> for Structure<'a> {
    fn from(smiles: &'a str) -> Self {
        Structure::Smiles(smiles)
    }
}

impl<'a> From<&'a Mol> for Structure<'a> {
    fn from(mol: &'a Mol) -> Self {
        Structure::Mol(mol)
    }
}

impl<'a> From<&'a Molecule> for Structure<'a> {
    fn from(molecule: &'a Molecule) -> Self {
        Structure::Smiles(molecule.smiles())
    }
}

/// One direction of a chemical bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectedEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub bond: EdgeIndex,
    /// The edge runs from the bond's end atom to its begin atom.
    pub flipped: bool,
}

/// A structure with its bonds expanded into directed edges: for each atom in
/// index order, one outgoing edge per incident bond in bond-index order.
#[derive(Debug, Clone)]
pub struct MolGraph {
    mol: Mol,
    edges: Vec<DirectedEdge>,
}

impl MolGraph {
    pub fn new(mol: Mol) -> Self {
        let mut edges = Vec::with_capacity(2 * mol.bond_count());
        for source in mol.atoms() {
            for bond in mol.bonds_of(source) {
                let Some((begin, _)) = mol.bond_endpoints(bond) else {
                    continue;
                };
                let Some(target) = mol.other_end(bond, source) else {
                    continue;
                };
                edges.push(DirectedEdge {
                    source,
                    target,
                    bond,
                    flipped: source != begin,
                });
            }
        }
        Self { mol, edges }
    }

    pub fn mol(&self) -> &Mol {
        &self.mol
    }

    pub fn edges(&self) -> &[DirectedEdge] {
        &self.edges
    }

    pub fn num_nodes(&self) -> usize {
        self.mol.atom_count()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

/// Per-molecule tensors. Real entries come first; everything past
/// `num_atoms`/`num_edges` is padding.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    pub atom: Array1<i32>,
    pub bond: Array1<i32>,
    /// `(source, target)` per directed edge.
    pub connectivity: Array2<i32>,
    /// Bond index per directed edge, with index tracking on.
    pub bond_indices: Option<Array1<i32>>,
    pub graph_features: BTreeMap<&'static str, Array1<i32>>,
    pub num_atoms: usize,
    pub num_edges: usize,
}

impl FeatureMap {
    /// Positions of real atoms whose class is unknown.
    pub fn unknown_atoms(&self) -> Vec<usize> {
        (0..self.num_atoms)
            .filter(|&i| self.atom[i] == UNKNOWN_CLASS)
            .collect()
    }

    /// Bonds (by bond index when tracked, else by edge position) carried by
    /// a real edge of unknown class; ascending, without repeats.
    pub fn unknown_bonds(&self) -> Vec<usize> {
        let mut out: Vec<usize> = (0..self.num_edges)
            .filter(|&k| self.bond[k] == UNKNOWN_CLASS)
            .map(|k| match &self.bond_indices {
                Some(indices) => indices[k] as usize,
                None => k,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Largest tracked bond index, if any edge carries one.
    pub fn max_bond_index(&self) -> Option<usize> {
        let indices = self.bond_indices.as_ref()?;
        (0..self.num_edges).map(|k| indices[k] as usize).max()
    }
}

/// Bounds and mode for one featurization call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeaturizeOptions {
    /// Pad atoms to this length; the atom count when `None`.
    pub max_num_nodes: Option<usize>,
    /// Pad edges to this length; the edge count when `None`.
    pub max_num_edges: Option<usize>,
    pub train: bool,
}

impl FeaturizeOptions {
    pub fn train() -> Self {
        Self {
            train: true,
            ..Self::default()
        }
    }
}

/// The steps of turning a structure into tensors.
///
/// [`featurize_with`] drives any implementation through the same sequence:
/// build the graph, check bounds, set the train flag, then collect node,
/// edge and graph features.
pub trait Featurizer {
    fn create_graph(&self, structure: Structure<'_>) -> Result<MolGraph>;

    /// Propagated to every tokenizer before features are computed.
    fn set_train(&mut self, train: bool);

    fn node_features(&mut self, graph: &MolGraph) -> Vec<i32>;

    fn edge_features(&mut self, graph: &MolGraph) -> Vec<i32>;

    /// Bond index per directed edge, for featurizers that track it.
    fn edge_bond_indices(&self, _graph: &MolGraph) -> Option<Vec<i32>> {
        None
    }

    fn graph_features(&mut self, _graph: &MolGraph) -> BTreeMap<&'static str, Array1<i32>> {
        BTreeMap::new()
    }
}

pub fn featurize_with<F: Featurizer + ?Sized>(
    featurizer: &mut F,
    structure: Structure<'_>,
    opts: &FeaturizeOptions,
) -> Result<FeatureMap> {
    let graph = featurizer.create_graph(structure)?;
    let num_atoms = graph.num_nodes();
    let num_edges = graph.num_edges();
    let max_nodes = check_bound("max_num_nodes", num_atoms, opts.max_num_nodes)?;
    let max_edges = check_bound("max_num_edges", num_edges, opts.max_num_edges)?;

    featurizer.set_train(opts.train);
    let atom = padded(featurizer.node_features(&graph), max_nodes);
    let bond = padded(featurizer.edge_features(&graph), max_edges);
    let bond_indices = featurizer
        .edge_bond_indices(&graph)
        .map(|indices| padded(indices, max_edges));
    let graph_features = featurizer.graph_features(&graph);

    let mut connectivity = Array2::from_elem((max_edges, 2), PADDING_VALUE);
    for (k, edge) in graph.edges().iter().enumerate() {
        connectivity[[k, 0]] = edge.source.index() as i32;
        connectivity[[k, 1]] = edge.target.index() as i32;
    }

    Ok(FeatureMap {
        atom,
        bond,
        connectivity,
        bond_indices,
        graph_features,
        num_atoms,
        num_edges,
    })
}

fn check_bound(what: &'static str, actual: usize, max: Option<usize>) -> Result<usize> {
    match max {
        Some(max) if max < actual => Err(Error::SizeConstraint { what, actual, max }),
        Some(max) => Ok(max),
        None => Ok(actual),
    }
}

fn padded(mut values: Vec<i32>, len: usize) -> Array1<i32> {
    values.resize(len, PADDING_VALUE);
    Array1::from_vec(values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int32,
}

/// Name, element type and shape (`None` = variable) of one tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: &'static str,
    pub dtype: DType,
    pub shape: Vec<Option<usize>>,
}

impl TensorSpec {
    fn new(name: &'static str, shape: Vec<Option<usize>>) -> Self {
        Self {
            name,
            dtype: DType::Int32,
            shape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessorConfig {
    /// Featurize the explicit-hydrogen form of the structure.
    pub explicit_hs: bool,
    /// Record each directed edge's bond index.
    pub bond_indices: bool,
    pub atom_features: FeatureSet,
    pub bond_features: FeatureSet,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            explicit_hs: true,
            bond_indices: true,
            atom_features: FeatureSet::Extended,
            bond_features: FeatureSet::Extended,
        }
    }
}

/// The molecular featurizer: one atom vocabulary, one bond vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessorConfig,
    atom_tokenizer: Tokenizer<String>,
    bond_tokenizer: Tokenizer<String>,
}

#[derive(Serialize, Deserialize)]
struct PreprocessorFile {
    version: u32,
    explicit_hs: bool,
    bond_indices: bool,
    atom_features: String,
    bond_features: String,
    atom_tokenizer: Tokenizer<String>,
    bond_tokenizer: Tokenizer<String>,
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn atom_tokenizer(&self) -> &Tokenizer<String> {
        &self.atom_tokenizer
    }

    pub fn bond_tokenizer(&self) -> &Tokenizer<String> {
        &self.bond_tokenizer
    }

    /// Atom vocabulary size plus the unknown class.
    pub fn atom_classes(&self) -> usize {
        self.atom_tokenizer.num_classes() + 1
    }

    pub fn bond_classes(&self) -> usize {
        self.bond_tokenizer.num_classes() + 1
    }

    pub fn featurize<'a>(
        &mut self,
        structure: impl Into<Structure<'a>>,
        opts: &FeaturizeOptions,
    ) -> Result<FeatureMap> {
        featurize_with(self, structure.into(), opts)
    }

    /// Grow both vocabularies from `smiles`, then freeze them.
    pub fn fit<'s, I>(&mut self, smiles: I) -> Result<()>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let opts = FeaturizeOptions::train();
        for s in smiles {
            featurize_with(self, Structure::Smiles(s), &opts)?;
        }
        self.set_train(false);
        log::debug!(
            "vocabulary: {} atom classes, {} bond classes",
            self.atom_classes(),
            self.bond_classes()
        );
        Ok(())
    }

    pub fn output_signature(&self) -> Vec<TensorSpec> {
        let mut spec = vec![
            TensorSpec::new("atom", vec![None]),
            TensorSpec::new("bond", vec![None]),
            TensorSpec::new("connectivity", vec![None, Some(2)]),
        ];
        if self.config.bond_indices {
            spec.push(TensorSpec::new("bond_indices", vec![None]));
        }
        spec
    }

    pub fn padding_values(&self) -> BTreeMap<&'static str, i32> {
        self.output_signature()
            .into_iter()
            .map(|spec| (spec.name, PADDING_VALUE))
            .collect()
    }

    pub fn to_json(&self) -> std::result::Result<String, VocabularyError> {
        let file = PreprocessorFile {
            version: FILE_VERSION,
            explicit_hs: self.config.explicit_hs,
            bond_indices: self.config.bond_indices,
            atom_features: self.config.atom_features.to_string(),
            bond_features: self.config.bond_features.to_string(),
            atom_tokenizer: self.atom_tokenizer.clone(),
            bond_tokenizer: self.bond_tokenizer.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, VocabularyError> {
        let file: PreprocessorFile = serde_json::from_str(json)?;
        if file.version != FILE_VERSION {
            return Err(VocabularyError::Version {
                found: file.version,
                expected: FILE_VERSION,
            });
        }
        Ok(Self {
            config: PreprocessorConfig {
                explicit_hs: file.explicit_hs,
                bond_indices: file.bond_indices,
                atom_features: file.atom_features.parse()?,
                bond_features: file.bond_features.parse()?,
            },
            atom_tokenizer: file.atom_tokenizer,
            bond_tokenizer: file.bond_tokenizer,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let preprocessor = Self::from_json(&json)?;
        log::info!(
            "loaded preprocessor from {}: {} atom classes, {} bond classes",
            path.display(),
            preprocessor.atom_classes(),
            preprocessor.bond_classes()
        );
        Ok(preprocessor)
    }
}

impl Featurizer for Preprocessor {
    fn create_graph(&self, structure: Structure<'_>) -> Result<MolGraph> {
        let mol = match structure {
            Structure::Smiles(s) => parse_smiles(s).map_err(|e| Error::parse(s, e))?,
            Structure::Mol(mol) => mol.clone(),
        };
        let mol = if self.config.explicit_hs { add_hs(&mol) } else { mol };
        Ok(MolGraph::new(mol))
    }

    fn set_train(&mut self, train: bool) {
        self.atom_tokenizer.set_train(train);
        self.bond_tokenizer.set_train(train);
    }

    fn node_features(&mut self, graph: &MolGraph) -> Vec<i32> {
        let ctx = FeatureContext::new(graph.mol());
        graph
            .mol()
            .atoms()
            .map(|idx| {
                let descriptor = atom_descriptor(self.config.atom_features, &ctx, idx);
                self.atom_tokenizer.tokenize(&descriptor.to_string())
            })
            .collect()
    }

    fn edge_features(&mut self, graph: &MolGraph) -> Vec<i32> {
        let ctx = FeatureContext::new(graph.mol());
        graph
            .edges()
            .iter()
            .map(|edge| {
                let descriptor = bond_descriptor(self.config.bond_features, &ctx, edge.bond, edge.flipped);
                self.bond_tokenizer.tokenize(&descriptor.to_string())
            })
            .collect()
    }

    fn edge_bond_indices(&self, graph: &MolGraph) -> Option<Vec<i32>> {
        self.config
            .bond_indices
            .then(|| graph.edges().iter().map(|edge| edge.bond.index() as i32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn trained(smiles: &[&str]) -> Preprocessor {
        let mut p = Preprocessor::default();
        p.fit(smiles.iter().copied()).unwrap();
        p
    }

    #[test]
    fn ethane_tensors() {
        let mut p = trained(&["CC"]);
        let f = p.featurize("CC", &FeaturizeOptions::default()).unwrap();
        assert_eq!(f.num_atoms, 8);
        assert_eq!(f.num_edges, 14);
        assert_eq!(f.connectivity.dim(), (14, 2));
        assert_eq!(f.connectivity.row(0).to_vec(), vec![0, 1]);
        assert_eq!(f.connectivity.row(4).to_vec(), vec![1, 0]);
        assert_eq!(
            f.bond_indices.unwrap(),
            array![0, 1, 2, 3, 0, 4, 5, 6, 1, 2, 3, 4, 5, 6]
        );
        // two carbons share a class, six hydrogens share another
        assert_eq!(f.atom.to_vec(), vec![1, 1, 2, 2, 2, 2, 2, 2]);
        assert_eq!(p.atom_classes(), 3);
        // C-C, C-H and H-C
        assert_eq!(p.bond_classes(), 4);
        assert_eq!(f.bond[0], f.bond[4]);
        assert_ne!(f.bond[1], f.bond[8]);
    }

    #[test]
    fn padding_is_zero() {
        let mut p = trained(&["CC"]);
        let opts = FeaturizeOptions {
            max_num_nodes: Some(10),
            max_num_edges: Some(20),
            train: false,
        };
        let f = p.featurize("CC", &opts).unwrap();
        assert_eq!(f.atom.len(), 10);
        assert_eq!(&f.atom.to_vec()[8..], &[0, 0]);
        assert_eq!(f.bond.len(), 20);
        assert!(f.bond.iter().skip(14).all(|&b| b == PADDING_VALUE));
        assert_eq!(f.connectivity.dim(), (20, 2));
        assert!(f.connectivity.rows().into_iter().skip(14).all(|r| r.iter().all(|&v| v == 0)));
        assert!(f.bond_indices.unwrap().iter().skip(14).all(|&v| v == 0));
    }

    #[test]
    fn bounds_are_checked() {
        let mut p = trained(&["CC"]);
        let opts = FeaturizeOptions {
            max_num_edges: Some(10),
            ..FeaturizeOptions::default()
        };
        match p.featurize("CC", &opts) {
            Err(Error::SizeConstraint { what, actual, max }) => {
                assert_eq!((what, actual, max), ("max_num_edges", 14, 10));
            }
            other => panic!("unexpected {other:?}"),
        }
        let opts = FeaturizeOptions {
            max_num_nodes: Some(2),
            ..FeaturizeOptions::default()
        };
        assert!(matches!(
            p.featurize("CC", &opts),
            Err(Error::SizeConstraint { what: "max_num_nodes", .. })
        ));
    }

    #[test]
    fn frozen_featurization_is_deterministic() {
        let mut p = trained(&["CCO", "c1ccccc1"]);
        let opts = FeaturizeOptions {
            max_num_edges: Some(40),
            ..FeaturizeOptions::default()
        };
        let a = p.featurize("OCC", &opts).unwrap();
        let classes = p.atom_classes();
        let b = p.featurize("OCC", &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(p.atom_classes(), classes);
    }

    #[test]
    fn unseen_types_are_unknown() {
        let mut p = trained(&["CC"]);
        let f = p.featurize("CB", &FeaturizeOptions::default()).unwrap();
        assert_eq!(f.unknown_atoms(), vec![1]);
        // the C-B bond and the two B-H bonds
        assert_eq!(f.unknown_bonds(), vec![0, 4, 5]);
        assert_eq!(p.atom_classes(), 3);
    }

    #[test]
    fn training_grows_the_shared_vocabulary() {
        let mut p = trained(&["CC"]);
        let before = p.atom_classes();
        p.featurize("CO", &FeaturizeOptions::train()).unwrap();
        assert!(p.atom_classes() > before);
        assert!(p.atom_tokenizer().is_training());
        p.featurize("CO", &FeaturizeOptions::default()).unwrap();
        assert!(!p.atom_tokenizer().is_training());
    }

    #[test]
    fn heavy_atom_graph() {
        let mut p = Preprocessor::new(PreprocessorConfig {
            explicit_hs: false,
            bond_indices: false,
            ..PreprocessorConfig::default()
        });
        let f = p.featurize("CC", &FeaturizeOptions::train()).unwrap();
        assert_eq!((f.num_atoms, f.num_edges), (2, 2));
        assert!(f.bond_indices.is_none());
        assert_eq!(p.output_signature().len(), 3);
    }

    #[test]
    fn structure_sources_agree() {
        let mut p = trained(&["CCO"]);
        let molecule = Molecule::new("OCC").unwrap();
        let from_smiles = p.featurize(&molecule, &FeaturizeOptions::default()).unwrap();
        let from_mol = p.featurize(molecule.mol(), &FeaturizeOptions::default()).unwrap();
        assert_eq!(from_smiles, from_mol);
    }

    #[test]
    fn signature_and_padding() {
        let p = Preprocessor::default();
        let names: Vec<_> = p.output_signature().iter().map(|s| s.name).collect();
        assert_eq!(names, ["atom", "bond", "connectivity", "bond_indices"]);
        let conn = &p.output_signature()[2];
        assert_eq!(conn.shape, vec![None, Some(2)]);
        assert_eq!(conn.dtype, DType::Int32);
        assert!(p.padding_values().values().all(|&v| v == 0));
    }

    #[test]
    fn json_round_trip() {
        let p = trained(&["CCO", "CN"]);
        let json = p.to_json().unwrap();
        assert!(json.contains("\"version\": 1"));
        let back = Preprocessor::from_json(&json).unwrap();
        assert_eq!(back.config(), p.config());
        assert_eq!(back.atom_tokenizer().vocabulary(), p.atom_tokenizer().vocabulary());
        assert_eq!(back.bond_classes(), p.bond_classes());
        assert!(!back.atom_tokenizer().is_training());
    }

    #[test]
    fn json_rejects_unknown_version_and_features() {
        let json = trained(&["C"]).to_json().unwrap();
        let v2 = json.replace("\"version\": 1", "\"version\": 2");
        assert!(matches!(
            Preprocessor::from_json(&v2),
            Err(VocabularyError::Version { found: 2, expected: 1 })
        ));
        let odd = json.replacen("\"extended\"", "\"fancy\"", 1);
        assert!(matches!(
            Preprocessor::from_json(&odd),
            Err(VocabularyError::UnknownFeatures(_))
        ));
        assert!(matches!(Preprocessor::from_json("{"), Err(VocabularyError::Json(_))));
    }
}
