//! Feature sequences and padded batches.

use ndarray::{s, Array2, Array3};

use crate::error::{Error, Result};
use crate::molecule::Molecule;
use crate::preprocess::{FeatureMap, FeaturizeOptions, Preprocessor, PADDING_VALUE};

/// Edge bound shared by every molecule of a prediction call: both
/// directions of the largest explicit-hydrogen bond count.
pub fn max_num_edges(molecules: &[Molecule]) -> usize {
    molecules
        .iter()
        .map(|m| 2 * m.num_bonds_with_hs())
        .max()
        .unwrap_or(0)
}

/// Featurizes molecules one at a time, in order, with a frozen vocabulary.
///
/// Single pass: iterating again means building a new stream, which gives
/// the same tensors.
pub struct FeatureStream<'a> {
    preprocessor: &'a mut Preprocessor,
    molecules: std::slice::Iter<'a, Molecule>,
    opts: FeaturizeOptions,
}

impl<'a> FeatureStream<'a> {
    pub fn new(preprocessor: &'a mut Preprocessor, molecules: &'a [Molecule], max_num_edges: usize) -> Self {
        Self {
            preprocessor,
            molecules: molecules.iter(),
            opts: FeaturizeOptions {
                max_num_nodes: None,
                max_num_edges: Some(max_num_edges),
                train: false,
            },
        }
    }
}

impl Iterator for FeatureStream<'_> {
    type Item = Result<FeatureMap>;

    fn next(&mut self) -> Option<Self::Item> {
        let molecule = self.molecules.next()?;
        Some(self.preprocessor.featurize(molecule, &self.opts))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.molecules.size_hint()
    }
}

impl ExactSizeIterator for FeatureStream<'_> {}

/// A fully read feature sequence, so batching and the validity check see
/// the same tensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedFeatures {
    features: Vec<FeatureMap>,
}

impl CachedFeatures {
    pub fn from_stream<I>(stream: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<FeatureMap>>,
    {
        Ok(Self {
            features: stream.into_iter().collect::<Result<Vec<_>>>()?,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&FeatureMap> {
        self.features.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureMap> {
        self.features.iter()
    }

    /// Consecutive batches of `batch_size` molecules; the last may be shorter.
    pub fn batches(&self, batch_size: usize) -> Result<impl Iterator<Item = Result<Batch>> + '_> {
        if batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        Ok(self.features.chunks(batch_size).map(Batch::from_features))
    }
}

/// Feature maps stacked along a leading molecule axis and zero-padded to
/// the widest member.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub atom: Array2<i32>,
    pub bond: Array2<i32>,
    pub connectivity: Array3<i32>,
    pub bond_indices: Option<Array2<i32>>,
    pub num_atoms: Vec<usize>,
    pub num_edges: Vec<usize>,
    num_bonds: Vec<usize>,
}

impl Batch {
    pub fn from_features(features: &[FeatureMap]) -> Result<Self> {
        let Some(first) = features.first() else {
            return Err(Error::Config("cannot build an empty batch".into()));
        };
        let tracked = first.bond_indices.is_some();
        if features.iter().any(|f| f.bond_indices.is_some() != tracked) {
            return Err(Error::Internal(
                "batch mixes feature maps with and without bond indices".into(),
            ));
        }

        let n = features.len();
        let atom_width = features.iter().map(|f| f.atom.len()).max().unwrap_or(0);
        let edge_width = features.iter().map(|f| f.bond.len()).max().unwrap_or(0);

        let mut atom = Array2::from_elem((n, atom_width), PADDING_VALUE);
        let mut bond = Array2::from_elem((n, edge_width), PADDING_VALUE);
        let mut connectivity = Array3::from_elem((n, edge_width, 2), PADDING_VALUE);
        let mut bond_indices = tracked.then(|| Array2::from_elem((n, edge_width), PADDING_VALUE));

        for (i, f) in features.iter().enumerate() {
            atom.slice_mut(s![i, ..f.atom.len()]).assign(&f.atom);
            bond.slice_mut(s![i, ..f.bond.len()]).assign(&f.bond);
            connectivity
                .slice_mut(s![i, ..f.connectivity.nrows(), ..])
                .assign(&f.connectivity);
            if let (Some(out), Some(indices)) = (bond_indices.as_mut(), f.bond_indices.as_ref()) {
                out.slice_mut(s![i, ..indices.len()]).assign(indices);
            }
        }

        Ok(Self {
            atom,
            bond,
            connectivity,
            bond_indices,
            num_atoms: features.iter().map(|f| f.num_atoms).collect(),
            num_edges: features.iter().map(|f| f.num_edges).collect(),
            num_bonds: features.iter().map(bond_count).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.num_atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_atoms.is_empty()
    }

    /// Output columns molecule `i` needs: one per bond index.
    pub fn num_bonds(&self, i: usize) -> usize {
        self.num_bonds.get(i).copied().unwrap_or(0)
    }

    /// Output columns the whole batch needs.
    pub fn required_columns(&self) -> usize {
        self.num_bonds.iter().copied().max().unwrap_or(0)
    }
}

fn bond_count(f: &FeatureMap) -> usize {
    match f.max_bond_index() {
        Some(max) => max + 1,
        None => f.num_edges / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(smiles: &[&str]) -> (Preprocessor, Vec<Molecule>) {
        let mut p = Preprocessor::default();
        p.fit(smiles.iter().copied()).unwrap();
        let molecules = smiles.iter().map(|s| Molecule::new(s).unwrap()).collect();
        (p, molecules)
    }

    #[test]
    fn shared_edge_bound() {
        let (_, molecules) = setup(&["C", "CC", "O"]);
        // ethane: 7 bonds with hydrogens
        assert_eq!(max_num_edges(&molecules), 14);
        assert_eq!(max_num_edges(&[]), 0);
    }

    #[test]
    fn stream_is_lazy_and_repeatable() {
        let (mut p, molecules) = setup(&["CC", "CO"]);
        let bound = max_num_edges(&molecules);
        let mut stream = FeatureStream::new(&mut p, &molecules, bound);
        assert_eq!(stream.len(), 2);
        let first = stream.next().unwrap().unwrap();
        assert_eq!(stream.len(), 1);
        assert_eq!(first.bond.len(), 14);
        drop(stream);

        let a = CachedFeatures::from_stream(FeatureStream::new(&mut p, &molecules, bound)).unwrap();
        let b = CachedFeatures::from_stream(FeatureStream::new(&mut p, &molecules, bound)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(0), Some(&first));
    }

    #[test]
    fn batches_pad_to_the_widest_member() {
        let (mut p, molecules) = setup(&["C", "CCO", "N"]);
        let bound = max_num_edges(&molecules);
        let cached = CachedFeatures::from_stream(FeatureStream::new(&mut p, &molecules, bound)).unwrap();
        let batches: Vec<Batch> = cached.batches(2).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].len(), 1);

        let first = &batches[0];
        assert_eq!(first.num_atoms, vec![5, 9]);
        assert_eq!(first.atom.dim(), (2, 9));
        assert!(first.atom.row(0).iter().skip(5).all(|&v| v == 0));
        assert_eq!(first.connectivity.dim(), (2, bound, 2));
        assert_eq!(first.num_bonds(0), 4);
        assert_eq!(first.required_columns(), 8);
        assert!(first.bond_indices.is_some());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(CachedFeatures::default().batches(0), Err(Error::Config(_))));
        assert!(matches!(Batch::from_features(&[]), Err(Error::Config(_))));
    }
}
