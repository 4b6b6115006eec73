//! End-to-end BDE prediction: parse, fragment, featurize, batch, run the
//! model and join the results back onto bonds.

pub mod batch;
pub mod model;
pub mod reference;

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Axis;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fragment::{enumerate_fragments, FragmentRecord};
use crate::molecule::Molecule;
use crate::preprocess::{FeatureMap, Preprocessor};

pub use batch::{max_num_edges, Batch, CachedFeatures, FeatureStream};
pub use model::{BdeModel, ModelOutput};
pub use reference::{ReferenceTable, ReferenceValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictOptions {
    /// Keep one row per distinct fragment pair.
    pub drop_duplicates: bool,
    /// Molecules per model call.
    pub batch_size: usize,
    /// Progress bar and info logging.
    pub verbose: bool,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            batch_size: 1,
            verbose: false,
        }
    }
}

/// Whether a molecule stays inside the trained vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidityReport {
    /// Some atom or bond type was never seen in training.
    pub is_outlier: bool,
    /// Atom indices with an unknown type.
    pub missing_atoms: Vec<usize>,
    /// Bond indices with an unknown type, ascending.
    pub missing_bonds: Vec<usize>,
}

impl ValidityReport {
    pub fn from_features(features: &FeatureMap) -> Self {
        let missing_atoms = features.unknown_atoms();
        let missing_bonds = features.unknown_bonds();
        Self {
            is_outlier: !missing_atoms.is_empty() || !missing_bonds.is_empty(),
            missing_atoms,
            missing_bonds,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.is_outlier
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    #[serde(flatten)]
    pub fragment: FragmentRecord,
    pub bde_pred: f64,
    pub bdfe_pred: f64,
    pub is_valid: bool,
    pub bde: Option<f64>,
    pub bdfe: Option<f64>,
    pub set: Option<String>,
}

/// A model, its preprocessor and optional reference data. Loading any of
/// them is the caller's job; the predictor holds no global state.
pub struct Predictor<M> {
    model: M,
    preprocessor: Preprocessor,
    reference: Option<ReferenceTable>,
}

impl<M: BdeModel> Predictor<M> {
    pub fn new(model: M, preprocessor: Preprocessor) -> Self {
        Self {
            model,
            preprocessor,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceTable) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn reference(&self) -> Option<&ReferenceTable> {
        self.reference.as_ref()
    }

    /// One row per kept fragment of every input, in input order and then
    /// ascending bond index. Any unparseable input fails the whole call.
    pub fn predict<S: AsRef<str>>(&mut self, smiles: &[S], opts: &PredictOptions) -> Result<Vec<PredictionRow>> {
        if opts.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        check_join_config(&self.preprocessor)?;
        let molecules = parse_all(smiles)?;
        let fragments = molecules
            .iter()
            .map(|m| enumerate_fragments(m, opts.drop_duplicates))
            .collect::<Result<Vec<_>>>()?;
        if opts.verbose {
            let total: usize = fragments.iter().map(Vec::len).sum();
            log::info!("{} molecules, {} bonds to predict", molecules.len(), total);
        }

        let bound = max_num_edges(&molecules);
        let progress = progress_bar(molecules.len(), opts.verbose);
        let stream = FeatureStream::new(&mut self.preprocessor, &molecules, bound).inspect(|_| progress.inc(1));
        let features = CachedFeatures::from_stream(stream)?;
        progress.finish_and_clear();

        let validity: Vec<ValidityReport> = features.iter().map(ValidityReport::from_features).collect();
        let predictions = self.run_model(&features, opts.batch_size)?;

        let mut rows = Vec::with_capacity(fragments.iter().map(Vec::len).sum());
        for (i, records) in fragments.into_iter().enumerate() {
            let (bde, bdfe) = &predictions[i];
            for fragment in records {
                let (Some(&bde_pred), Some(&bdfe_pred)) = (bde.get(fragment.bond_index), bdfe.get(fragment.bond_index)) else {
                    return Err(Error::Internal(format!(
                        "no prediction for bond {} of {}",
                        fragment.bond_index, fragment.molecule
                    )));
                };
                let reference = self
                    .reference
                    .as_ref()
                    .and_then(|table| table.get(&fragment.molecule, fragment.bond_index))
                    .cloned()
                    .unwrap_or_default();
                rows.push(PredictionRow {
                    fragment,
                    bde_pred,
                    bdfe_pred,
                    is_valid: validity[i].is_valid(),
                    bde: reference.bde,
                    bdfe: reference.bdfe,
                    set: reference.set,
                });
            }
        }
        Ok(rows)
    }

    /// Vocabulary coverage of each input, without running the model.
    pub fn validate<S: AsRef<str>>(&mut self, smiles: &[S]) -> Result<Vec<ValidityReport>> {
        check_join_config(&self.preprocessor)?;
        let molecules = parse_all(smiles)?;
        let bound = max_num_edges(&molecules);
        FeatureStream::new(&mut self.preprocessor, &molecules, bound)
            .map(|f| f.map(|f| ValidityReport::from_features(&f)))
            .collect()
    }

    /// Per-molecule BDE and BDFE vectors indexed by bond index.
    fn run_model(&self, features: &CachedFeatures, batch_size: usize) -> Result<Vec<(Vec<f64>, Vec<f64>)>> {
        let mut out = Vec::with_capacity(features.len());
        for (b, batch) in features.batches(batch_size)?.enumerate() {
            let batch = batch?;
            let output = self.model.predict_batch(&batch)?;
            check_output(&batch, &output)?;
            log::debug!("batch {b}: {} molecules", batch.len());
            for i in 0..batch.len() {
                let width = batch.num_bonds(i);
                let bde = output.bde.index_axis(Axis(0), i);
                let bdfe = output.bdfe.index_axis(Axis(0), i);
                out.push((
                    bde.iter().take(width).copied().collect(),
                    bdfe.iter().take(width).copied().collect(),
                ));
            }
        }
        Ok(out)
    }
}

/// Predictions are joined onto fragments by explicit-hydrogen bond index,
/// so the preprocessor must featurize that structure and report the index
/// of every edge.
fn check_join_config(preprocessor: &Preprocessor) -> Result<()> {
    let config = preprocessor.config();
    if !config.explicit_hs {
        return Err(Error::Config(
            "prediction needs a preprocessor with explicit_hs enabled".into(),
        ));
    }
    if !config.bond_indices {
        return Err(Error::Config(
            "prediction needs a preprocessor with bond_indices enabled".into(),
        ));
    }
    Ok(())
}

fn parse_all<S: AsRef<str>>(smiles: &[S]) -> Result<Vec<Molecule>> {
    smiles.iter().map(|s| Molecule::new(s.as_ref())).collect()
}

fn check_output(batch: &Batch, output: &ModelOutput) -> Result<()> {
    let need_rows = batch.len();
    let need_columns = batch.required_columns();
    for array in [&output.bde, &output.bdfe] {
        let (rows, columns) = array.dim();
        if rows < need_rows || columns < need_columns {
            return Err(Error::ModelOutput {
                rows,
                columns,
                need_rows,
                need_columns,
            });
        }
    }
    Ok(())
}

fn progress_bar(len: usize, verbose: bool) -> ProgressBar {
    if !verbose {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("featurizing [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
