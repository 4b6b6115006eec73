//! The inference boundary.

use ndarray::Array2;

use super::batch::Batch;
use crate::error::Result;

/// Predictions for one batch: row `i` belongs to the batch's `i`-th
/// molecule, column `j` to its bond index `j` in the explicit-hydrogen
/// structure. Columns past a molecule's bond count are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub bde: Array2<f64>,
    pub bdfe: Array2<f64>,
}

/// A trained BDE model. Implementations wrap whatever runs the network;
/// failures are reported as [`Error::Model`](crate::Error::Model).
pub trait BdeModel {
    fn predict_batch(&self, batch: &Batch) -> Result<ModelOutput>;
}

impl<F> BdeModel for F
where
    F: Fn(&Batch) -> Result<ModelOutput>,
{
    fn predict_batch(&self, batch: &Batch) -> Result<ModelOutput> {
        self(batch)
    }
}
