// ============================================================
// Layer 2 - AggregateUseCase
// ============================================================
// Re-runs the majority vote outside of training: reads any
// number of id,prediction CSV files (for example fold outputs
// kept from earlier runs) and writes their per-row mode.
//
//   watson-kfold aggregate --inputs a.csv b.csv c.csv --output merged.csv

use anyhow::{ensure, Result};
use std::path::PathBuf;

use crate::domain::{submission::Submission, vote::most_frequent_prediction};
use crate::infra::submission_store::{read_submission, write_submission};

pub struct AggregateUseCase {
    inputs: Vec<PathBuf>,
    output: PathBuf,
}

impl AggregateUseCase {
    pub fn new(inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        Self { inputs, output }
    }

    pub fn execute(&self) -> Result<Submission> {
        ensure!(!self.inputs.is_empty(), "aggregate needs at least one input file");

        let submissions = self
            .inputs
            .iter()
            .map(|p| read_submission(p))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Aggregating {} submissions", submissions.len());

        let merged = most_frequent_prediction(&submissions)?;
        write_submission(&self.output, &merged)?;

        tracing::info!("Wrote {} rows to '{}'", merged.len(), self.output.display());
        Ok(merged)
    }
}
