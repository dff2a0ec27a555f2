// ============================================================
// Layer 3 - Submission Domain Type
// ============================================================
// The externally expected output of the task: one predicted
// class per test row, in test-table order.
//
//   id,prediction
//   c6d58c3f69,2
//   cefcc82292,1
//   ...
//
// The same type represents a single fold's predictions and
// the final, majority-voted submission.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub id:         String,
    pub prediction: Label,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    rows: Vec<SubmissionRow>,
}

impl Submission {
    pub fn new(rows: Vec<SubmissionRow>) -> Self {
        Self { rows }
    }

    /// Zip row ids with predictions. Both must have the same length,
    /// otherwise a row would silently lose its prediction.
    pub fn from_predictions(ids: Vec<String>, predictions: Vec<Label>) -> Result<Self> {
        ensure!(
            ids.len() == predictions.len(),
            "{} row ids but {} predictions",
            ids.len(),
            predictions.len()
        );
        let rows = ids
            .into_iter()
            .zip(predictions)
            .map(|(id, prediction)| SubmissionRow { id, prediction })
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[SubmissionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.id.as_str())
    }

    pub fn predictions(&self) -> impl Iterator<Item = Label> + '_ {
        self.rows.iter().map(|r| r.prediction)
    }

    /// Count of predictions per class, indexed by `Label::index()`
    pub fn class_counts(&self) -> [usize; Label::COUNT] {
        let mut counts = [0usize; Label::COUNT];
        for label in self.predictions() {
            counts[label.index()] += 1;
        }
        counts
    }

    /// "entailment=3 neutral=1 contradiction=0", for log lines
    pub fn class_summary(&self) -> String {
        Label::ALL
            .iter()
            .zip(self.class_counts())
            .map(|(label, n)| format!("{label}={n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
