// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records per-epoch training metrics of one fold to a CSV file.
//
// Output file: logs/fold={k}/metrics.csv
//
//   epoch,train_loss,val_loss,val_acc
//   1,1.0981,1.0912,0.352
//   2,1.0419,1.0623,0.418
//   ...
//
// The same numbers also go to the experiment tracker; the CSV is
// a plain-text copy that survives without any tracker tooling.
// Rows are appended one epoch at a time so a crashed fold still
// leaves the epochs it finished.
//
// Reference: Rust Book §12 (I/O and File Handling), csv crate documentation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

const HEADER: [&str; 4] = ["epoch", "train_loss", "val_loss", "val_acc"];

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean cross-entropy over training batches
    pub train_loss: f64,

    /// Mean cross-entropy over validation batches
    pub val_loss: f64,

    /// Fraction of validation rows classified correctly, in [0, 1]
    pub val_acc: f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the fold's metrics CSV, replacing any file left by
    /// an earlier run of the same fold.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut w = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        w.write_record(HEADER)?;
        w.flush()?;

        Ok(Self { csv_path })
    }

    /// Append one epoch as a new CSV row
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        // Header already written by create()
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        w.serialize(m)?;
        w.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, val_acc={:.4}",
            m.epoch, m.train_loss, m.val_loss, m.val_acc,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_rows(path: &Path) -> Vec<EpochMetrics> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_writes_header_and_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(&dir.path().join("fold=0")).unwrap();
        let first  = EpochMetrics { epoch: 1, train_loss: 1.1, val_loss: 1.0, val_acc: 0.5 };
        let second = EpochMetrics { epoch: 2, train_loss: 0.9, val_loss: 0.95, val_acc: 0.625 };
        logger.log(&first).unwrap();
        logger.log(&second).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().next(), Some("epoch,train_loss,val_loss,val_acc"));
        assert_eq!(text.lines().count(), 3);
        assert_eq!(read_rows(logger.csv_path()), vec![first, second]);
    }

    #[test]
    fn test_recreate_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let m   = EpochMetrics { epoch: 1, train_loss: 0.0, val_loss: 0.0, val_acc: 0.0 };
        MetricsLogger::create(dir.path()).unwrap().log(&m).unwrap();
        let again = MetricsLogger::create(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(again.csv_path()).unwrap().lines().count(), 1);
        assert!(read_rows(again.csv_path()).is_empty());
    }
}
