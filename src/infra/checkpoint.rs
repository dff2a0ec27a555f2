// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Persists the best weights of a fold using Burn's
// CompactRecorder (MessagePack + gzip, weights only).
//
// Selection policy: after each validation pass the monitored
// metric is offered to a BestScore tracker. Only a strict
// improvement (in the configured direction) produces a new
// checkpoint, and the previous best file of the fold is then
// deleted, so exactly one checkpoint per fold survives.
//
// File naming convention:
//   models/
//     run_config.json                          ← resolved RunConfig
//     nli_epoch=3-val_acc=0_71_fold=0.mpk.gz   ← best of fold 0
//     nli_epoch=2-val_acc=0_69_fold=1.mpk.gz   ← best of fold 1
//     ...
//
// The score is written with '_' as decimal separator: the
// recorder sets the file extension itself and would otherwise
// treat everything after the '.' of "0.71" as an extension.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{prelude::*, record::CompactRecorder};

use crate::application::run_config::{Monitor, MonitorMode, RunConfig};
use crate::ml::model::NliModel;

const CHECKPOINT_EXTENSION: &str = "mpk.gz";

/// Tracks the best monitored value seen so far.
#[derive(Debug, Clone)]
pub struct BestScore {
    mode: MonitorMode,
    best: Option<f64>,
}

impl BestScore {
    pub fn new(mode: MonitorMode) -> Self {
        Self { mode, best: None }
    }

    /// Record `value`; true if it strictly beats the previous best.
    /// NaN never improves (an empty validation set yields NaN loss).
    pub fn update(&mut self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        let improved = match (self.best, self.mode) {
            (None, _)                   => true,
            (Some(b), MonitorMode::Max) => value > b,
            (Some(b), MonitorMode::Min) => value < b,
        };
        if improved {
            self.best = Some(value);
        }
        improved
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

/// Saves one fold's checkpoints, keeping only the best.
pub struct CheckpointManager {
    dir:       PathBuf,
    fold:      usize,
    monitor:   Monitor,
    best_path: Option<PathBuf>,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, fold: usize, monitor: Monitor) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir, fold, monitor, best_path: None })
    }

    /// Path of the surviving checkpoint, if any was saved
    pub fn best_path(&self) -> Option<&Path> {
        self.best_path.as_deref()
    }

    /// File stem for a checkpoint of this fold at `epoch` scoring `score`
    pub fn checkpoint_stem(&self, epoch: usize, score: f64) -> String {
        let metric = match self.monitor {
            Monitor::ValAcc  => "val_acc",
            Monitor::ValLoss => "val_loss",
        };
        let score = format!("{score:.2}").replace('.', "_");
        format!("nli_epoch={epoch}-{metric}={score}_fold={}", self.fold)
    }

    /// Write a new best checkpoint and delete the previous one.
    pub fn save_best<B: Backend>(
        &mut self,
        model: &NliModel<B>,
        epoch: usize,
        score: f64,
    ) -> Result<PathBuf> {
        let stem = self.dir.join(self.checkpoint_stem(epoch, score));
        model
            .clone()
            .save_file(stem.clone(), &CompactRecorder::new())
            .with_context(|| format!("Failed to save checkpoint '{}'", stem.display()))?;
        let path = stem.with_extension(CHECKPOINT_EXTENSION);

        if let Some(old) = self.best_path.replace(path.clone()) {
            if old != path {
                fs::remove_file(&old).with_context(|| {
                    format!("Cannot remove superseded checkpoint '{}'", old.display())
                })?;
            }
        }

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }
}

/// Write the resolved run configuration next to the checkpoints.
pub fn save_run_config(dir: &Path, cfg: &RunConfig) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("run_config.json");
    fs::write(&path, serde_json::to_string_pretty(cfg)?)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
    tracing::debug!("Saved run config to '{}'", path.display());
    Ok(path)
}
