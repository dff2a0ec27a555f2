// ============================================================
// Layer 2 - Run Configuration
// ============================================================
// Every option a k-fold run recognises, grouped the way the
// TOML config files group them:
//
//   data_dir = "data"
//   current_dir = "outputs"
//   exp_name = "bert-baseline"
//   num_epochs = 3
//
//   [model]
//   d_model = 256
//   ...
//   [checkpoint]
//   monitor = "val_acc"
//   mode = "max"
//   predict_with = "last"
//
// Any key missing from the file falls back to its default via
// #[serde(default)], so a config file only has to list what it
// changes. CLI flags are applied on top (see cli::commands).
//
// The whole struct is serialisable: it is written next to the
// checkpoints and attached to every tracker run so a run can be
// reproduced from its artifacts alone.
//
// Reference: Rust Book §5 (Structs), serde / toml documentation

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::NliModelConfig;

/// Project name every tracker run is filed under
pub const DEFAULT_PROJECT: &str = "contradictory-my-dear-watson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory containing train.csv and test.csv
    pub data_dir:      PathBuf,
    /// Working directory for submission.csv, models/ and logs/
    pub current_dir:   PathBuf,
    /// Experiment name; used as the tracker group
    pub exp_name:      String,
    pub project:       String,
    /// 0 = CPU (NdArray backend), >0 = GPU (Wgpu backend)
    pub gpus:          usize,
    pub num_epochs:    usize,
    /// Base seed; fold k is seeded with seed + k
    pub seed:          u64,
    pub n_splits:      usize,
    /// Permute rows (seeded) before cutting folds
    pub shuffle_folds: bool,

    pub model:      ModelOptions,
    pub tokenizer:  TokenizerOptions,
    pub dataloader: DataLoaderOptions,
    pub optimizer:  OptimizerOptions,
    pub checkpoint: CheckpointOptions,
    pub tracking:   TrackingOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir:      PathBuf::from("data"),
            current_dir:   PathBuf::from("outputs"),
            exp_name:      "default".to_string(),
            project:       DEFAULT_PROJECT.to_string(),
            gpus:          0,
            num_epochs:    3,
            seed:          0,
            n_splits:      5,
            shuffle_folds: false,
            model:         ModelOptions::default(),
            tokenizer:     TokenizerOptions::default(),
            dataloader:    DataLoaderOptions::default(),
            optimizer:     OptimizerOptions::default(),
            checkpoint:    CheckpointOptions::default(),
            tracking:      TrackingOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Hidden dimension of the encoder
    pub d_model:    usize,
    /// d_model must be divisible by num_heads
    pub num_heads:  usize,
    pub num_layers: usize,
    /// Inner dimension of the feed-forward network
    pub d_ff:       usize,
    pub dropout:    f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self { d_model: 256, num_heads: 8, num_layers: 6, d_ff: 1024, dropout: 0.1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    /// Embedding rows; the built vocabulary never exceeds this
    pub vocab_size:  usize,
    /// Tokens per pair: [CLS] premise [SEP] hypothesis [SEP] + padding
    pub max_seq_len: usize,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { vocab_size: 30000, max_seq_len: 128 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLoaderOptions {
    pub batch_size:  usize,
    /// Worker threads per loader. With more than one, batches arrive
    /// in whatever order the workers finish, so `seed` no longer
    /// pins down the training order.
    pub num_workers: usize,
}

impl Default for DataLoaderOptions {
    fn default() -> Self {
        Self { batch_size: 16, num_workers: 1 }
    }
}

impl DataLoaderOptions {
    /// True when a fixed seed reproduces the batch order exactly
    pub fn is_deterministic(&self) -> bool {
        self.num_workers <= 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    pub lr: f64,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { lr: 2e-4 }
    }
}

/// Validation metric the checkpointer watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monitor {
    ValAcc,
    ValLoss,
}

/// Whether a larger or a smaller monitored value is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorMode {
    Max,
    Min,
}

/// Which epoch's weights predict the test set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictWith {
    /// Weights after the final epoch
    Last,
    /// Weights of the saved best checkpoint
    Best,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointOptions {
    pub monitor:      Monitor,
    pub mode:         MonitorMode,
    /// The checkpoint file is saved either way; this only picks
    /// the weights whose predictions enter the vote.
    pub predict_with: PredictWith,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            monitor:      Monitor::ValAcc,
            mode:         MonitorMode::Max,
            predict_with: PredictWith::Last,
        }
    }
}

impl CheckpointOptions {
    /// Accuracy should be maximised and loss minimised. Any other
    /// pairing is allowed (it is what the user asked for) but is
    /// almost certainly a mistake.
    pub fn is_consistent(&self) -> bool {
        matches!(
            (self.monitor, self.mode),
            (Monitor::ValAcc, MonitorMode::Max) | (Monitor::ValLoss, MonitorMode::Min)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    /// Write tracker runs under current_dir/logs
    pub enabled:   bool,
    /// Attach each fold's best checkpoint to its run
    pub log_model: bool,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self { enabled: true, log_model: true }
    }
}

impl RunConfig {
    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let cfg: RunConfig = toml::from_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Reject values that would crash or silently misbehave later
    pub fn validate(&self) -> Result<()> {
        ensure!(self.n_splits >= 2, "n_splits must be at least 2 (got {})", self.n_splits);
        ensure!(self.num_epochs >= 1, "num_epochs must be at least 1");
        ensure!(
            self.model.num_heads > 0 && self.model.d_model % self.model.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            self.model.d_model,
            self.model.num_heads
        );
        ensure!(self.model.num_layers >= 1, "num_layers must be at least 1");
        ensure!(
            (0.0..1.0).contains(&self.model.dropout),
            "dropout must be in [0, 1) (got {})",
            self.model.dropout
        );
        ensure!(
            self.tokenizer.max_seq_len >= 4,
            "max_seq_len must leave room for [CLS], two [SEP] and one token"
        );
        ensure!(
            self.tokenizer.vocab_size > crate::infra::tokenizer_store::NUM_SPECIAL_TOKENS,
            "vocab_size must exceed the number of special tokens"
        );
        ensure!(self.dataloader.batch_size >= 1, "batch_size must be at least 1");
        ensure!(self.optimizer.lr > 0.0, "lr must be positive (got {})", self.optimizer.lr);
        ensure!(!self.exp_name.is_empty(), "exp_name must not be empty");
        Ok(())
    }

    /// Architecture config for the model factory
    pub fn model_config(&self) -> NliModelConfig {
        NliModelConfig::new(
            self.tokenizer.vocab_size,
            self.tokenizer.max_seq_len,
            self.model.d_model,
            self.model.num_heads,
            self.model.num_layers,
            self.model.d_ff,
            self.model.dropout,
        )
    }

    pub fn train_csv(&self) -> PathBuf {
        self.data_dir.join("train.csv")
    }

    pub fn test_csv(&self) -> PathBuf {
        self.data_dir.join("test.csv")
    }

    pub fn submission_path(&self) -> PathBuf {
        self.current_dir.join("submission.csv")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.current_dir.join("models")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.current_dir.join("logs")
    }

    /// JSON snapshot attached to tracker runs
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: RunConfig = toml::from_str(
            r#"
            exp_name = "xlm-large"
            num_epochs = 7

            [model]
            num_layers = 2

            [checkpoint]
            mode = "min"
            "#,
        ).unwrap();
        assert_eq!(cfg.exp_name, "xlm-large");
        assert_eq!(cfg.num_epochs, 7);
        assert_eq!(cfg.model.num_layers, 2);
        assert_eq!(cfg.model.d_model, 256);
        assert_eq!(cfg.checkpoint.monitor, Monitor::ValAcc);
        assert_eq!(cfg.checkpoint.mode, MonitorMode::Min);
        assert_eq!(cfg.checkpoint.predict_with, PredictWith::Last);
        assert_eq!(cfg.n_splits, 5);
    }

    #[test]
    fn test_shipped_configs_load_and_validate() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
        for name in ["kaggle-gpu.toml", "cpu-debug.toml"] {
            let cfg = RunConfig::load(&dir.join(name)).unwrap();
            cfg.validate().unwrap();
        }
        let debug = RunConfig::load(&dir.join("cpu-debug.toml")).unwrap();
        assert_eq!(debug.gpus, 0);
        assert!(!debug.tracking.log_model);
        assert!(debug.tracking.enabled);

        let gpu = RunConfig::load(&dir.join("kaggle-gpu.toml")).unwrap();
        assert!(gpu.dataloader.is_deterministic());
    }

    #[test]
    fn test_predict_with_best_parses() {
        let cfg: RunConfig = toml::from_str("[checkpoint]\npredict_with = \"best\"\n").unwrap();
        assert_eq!(cfg.checkpoint.predict_with, PredictWith::Best);
        assert_eq!(cfg.checkpoint.monitor, Monitor::ValAcc);
    }

    #[test]
    fn test_worker_count_decides_determinism() {
        let mut opts = DataLoaderOptions::default();
        assert!(opts.is_deterministic());
        opts.num_workers = 4;
        assert!(!opts.is_deterministic());
    }

    #[test]
    fn test_rejects_indivisible_heads() {
        let mut cfg = RunConfig::default();
        cfg.model.d_model   = 100;
        cfg.model.num_heads = 8;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_single_split() {
        let cfg = RunConfig { n_splits: 1, ..RunConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_checkpoint_pairing() {
        let acc_min = CheckpointOptions { mode: MonitorMode::Min, ..CheckpointOptions::default() };
        let loss_min = CheckpointOptions {
            monitor: Monitor::ValLoss,
            mode:    MonitorMode::Min,
            ..CheckpointOptions::default()
        };
        assert!(!acc_min.is_consistent());
        assert!(loss_min.is_consistent());
        assert!(CheckpointOptions::default().is_consistent());
    }

    #[test]
    fn test_paths_hang_off_configured_dirs() {
        let cfg = RunConfig {
            data_dir:    PathBuf::from("/data"),
            current_dir: PathBuf::from("/work"),
            ..RunConfig::default()
        };
        assert_eq!(cfg.train_csv(), PathBuf::from("/data/train.csv"));
        assert_eq!(cfg.submission_path(), PathBuf::from("/work/submission.csv"));
        assert_eq!(cfg.models_dir(), PathBuf::from("/work/models"));
    }
}
