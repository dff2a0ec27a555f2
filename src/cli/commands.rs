// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `aggregate`, and
// their flags.
//
// `train` starts from a TOML config file (or the built-in
// defaults when --config is omitted) and lets any top-level
// option be overridden from the command line:
//
//   watson-kfold train --config configs/kaggle-gpu.toml --num-epochs 1
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::run_config::RunConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train K fold models and write the majority-vote submission
    Train(TrainArgs),

    /// Majority-vote existing submission CSV files into one
    Aggregate(AggregateArgs),
}

/// All arguments for the `train` command.
/// Every option left unset keeps the value from the config file.
#[derive(Args, Debug, Default)]
pub struct TrainArgs {
    /// TOML run config; defaults are used for anything it omits
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory containing train.csv and test.csv
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Working directory for submission.csv, models/ and logs/
    #[arg(long)]
    pub current_dir: Option<PathBuf>,

    /// Experiment name (tracker group)
    #[arg(long)]
    pub exp_name: Option<String>,

    /// 0 trains on the CPU
    #[arg(long)]
    pub gpus: Option<usize>,

    #[arg(long)]
    pub num_epochs: Option<usize>,

    /// Base seed; fold k uses seed + k
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of folds (K)
    #[arg(long)]
    pub n_splits: Option<usize>,

    /// Shuffle rows with the seed before cutting folds
    #[arg(long)]
    pub shuffle_folds: bool,

    /// Do not write tracker runs under logs/
    #[arg(long)]
    pub no_tracking: bool,
}

impl TrainArgs {
    /// Load the config file (if any) and apply the flag overrides.
    /// The application layer only ever sees the resulting RunConfig.
    pub fn resolve(self) -> Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None       => RunConfig::default(),
        };

        if let Some(v) = self.data_dir    { cfg.data_dir    = v; }
        if let Some(v) = self.current_dir { cfg.current_dir = v; }
        if let Some(v) = self.exp_name    { cfg.exp_name    = v; }
        if let Some(v) = self.gpus        { cfg.gpus        = v; }
        if let Some(v) = self.num_epochs  { cfg.num_epochs  = v; }
        if let Some(v) = self.seed        { cfg.seed        = v; }
        if let Some(v) = self.n_splits    { cfg.n_splits    = v; }
        if self.shuffle_folds { cfg.shuffle_folds    = true; }
        if self.no_tracking   { cfg.tracking.enabled = false; }

        Ok(cfg)
    }
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Submission CSV files to vote over
    #[arg(long, num_args = 1.., required = true)]
    pub inputs: Vec<PathBuf>,

    /// Where to write the merged submission
    #[arg(long, default_value = "submission.csv")]
    pub output: PathBuf,
}
