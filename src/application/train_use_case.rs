// ============================================================
// Layer 2 - KFoldUseCase (Fold Orchestrator)
// ============================================================
// Runs the whole cross-validation pipeline in order:
//
//   Step 1: Validate config, pick backend     (Layer 2 / 5)
//   Step 2: Load train.csv and test.csv       (Layer 4 - data)
//   Step 3: Save the resolved config          (Layer 6 - infra)
//   Step 4: Split training rows into K folds  (Layer 4 - data)
//   Step 5: Train each fold, in order         (Layer 2 - fold_trainer)
//   Step 6: Majority-vote the fold outputs    (Layer 3 - domain)
//   Step 7: Write the final submission.csv    (Layer 6 - infra)
//   Step 8: Upload it in a final tracker run  (Layer 6 - infra)
//
// Folds run strictly one after another: they share
// submission.csv, the models/ directory and a single tracker
// that allows only one active run. Each fold's predictions are
// collected in fold order before voting.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice},
    tensor::backend::AutodiffBackend,
};

use crate::application::{fold_trainer::train_fold, run_config::RunConfig};
use crate::data::{kfold::KFold, loader::CsvTableLoader};
use crate::domain::{
    submission::Submission,
    traits::{ExperimentTracker, RunSpec},
    vote::most_frequent_prediction,
};
use crate::infra::{
    checkpoint::save_run_config,
    submission_store::write_submission,
    tracker::{LocalTracker, NoopTracker},
};
use crate::ml::{CpuBackend, GpuBackend};

pub const FINAL_JOB_TYPE: &str = "save final prediction";

pub struct KFoldUseCase {
    config: RunConfig,
}

impl KFoldUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run with the tracker selected by the config
    pub fn execute(&self) -> Result<Submission> {
        if self.config.tracking.enabled {
            let mut tracker = LocalTracker::new(self.config.logs_dir());
            self.execute_with(&mut tracker)
        } else {
            self.execute_with(&mut NoopTracker)
        }
    }

    /// Run the full pipeline, reporting to `tracker`
    pub fn execute_with(&self, tracker: &mut dyn ExperimentTracker) -> Result<Submission> {
        let cfg = &self.config;

        // ── Step 1: Validate and choose backend ──────────────────────────────
        cfg.validate()?;
        if !cfg.checkpoint.is_consistent() {
            tracing::warn!(
                "Checkpoint monitor {:?} is paired with mode {:?}; the 'best' checkpoint \
                 will be the worst-scoring one by that metric",
                cfg.checkpoint.monitor,
                cfg.checkpoint.mode
            );
        }
        if !cfg.dataloader.is_deterministic() {
            tracing::warn!(
                "num_workers = {}: batch order depends on thread timing, so this run \
                 is not reproducible from its seed",
                cfg.dataloader.num_workers
            );
        }

        match cfg.gpus {
            0 => {
                tracing::info!("Using CPU (NdArray) backend");
                self.run::<CpuBackend>(NdArrayDevice::Cpu, tracker)
            }
            n => {
                if n > 1 {
                    tracing::warn!("{n} GPUs requested; training uses a single device");
                }
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.run::<GpuBackend>(device, tracker)
            }
        }
    }

    fn run<B: AutodiffBackend>(
        &self,
        device:  B::Device,
        tracker: &mut dyn ExperimentTracker,
    ) -> Result<Submission> {
        let cfg = &self.config;

        // ── Step 2: Load tables ───────────────────────────────────────────────
        let train_rows = CsvTableLoader::train().load(&cfg.train_csv())?;
        let test_rows  = CsvTableLoader::test().load(&cfg.test_csv())?;

        // ── Step 3: Save config for reproducibility ──────────────────────────
        save_run_config(&cfg.models_dir(), cfg)?;

        // ── Step 4: Fold assignment ───────────────────────────────────────────
        let mut splitter = KFold::new(cfg.n_splits)?;
        if cfg.shuffle_folds {
            splitter = splitter.with_shuffle(cfg.seed);
        }
        let folds = splitter.split(train_rows.len())?;

        // ── Step 5: Sequential per-fold training ─────────────────────────────
        let mut predictions = Vec::with_capacity(folds.len());
        for fold in &folds {
            tracing::info!("===== Fold {}/{} =====", fold.index + 1, folds.len());
            let fold_submission =
                train_fold::<B>(cfg, fold, &train_rows, &test_rows, tracker, &device)?;
            predictions.push(fold_submission);
        }

        // ── Step 6: Majority vote ─────────────────────────────────────────────
        let final_submission = most_frequent_prediction(&predictions)?;
        tracing::info!("Final predictions: {}", final_submission.class_summary());

        // ── Step 7: Persist ───────────────────────────────────────────────────
        let path = cfg.submission_path();
        write_submission(&path, &final_submission)?;

        // ── Step 8: Upload merged predictions ─────────────────────────────────
        tracker.init(
            RunSpec::new(&cfg.project, &cfg.exp_name, FINAL_JOB_TYPE)
                .with_name("final")
                .with_config(cfg.to_json()),
        )?;
        tracker.save(&path)?;
        tracker.finish()?;

        tracing::info!("Final submission written to '{}'", path.display());
        Ok(final_submission)
    }
}
