// ============================================================
// Layer 2 - Per-Fold Trainer
// ============================================================
// Trains one fold and returns its test-set predictions:
//
//   Step 1: Seed the backend for this fold          (Layer 5)
//   Step 2: Fresh model + fold tokenizer            (Layer 5)
//   Step 3: Encode train / validation / test rows   (Layer 4)
//   Step 4: Open the fold's tracker run             (Layer 6)
//   Step 5: Fit, keeping the best checkpoint        (Layer 5)
//   Step 6: Predict test rows, write submission.csv (Layer 5/6)
//   Step 7: Attach the best checkpoint to the run   (Layer 6)
//   Step 8: Close the tracker run                   (Layer 6)
//
// The predictions are handed back in memory. submission.csv is
// still overwritten every fold (it is the externally visible
// per-fold output), but nothing reads it back.
//
// Any error aborts the fold and, through `?`, the whole run.

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::run_config::RunConfig;
use crate::data::{dataset::NliDataset, encoder::PairEncoder, kfold::Fold};
use crate::domain::{
    nli_pair::{select_rows, NliRow},
    submission::Submission,
    traits::{ExperimentTracker, RunSpec},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    submission_store::write_submission,
};
use crate::ml::{
    factory::ModelFactory,
    predictor::Predictor,
    trainer::{fit, FitContext},
};

pub const FOLD_JOB_TYPE: &str = "k-fold training";

pub fn train_fold<B: AutodiffBackend>(
    cfg:       &RunConfig,
    fold:      &Fold,
    all_train: &[NliRow],
    test_rows: &[NliRow],
    tracker:   &mut dyn ExperimentTracker,
    device:    &B::Device,
) -> Result<Submission> {
    let k = fold.index;

    // ── Step 1: Seed ──────────────────────────────────────────────────────────
    B::seed(cfg.seed.wrapping_add(k as u64));

    // ── Step 2: Fresh model and tokenizer ────────────────────────────────────
    let train_rows = select_rows(all_train, &fold.train_indices);
    let val_rows   = select_rows(all_train, &fold.val_indices);
    let (model, tokenizer) = ModelFactory::new(cfg).build::<B>(k, &train_rows, device)?;

    // ── Step 3: Encode ────────────────────────────────────────────────────────
    let encoder      = PairEncoder::new(&tokenizer, cfg.tokenizer.max_seq_len);
    let train_set    = NliDataset::new(encoder.encode_all(&train_rows)?);
    let val_set      = NliDataset::new(encoder.encode_all(&val_rows)?);
    let test_samples = encoder.encode_all(test_rows)?;
    tracing::info!(
        "Fold {}: {} train, {} validation, {} test rows",
        k, train_rows.len(), val_rows.len(), test_samples.len()
    );

    // ── Step 4: Tracker run ───────────────────────────────────────────────────
    tracker.init(
        RunSpec::new(&cfg.project, &cfg.exp_name, FOLD_JOB_TYPE)
            .with_name(format!("fold={k}"))
            .with_config(cfg.to_json()),
    )?;

    // ── Step 5: Fit ───────────────────────────────────────────────────────────
    let mut checkpoints = CheckpointManager::new(cfg.models_dir(), k, cfg.checkpoint.monitor)?;
    let metrics = MetricsLogger::create(&cfg.logs_dir().join(format!("fold={k}")))?;
    let ctx = FitContext {
        cfg,
        fold_index:  k,
        checkpoints: &mut checkpoints,
        metrics:     &metrics,
        tracker:     &mut *tracker,
    };
    let outcome = fit::<B>(ctx, model, train_set, val_set, device)?;
    tracing::info!(
        "Fold {}: best epoch {} ({:?} = {:?}), predicting with epoch {}",
        k, outcome.best_epoch, cfg.checkpoint.monitor, outcome.best_score, outcome.weights_epoch
    );

    // ── Step 6: Predict ───────────────────────────────────────────────────────
    let predictor = Predictor::<B::InnerBackend>::new(
        outcome.model,
        device.clone(),
        cfg.dataloader.batch_size,
    );
    let predictions = predictor.predict(&test_samples)?;
    let ids         = test_rows.iter().map(|r| r.id.clone()).collect();
    let submission  = Submission::from_predictions(ids, predictions)?;
    write_submission(&cfg.submission_path(), &submission)?;
    tracing::info!("Fold {}: {}", k, submission.class_summary());

    // ── Step 7: Model artifact ────────────────────────────────────────────────
    if cfg.tracking.log_model {
        if let Some(path) = &outcome.checkpoint {
            tracker.save(path)?;
        }
    }

    // ── Step 8: Close run ─────────────────────────────────────────────────────
    tracker.finish()?;

    Ok(submission)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::kfold::KFold;
    use crate::domain::label::Label;
    use crate::infra::{submission_store::read_submission, tracker::NoopTracker};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn rows() -> (Vec<NliRow>, Vec<NliRow>) {
        let pairs = [
            ("the sky is blue", "the sky has a colour"),
            ("a man plays guitar", "nobody plays music"),
            ("she reads a book", "she is outside"),
            ("the dog sleeps", "an animal rests"),
            ("it is raining", "the ground is dry"),
            ("kids play football", "kids are at school"),
        ];
        let train = pairs
            .iter()
            .enumerate()
            .map(|(i, (p, h))| NliRow::new(format!("tr{i}"), *p, *h, Some(Label::ALL[i % 3])))
            .collect();
        let test = vec![
            NliRow::new("te0", "the sky is grey", "the sky has a colour", None),
            NliRow::new("te1", "a dog plays", "nobody plays", None),
        ];
        (train, test)
    }

    fn tiny_config(root: &std::path::Path) -> RunConfig {
        let mut cfg = RunConfig {
            current_dir: root.to_path_buf(),
            num_epochs:  1,
            ..RunConfig::default()
        };
        cfg.model.d_model    = 8;
        cfg.model.num_heads  = 2;
        cfg.model.num_layers = 1;
        cfg.model.d_ff       = 16;
        cfg.model.dropout    = 0.0;
        cfg.tokenizer.vocab_size  = 64;
        cfg.tokenizer.max_seq_len = 16;
        cfg.dataloader.batch_size = 2;
        cfg
    }

    #[test]
    fn test_each_fold_overwrites_submission_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        let (train, test) = rows();
        let folds  = KFold::new(2).unwrap().split(train.len()).unwrap();
        let device = Default::default();

        let stale = Submission::from_predictions(vec!["stale".into()], vec![Label::Neutral]).unwrap();

        for fold in &folds {
            write_submission(&cfg.submission_path(), &stale).unwrap();
            let submission =
                train_fold::<TestBackend>(&cfg, fold, &train, &test, &mut NoopTracker, &device)
                    .unwrap();

            assert_eq!(submission.ids().collect::<Vec<_>>(), vec!["te0", "te1"]);
            assert_eq!(read_submission(&cfg.submission_path()).unwrap(), submission);
        }
    }

    #[test]
    fn test_fold_artifacts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        let (train, test) = rows();
        let folds = KFold::new(3).unwrap().split(train.len()).unwrap();

        train_fold::<TestBackend>(&cfg, &folds[2], &train, &test, &mut NoopTracker, &Default::default())
            .unwrap();

        assert!(cfg.models_dir().join("fold=2/tokenizer.json").exists());
        assert!(cfg.logs_dir().join("fold=2/metrics.csv").exists());
    }
}
