// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fits one fold's model with Adam, validating after every epoch.
// The best epoch by the configured monitor / mode is saved as a
// checkpoint file. The weights handed back for test prediction
// are chosen separately by `checkpoint.predict_with`: the final
// epoch's (default) or the saved best.
//
// Key Burn insight:
//   - Training uses an AutodiffBackend B for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - Validation batcher therefore uses B::InnerBackend too
//   - argmax(1) returns [batch, 1]; flatten before .equal()
//
// Logged per optimiser step:  train/loss_step, lr-Adam
// Logged per epoch:           train/loss_epoch, val/loss_epoch,
//                             val/acc_epoch, epoch
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{path::PathBuf, sync::Arc};

use crate::application::run_config::{Monitor, PredictWith, RunConfig};
use crate::data::{
    batcher::{NliBatch, NliBatcher},
    dataset::NliDataset,
};
use crate::domain::traits::ExperimentTracker;
use crate::infra::{
    checkpoint::{BestScore, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::NliModel;

/// Everything the loop writes to, besides the model itself
pub struct FitContext<'a> {
    pub cfg:         &'a RunConfig,
    pub fold_index:  usize,
    pub checkpoints: &'a mut CheckpointManager,
    pub metrics:     &'a MetricsLogger,
    pub tracker:     &'a mut dyn ExperimentTracker,
}

/// The selected weights of a finished fit
pub struct FitOutcome<B: Backend> {
    /// Weights for test prediction
    pub model:         NliModel<B>,
    /// Epoch those weights come from
    pub weights_epoch: usize,
    /// 0 when no epoch ever improved
    pub best_epoch:    usize,
    pub best_score:    Option<f64>,
    pub checkpoint:    Option<PathBuf>,
}

/// Keeps the weights that should leave the fit loop.
/// Generic over the weights so the choice is testable on its own.
pub struct WeightSelector<M> {
    predict_with: PredictWith,
    chosen:       Option<(M, usize)>,
}

impl<M> WeightSelector<M> {
    pub fn new(predict_with: PredictWith) -> Self {
        Self { predict_with, chosen: None }
    }

    /// Offer the weights after `epoch`; `improved` is whether that
    /// epoch became the new best checkpoint.
    pub fn offer(&mut self, weights: M, epoch: usize, improved: bool) {
        let keep = match self.predict_with {
            PredictWith::Last => true,
            PredictWith::Best => improved,
        };
        if keep {
            self.chosen = Some((weights, epoch));
        }
    }

    pub fn into_chosen(self) -> Option<(M, usize)> {
        self.chosen
    }
}

pub fn fit<B: AutodiffBackend>(
    mut ctx:   FitContext<'_>,
    mut model: NliModel<B>,
    train:     NliDataset,
    val:       NliDataset,
    device:    &B::Device,
) -> Result<FitOutcome<B::InnerBackend>> {
    let cfg = ctx.cfg;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, NliModel<B>>();
    let lr = cfg.optimizer.lr;

    let train_loader = DataLoaderBuilder::new(NliBatcher::<B>::new(device.clone()))
        .batch_size(cfg.dataloader.batch_size)
        .shuffle(cfg.seed.wrapping_add(ctx.fold_index as u64))
        .num_workers(cfg.dataloader.num_workers)
        .build(train);

    // Validation on the inner backend: no autodiff graph
    let val_loader = DataLoaderBuilder::new(NliBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.dataloader.batch_size)
        .num_workers(cfg.dataloader.num_workers)
        .build(val);

    let mut best_score = BestScore::new(cfg.checkpoint.mode);
    let mut best_epoch = 0usize;
    let mut selector   = WeightSelector::new(cfg.checkpoint.predict_with);
    let mut step = 0usize;

    for epoch in 1..=cfg.num_epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let output   = model.forward_classification(batch);
            let loss_val = output.loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;
            step           += 1;

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            ctx.tracker
                .log_metrics(step, &[("train/loss_step", loss_val), ("lr-Adam", lr)])?;
        }

        let train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let (val_loss, val_acc) = evaluate(&model_valid, &val_loader);

        let metrics = EpochMetrics { epoch, train_loss, val_loss, val_acc };
        ctx.metrics.log(&metrics)?;
        ctx.tracker.log_metrics(step, &[
            ("train/loss_epoch", train_loss),
            ("val/loss_epoch", val_loss),
            ("val/acc_epoch", val_acc),
            ("epoch", epoch as f64),
        ])?;

        println!(
            "Fold {} | Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            ctx.fold_index, epoch, cfg.num_epochs, train_loss, val_loss, val_acc * 100.0,
        );

        // ── Best-checkpoint selection ─────────────────────────────────────────
        let score = match cfg.checkpoint.monitor {
            Monitor::ValAcc  => val_acc,
            Monitor::ValLoss => val_loss,
        };
        let improved = best_score.update(score);
        if improved {
            ctx.checkpoints.save_best(&model_valid, epoch, score)?;
            tracing::info!("Fold {}: new best {:?} = {:.4} at epoch {}",
                ctx.fold_index, cfg.checkpoint.monitor, score, epoch);
            best_epoch = epoch;
        }
        selector.offer(model_valid, epoch, improved);
    }

    let (model, weights_epoch) = match selector.into_chosen() {
        Some(chosen) => chosen,
        None => {
            tracing::warn!(
                "Fold {}: monitored metric never produced a checkpoint; using final weights",
                ctx.fold_index
            );
            (model.valid(), cfg.num_epochs)
        }
    };
    tracing::info!("Fold {}: predicting with epoch {} weights", ctx.fold_index, weights_epoch);

    Ok(FitOutcome {
        model,
        weights_epoch,
        best_epoch,
        best_score: best_score.best(),
        checkpoint: ctx.checkpoints.best_path().map(|p| p.to_path_buf()),
    })
}

/// Mean loss and accuracy of `model` over every validation batch.
/// Returns (NaN, 0.0) for an empty loader.
pub fn evaluate<B: Backend>(
    model:  &NliModel<B>,
    loader: &Arc<dyn DataLoader<NliBatch<B>>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let labels = batch.labels.clone();
        let output = model.forward_classification(batch);

        loss_sum += output.loss.into_scalar().elem::<f64>();
        batches  += 1;
        total    += labels.dims()[0];

        let hits: i64 = output
            .logits
            .argmax(1)
            .flatten::<1>(0, 1)
            .equal(labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        correct += hits as usize;
    }

    let loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    let acc  = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    (loss, acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::NliSample;
    use crate::domain::label::Label;
    use crate::infra::tracker::NoopTracker;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    type TestBackend = Autodiff<NdArray<f32>>;

    /// Replays a validation curve that peaks at epoch 1
    fn replay(predict_with: PredictWith) -> Option<(&'static str, usize)> {
        let curve = [("epoch-1", 0.6), ("epoch-2", 0.4), ("epoch-3", 0.5)];
        let mut best     = BestScore::new(crate::application::run_config::MonitorMode::Max);
        let mut selector = WeightSelector::new(predict_with);
        for (i, (weights, acc)) in curve.into_iter().enumerate() {
            let improved = best.update(acc);
            selector.offer(weights, i + 1, improved);
        }
        selector.into_chosen()
    }

    #[test]
    fn test_last_weights_survive_a_worse_final_epoch() {
        assert_eq!(replay(PredictWith::Last), Some(("epoch-3", 3)));
    }

    #[test]
    fn test_best_weights_when_requested() {
        assert_eq!(replay(PredictWith::Best), Some(("epoch-1", 1)));
    }

    #[test]
    fn test_best_selector_without_improvement_is_empty() {
        let mut selector = WeightSelector::new(PredictWith::Best);
        selector.offer("epoch-1", 1, false);
        assert!(selector.into_chosen().is_none());
    }

    fn samples(n: usize) -> NliDataset {
        let items = (0..n)
            .map(|i| NliSample {
                input_ids:      vec![2, 5 + (i % 10) as u32, 3, 6, 3, 0],
                token_type_ids: vec![0, 0, 0, 1, 1, 0],
                attention_mask: vec![1, 1, 1, 1, 1, 0],
                label:          Some(Label::ALL[i % Label::COUNT]),
            })
            .collect();
        NliDataset::new(items)
    }

    fn tiny_config(predict_with: PredictWith) -> RunConfig {
        let mut cfg = RunConfig { num_epochs: 3, ..RunConfig::default() };
        cfg.model.d_model    = 8;
        cfg.model.num_heads  = 2;
        cfg.model.num_layers = 1;
        cfg.model.d_ff       = 16;
        cfg.model.dropout    = 0.0;
        cfg.tokenizer.vocab_size  = 20;
        cfg.tokenizer.max_seq_len = 6;
        cfg.dataloader.batch_size = 4;
        cfg.checkpoint.predict_with = predict_with;
        cfg
    }

    fn run_fit(cfg: &RunConfig, dir: &std::path::Path) -> FitOutcome<NdArray<f32>> {
        let device = Default::default();
        let mut checkpoints = CheckpointManager::new(dir.join("models"), 0, cfg.checkpoint.monitor).unwrap();
        let metrics = MetricsLogger::create(&dir.join("logs")).unwrap();
        let mut tracker = NoopTracker;
        let ctx = FitContext {
            cfg,
            fold_index:  0,
            checkpoints: &mut checkpoints,
            metrics:     &metrics,
            tracker:     &mut tracker,
        };
        let model = cfg.model_config().init::<TestBackend>(&device);
        fit::<TestBackend>(ctx, model, samples(12), samples(6), &device).unwrap()
    }

    #[test]
    fn test_fit_predicts_with_final_epoch_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(PredictWith::Last);
        let outcome = run_fit(&cfg, dir.path());

        assert_eq!(outcome.weights_epoch, 3);
        assert!((1..=3).contains(&outcome.best_epoch));
        // the best epoch is still saved as the checkpoint file
        assert!(outcome.checkpoint.as_ref().unwrap().exists());

        let csv = fs::read_to_string(dir.path().join("logs/metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_fit_predicts_with_best_epoch_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(PredictWith::Best);
        let outcome = run_fit(&cfg, dir.path());

        assert_eq!(outcome.weights_epoch, outcome.best_epoch);
        let stem = outcome.checkpoint.unwrap();
        let name = stem.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&format!("nli_epoch={}-", outcome.best_epoch)));
    }
}
