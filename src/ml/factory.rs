// ============================================================
// Layer 5 - Model Factory
// ============================================================
// Builds a fresh (model, tokenizer) pair for one fold.
//
// The tokenizer vocabulary comes from the fold's own training
// rows only, so validation and test text is never seen while
// building it. It is saved to models/fold={k}/tokenizer.json
// next to that fold's checkpoint.
//
// The model is freshly initialised every time: folds share no
// weights, which keeps their test predictions independent votes
// for the final majority.

use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::application::run_config::RunConfig;
use crate::data::preprocessor::Preprocessor;
use crate::domain::nli_pair::NliRow;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::model::NliModel;

pub struct ModelFactory<'a> {
    cfg: &'a RunConfig,
}

impl<'a> ModelFactory<'a> {
    pub fn new(cfg: &'a RunConfig) -> Self {
        Self { cfg }
    }

    pub fn build<B: Backend>(
        &self,
        fold_index: usize,
        train_rows: &[NliRow],
        device:     &B::Device,
    ) -> Result<(NliModel<B>, Tokenizer)> {
        let store     = TokenizerStore::new(self.cfg.models_dir().join(format!("fold={fold_index}")));
        let tokenizer = store.build(&training_corpus(train_rows), self.cfg.tokenizer.vocab_size)?;

        let model: NliModel<B> = self.cfg.model_config().init(device);
        tracing::info!(
            "Fold {}: fresh model with {} layers, d_model={}, {} parameters",
            fold_index,
            self.cfg.model.num_layers,
            self.cfg.model.d_model,
            model.num_params()
        );
        Ok((model, tokenizer))
    }
}

/// Cleaned premise and hypothesis texts of every row
fn training_corpus(rows: &[NliRow]) -> Vec<String> {
    let prep = Preprocessor::new();
    rows.iter()
        .flat_map(|r| {
            let (p, h) = prep.clean_pair(r);
            [p, h]
        })
        .collect()
}
