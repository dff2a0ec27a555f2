// ============================================================
// Layer 5 - Test-Set Predictor
// ============================================================
// Runs the selected weights over the encoded test rows and
// returns one class per row, in row order.
//
// Batches are cut sequentially from the sample slice instead of
// going through a (possibly multi-worker) DataLoader, so the
// output order is guaranteed to match the test table.

use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::NliBatcher, dataset::NliSample};
use crate::domain::label::Label;
use crate::ml::model::NliModel;

pub struct Predictor<B: Backend> {
    model:      NliModel<B>,
    batcher:    NliBatcher<B>,
    batch_size: usize,
}

impl<B: Backend> Predictor<B> {
    pub fn new(model: NliModel<B>, device: B::Device, batch_size: usize) -> Self {
        Self { model, batcher: NliBatcher::new(device), batch_size: batch_size.max(1) }
    }

    pub fn predict(&self, samples: &[NliSample]) -> Result<Vec<Label>> {
        let mut predictions = Vec::with_capacity(samples.len());

        for chunk in samples.chunks(self.batch_size) {
            let batch  = self.batcher.batch(chunk.to_vec());
            let logits = self.model.forward_batch(batch);
            let classes = logits.argmax(1).flatten::<1>(0, 1).into_data();

            for class in classes.iter::<i64>() {
                predictions.push(Label::from_index(class as usize)?);
            }
        }

        tracing::debug!("Predicted {} test rows", predictions.len());
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::NliModelConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_one_prediction_per_sample_across_batches() {
        let model = NliModelConfig::new(20, 6, 8, 2, 1, 16, 0.0)
            .init::<TestBackend>(&Default::default());
        let sample = NliSample {
            input_ids:      vec![2, 5, 3, 6, 3, 0],
            token_type_ids: vec![0, 0, 0, 1, 1, 0],
            attention_mask: vec![1, 1, 1, 1, 1, 0],
            label:          None,
        };
        let predictor = Predictor::new(model, Default::default(), 2);
        let preds = predictor.predict(&vec![sample; 5]).unwrap();
        assert_eq!(preds.len(), 5);
        // identical inputs, deterministic eval model → identical classes
        assert!(preds.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_empty_input() {
        let model = NliModelConfig::new(20, 6, 8, 2, 1, 16, 0.0)
            .init::<TestBackend>(&Default::default());
        let predictor = Predictor::new(model, Default::default(), 4);
        assert!(predictor.predict(&[]).unwrap().is_empty());
    }
}
