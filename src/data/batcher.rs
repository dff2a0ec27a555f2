// ============================================================
// Layer 4 - NLI Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<NliSample>
// into device tensors.
//
// How batching works here:
//   Input:  Vec of N NliSamples, each with sequences of length S
//   Output: NliBatch with tensors of shape [N, S] (labels: [N])
//
//   All sequences are pre-padded to max_seq_len by the encoder,
//   so we flatten row after row and reshape:
//   [s1_t1, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// Test samples have no label; they get class 0 as a placeholder
// so train, validation and test batches share one type. The
// predictor never reads the labels tensor.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::NliSample;

#[derive(Debug, Clone)]
pub struct NliBatch<B: Backend> {
    /// Token ids: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Segment ids, 0 = premise, 1 = hypothesis: [batch_size, seq_len]
    pub token_type_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class index per sample: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct NliBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> NliBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack(&self, rows: Vec<i32>, batch_size: usize, seq_len: usize) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(rows.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<NliSample, NliBatch<B>> for NliBatcher<B> {
    fn batch(&self, items: Vec<NliSample>) -> NliBatch<B> {
        let batch_size = items.len();
        let seq_len    = items[0].input_ids.len();

        let input_ids      = self.stack(flatten(&items, |s| s.input_ids.as_slice()), batch_size, seq_len);
        let token_type_ids = self.stack(flatten(&items, |s| s.token_type_ids.as_slice()), batch_size, seq_len);
        let attention_mask = self.stack(flatten(&items, |s| s.attention_mask.as_slice()), batch_size, seq_len);

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label.map_or(0, |l| l.index() as i32))
            .collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        NliBatch { input_ids, token_type_ids, attention_mask, labels }
    }
}

/// Concatenate one per-sample sequence field across the batch
fn flatten(items: &[NliSample], field: impl Fn(&NliSample) -> &[u32]) -> Vec<i32> {
    items
        .iter()
        .flat_map(|s| field(s).iter().map(|&x| x as i32))
        .collect()
}
