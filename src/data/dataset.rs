use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

/// One tokenised, padded sentence pair.
/// Layout: [CLS] premise [SEP] hypothesis [SEP] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NliSample {
    pub input_ids:      Vec<u32>,
    pub token_type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    /// None for test rows
    pub label:          Option<Label>,
}

pub struct NliDataset {
    samples: Vec<NliSample>,
}

impl NliDataset {
    pub fn new(samples: Vec<NliSample>) -> Self { Self { samples } }
}

impl Dataset<NliSample> for NliDataset {
    fn get(&self, index: usize) -> Option<NliSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
