use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::data::batcher::NliBatch;
use crate::domain::label::Label;

/// Premise and hypothesis segments
const NUM_SEGMENTS: usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct NliModelConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
}

impl NliModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NliModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let segment_embedding  = EmbeddingConfig::new(NUM_SEGMENTS, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let classifier = LinearConfig::new(self.d_model, Label::COUNT).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        NliModel {
            token_embedding, position_embedding, segment_embedding, layers,
            final_norm, classifier, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// mask_pad: [batch, seq_len], true at padding positions
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct NliModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub segment_embedding:  Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

pub struct NliOutput<B: Backend> {
    /// [batch, 3]
    pub logits: Tensor<B, 2>,
    /// Mean cross-entropy over the batch: [1]
    pub loss:   Tensor<B, 1>,
}

impl<B: Backend> NliModel<B> {
    /// Class logits [batch, 3] read off the [CLS] position.
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        token_type_ids: Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);

        let emb = self.token_embedding.forward(input_ids)
            + self.position_embedding.forward(positions)
            + self.segment_embedding.forward(token_type_ids);

        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(emb);
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        let [_, _, d_model] = x.dims();
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);

        self.classifier.forward(cls)
    }

    pub fn forward_batch(&self, batch: NliBatch<B>) -> Tensor<B, 2> {
        self.forward(batch.input_ids, batch.token_type_ids, batch.attention_mask)
    }

    pub fn forward_classification(&self, batch: NliBatch<B>) -> NliOutput<B> {
        let labels = batch.labels.clone();
        let logits = self.forward_batch(batch);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        NliOutput { logits, loss }
    }
}
