// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All Burn model and optimisation code lives here:
//
//   model.rs     - BERT-style pair encoder with a 3-way
//                  classification head on [CLS]
//
//   factory.rs   - fresh (model, tokenizer) pair per fold
//
//   trainer.rs   - the fit loop: Adam steps, per-epoch
//                  validation, best-checkpoint selection
//
//   predictor.rs - batched test-set inference in row order
//
// The backend is chosen once per run from the `gpus` option:
// CPU runs use NdArray, GPU runs use Wgpu. Everything below is
// generic over the backend, so tests run on NdArray.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT

use burn::backend::{Autodiff, NdArray, Wgpu};

/// Training backend for `gpus = 0`
pub type CpuBackend = Autodiff<NdArray<f32>>;

/// Training backend for `gpus > 0`
pub type GpuBackend = Autodiff<Wgpu>;

/// Pair encoder architecture
pub mod model;

/// Fresh model + tokenizer per fold
pub mod factory;

/// Fit loop with validation and checkpointing
pub mod trainer;

/// Test-set inference
pub mod predictor;
