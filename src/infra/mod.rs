// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs       - best-checkpoint selection and saving
//                         (Burn CompactRecorder), run config JSON
//
//   tokenizer_store.rs  - builds and saves the per-fold
//                         word-level tokenizer
//
//   metrics.rs          - per-fold epoch metrics CSV
//
//   tracker.rs          - filesystem experiment tracker
//
//   submission_store.rs - id,prediction CSV reading / writing
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model checkpoint saving
pub mod checkpoint;

/// Tokenizer building and saving
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Local experiment tracker
pub mod tracker;

/// Submission CSV files
pub mod submission_store;
