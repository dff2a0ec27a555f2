// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: this layer tells the data, ml and
// infra layers what to do, in which order, and with which
// configuration. No model math and no terminal output here.
//
//   run_config       ← typed, validated options for a run
//   fold_trainer     ← one fold: fit, checkpoint, predict
//   train_use_case   ← K folds in sequence, then the vote
//   aggregate_use_case ← vote over existing submission files
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

pub mod run_config;

pub mod fold_trainer;

// The k-fold training workflow
pub mod train_use_case;

// Stand-alone majority vote over submission CSVs
pub mod aggregate_use_case;
