// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from CSV files to device-ready tensor batches.
//
//   train.csv / test.csv
//       │
//       ▼
//   CsvTableLoader    → reads rows into Vec<NliRow>
//       │
//       ▼
//   KFold             → train/validation index lists per fold
//       │
//       ▼
//   Preprocessor      → cleans premise / hypothesis text
//       │
//       ▼
//   PairEncoder       → [CLS] p [SEP] h [SEP] token ids + masks
//       │
//       ▼
//   NliDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   NliBatcher        → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads train.csv / test.csv
pub mod loader;

/// Splits row indices into K train/validation folds
pub mod kfold;

/// Cleans raw premise / hypothesis text
pub mod preprocessor;

/// Tokenises sentence pairs into fixed-length samples
pub mod encoder;

/// Implements Burn's Dataset trait for NLI samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
