// ============================================================
// Layer 3 - NliRow Domain Type
// ============================================================
// One example of the text-pair classification task:
//
//   premise:    "He came, he opened the door and I remember..."
//   hypothesis: "I remember the door opening."
//   label:      0 (entailment)
//
// Training rows carry a label; test rows do not, so the field
// is an Option. The language columns are informational only
// (the data is multilingual) and may be missing from the CSV.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NliRow {
    /// Unique row identifier, echoed into the submission file
    pub id: String,

    pub premise: String,

    pub hypothesis: String,

    /// Two-letter language code, e.g. "en", "fr"
    #[serde(default)]
    pub lang_abv: Option<String>,

    /// Full language name, e.g. "English"
    #[serde(default)]
    pub language: Option<String>,

    /// Ground truth class; None for test rows
    #[serde(default)]
    pub label: Option<Label>,
}

impl NliRow {
    pub fn new(
        id:         impl Into<String>,
        premise:    impl Into<String>,
        hypothesis: impl Into<String>,
        label:      Option<Label>,
    ) -> Self {
        Self {
            id:         id.into(),
            premise:    premise.into(),
            hypothesis: hypothesis.into(),
            lang_abv:   None,
            language:   None,
            label,
        }
    }
}

/// Pick rows by position, in the order the indices are given.
/// Equivalent to positional indexing followed by an index reset:
/// the returned Vec is a fresh, densely indexed table.
pub fn select_rows(rows: &[NliRow], indices: &[usize]) -> Vec<NliRow> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}
