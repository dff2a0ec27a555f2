// ============================================================
// Layer 4 - CSV Table Loader
// ============================================================
// Reads the competition tables into memory:
//
//   train.csv: id,premise,hypothesis,lang_abv,language,label
//   test.csv:  id,premise,hypothesis,lang_abv,language
//
// Each line is deserialised straight into an NliRow by the csv
// crate's serde support; column order in the file does not
// matter, only the header names. The language columns are
// optional. The label column must be present and valid for
// every training row, and is ignored if present in test.csv.
//
// Unlike a document loader, a bad row here is fatal: a missing
// label would silently shrink the fold sizes, so the whole load
// fails and names the offending row.
//
// Reference: csv crate documentation (serde deserialisation)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{collections::BTreeMap, path::Path};

use crate::domain::nli_pair::NliRow;

/// Which table is being read; decides how the label column is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Train,
    Test,
}

/// Loads an NLI table from a CSV file.
pub struct CsvTableLoader {
    kind: TableKind,
}

impl CsvTableLoader {
    pub fn train() -> Self {
        Self { kind: TableKind::Train }
    }

    pub fn test() -> Self {
        Self { kind: TableKind::Test }
    }

    pub fn load(&self, path: &Path) -> Result<Vec<NliRow>> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<NliRow>().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let mut row = record.with_context(|| {
                format!("Bad record at line {} of '{}'", line + 2, path.display())
            })?;

            match self.kind {
                TableKind::Train if row.label.is_none() => {
                    bail!(
                        "Training row '{}' (line {}) of '{}' has no label",
                        row.id,
                        line + 2,
                        path.display()
                    );
                }
                TableKind::Test => row.label = None,
                TableKind::Train => {}
            }
            rows.push(row);
        }

        tracing::info!(
            "Loaded {} {:?} rows from '{}'",
            rows.len(),
            self.kind,
            path.display()
        );
        log_language_mix(&rows);
        Ok(rows)
    }
}

/// Debug summary of how many rows each language contributes
fn log_language_mix(rows: &[NliRow]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        let lang = row.lang_abv.as_deref().unwrap_or("?");
        *counts.entry(lang).or_insert(0) += 1;
    }
    tracing::debug!("Language mix: {:?}", counts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::Label;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_loads_train_rows_with_labels() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "train.csv",
            "id,premise,hypothesis,lang_abv,language,label\n\
             a1,\"It rains, a lot.\",It is wet.,en,English,0\n\
             a2,Il pleut.,Il fait sec.,fr,French,2\n",
        );
        let rows = CsvTableLoader::train().load(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].premise, "It rains, a lot.");
        assert_eq!(rows[0].label, Some(Label::Entailment));
        assert_eq!(rows[1].lang_abv.as_deref(), Some("fr"));
        assert_eq!(rows[1].label, Some(Label::Contradiction));
    }

    #[test]
    fn test_test_table_needs_no_label_or_language_columns() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write(&dir, "test.csv", "id,premise,hypothesis\nt1,p,h\n");
        let rows = CsvTableLoader::test().load(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].label.is_none());
        assert!(rows[0].language.is_none());
    }

    #[test]
    fn test_missing_train_label_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write(&dir, "train.csv", "id,premise,hypothesis,label\nx,p,h,\n");
        let err  = CsvTableLoader::train().load(&path).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_out_of_range_label_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write(&dir, "train.csv", "id,premise,hypothesis,label\nx,p,h,7\n");
        assert!(CsvTableLoader::train().load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CsvTableLoader::test().load(&dir.path().join("nope.csv")).is_err());
    }
}
