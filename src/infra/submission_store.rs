// ============================================================
// Layer 6 - Submission Store
// ============================================================
// Reads and writes `id,prediction` CSV files.
//
// Writing is deterministic: fixed header, rows in submission
// order, predictions as bare class integers, '\n' line endings.
// Writing the same Submission twice therefore produces
// byte-identical files.
//
// Reference: csv crate documentation

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::submission::{Submission, SubmissionRow};

pub fn write_submission(path: &Path, submission: &Submission) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    for row in submission.rows() {
        w.serialize(row)?;
    }
    // A header-only file for an empty submission
    if submission.is_empty() {
        w.write_record(["id", "prediction"])?;
    }
    w.flush()?;

    tracing::debug!("Wrote {} predictions to '{}'", submission.len(), path.display());
    Ok(())
}

pub fn read_submission(path: &Path) -> Result<Submission> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let rows = reader
        .deserialize::<SubmissionRow>()
        .enumerate()
        .map(|(line, r)| {
            r.with_context(|| format!("Bad row at line {} of '{}'", line + 2, path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Submission::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::Label;

    fn sample() -> Submission {
        Submission::from_predictions(
            vec!["c6d58c3f69".into(), "cefcc82292".into()],
            vec![Label::Contradiction, Label::Neutral],
        ).unwrap()
    }

    #[test]
    fn test_file_format() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&path, &sample()).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,prediction\nc6d58c3f69,2\ncefcc82292,1\n"
        );
        assert_eq!(read_submission(&path).unwrap(), sample());
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let a   = dir.path().join("a.csv");
        let b   = dir.path().join("b.csv");
        write_submission(&a, &sample()).unwrap();
        write_submission(&b, &sample()).unwrap();
        assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
    }

    #[test]
    fn test_empty_submission_has_header() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/submission.csv");
        write_submission(&path, &Submission::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,prediction\n");
    }

    #[test]
    fn test_rejects_unknown_class() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,prediction\na,9\n").unwrap();
        assert!(read_submission(&path).is_err());
    }
}
