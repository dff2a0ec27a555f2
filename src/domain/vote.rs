// ============================================================
// Layer 3 - Majority Vote Aggregation
// ============================================================
// Combines the test predictions of every fold into a single
// submission. For each row position we count how many folds
// predicted each class and keep the most frequent one (the
// statistical mode along the fold axis).
//
// Example with 3 folds and 3 test rows:
//
//             row0  row1  row2
//   fold 0:     0     0     1
//   fold 1:     0     1     1
//   fold 2:     1     1     1
//   --------------------------
//   mode:       0     1     1
//
// Ties (e.g. {0, 1, 2} with one vote each) resolve to the
// numerically smallest class, which is the usual convention of
// a sorted mode computation. The result is fully deterministic.
//
// All submissions must describe the same test table: same
// length and the same id at every position.

use anyhow::{bail, ensure, Result};

use crate::domain::label::Label;
use crate::domain::submission::{Submission, SubmissionRow};

/// Majority-vote a list of fold submissions into one submission.
/// Row ids and ordering are taken from the first submission.
pub fn most_frequent_prediction(fold_submissions: &[Submission]) -> Result<Submission> {
    let Some(first) = fold_submissions.first() else {
        bail!("cannot aggregate an empty list of fold submissions");
    };

    for (fold, sub) in fold_submissions.iter().enumerate().skip(1) {
        ensure!(
            sub.len() == first.len(),
            "fold {fold} has {} rows, fold 0 has {}",
            sub.len(),
            first.len()
        );
        if let Some((pos, (a, b))) = first
            .ids()
            .zip(sub.ids())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            bail!("fold {fold} row {pos} has id '{b}', fold 0 has '{a}'");
        }
    }

    let rows = first
        .rows()
        .iter()
        .enumerate()
        .map(|(pos, row)| {
            let votes = fold_submissions.iter().map(|s| s.rows()[pos].prediction);
            SubmissionRow { id: row.id.clone(), prediction: mode(votes) }
        })
        .collect();

    Ok(Submission::new(rows))
}

/// Most frequent label; the smallest class index wins a tie.
fn mode(votes: impl Iterator<Item = Label>) -> Label {
    let mut counts = [0usize; Label::COUNT];
    for v in votes {
        counts[v.index()] += 1;
    }

    // Strictly-greater comparison keeps the earliest (lowest) class on ties
    let mut best = Label::ALL[0];
    for label in Label::ALL.iter().copied().skip(1) {
        if counts[label.index()] > counts[best.index()] {
            best = label;
        }
    }
    best
}
