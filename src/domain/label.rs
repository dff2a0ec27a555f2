// ============================================================
// Layer 3 - NLI Label
// ============================================================
// The three classes of the natural language inference task.
// The integer codes match the competition's train.csv:
//
//   0 = entailment     (hypothesis follows from the premise)
//   1 = neutral        (neither follows nor contradicts)
//   2 = contradiction  (hypothesis contradicts the premise)
//
// Labels travel through CSV files and tensors as plain integers,
// so the enum converts to and from u8 via serde's `into` /
// `try_from` attributes. Any other integer is rejected at the
// boundary instead of flowing into the loss function.

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Label {
    Entailment    = 0,
    Neutral       = 1,
    Contradiction = 2,
}

impl Label {
    /// Number of output classes of the classifier head
    pub const COUNT: usize = 3;

    /// All labels in ascending class-index order
    pub const ALL: [Label; Label::COUNT] = [Label::Entailment, Label::Neutral, Label::Contradiction];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> anyhow::Result<Self> {
        Label::ALL
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("class index {index} is outside 0..{}", Label::COUNT))
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> u8 {
        label as u8
    }
}

impl TryFrom<u8> for Label {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Label::from_index(value as usize)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Label::Entailment    => "entailment",
            Label::Neutral       => "neutral",
            Label::Contradiction => "contradiction",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_competition_format() {
        assert_eq!(u8::from(Label::Entailment), 0);
        assert_eq!(u8::from(Label::Neutral), 1);
        assert_eq!(u8::from(Label::Contradiction), 2);
    }

    #[test]
    fn test_rejects_unknown_code() {
        assert!(Label::try_from(3u8).is_err());
        assert_eq!(Label::try_from(2u8).unwrap(), Label::Contradiction);
    }

    #[test]
    fn test_ordering_follows_index() {
        assert!(Label::Entailment < Label::Neutral);
        assert!(Label::Neutral < Label::Contradiction);
    }
}
