// ============================================================
// Layer 4 - Pair Encoder
// ============================================================
// Turns an NliRow into a fixed-length model input using the
// fold's tokenizer. Standard BERT sentence-pair layout:
//
//   [CLS] premise tokens [SEP] hypothesis tokens [SEP] [PAD] ...
//   type:  0 ...        0     1 ...             1     0 ...
//   mask:  1 ...        1     1 ...             1     0 ...
//
// If the pair is too long, tokens are removed from the end of
// whichever segment is currently longer (premise on a tie)
// until it fits: "longest first" truncation. This keeps the
// short hypothesis intact, which usually carries the signal.

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

use crate::data::{dataset::NliSample, preprocessor::Preprocessor};
use crate::domain::nli_pair::NliRow;
use crate::infra::tokenizer_store::{CLS_ID, PAD_ID, SEP_ID};

/// [CLS] + two [SEP]
const NUM_PAIR_SPECIALS: usize = 3;

pub struct PairEncoder<'a> {
    tokenizer:    &'a Tokenizer,
    preprocessor: Preprocessor,
    max_seq_len:  usize,
}

impl<'a> PairEncoder<'a> {
    pub fn new(tokenizer: &'a Tokenizer, max_seq_len: usize) -> Self {
        Self { tokenizer, preprocessor: Preprocessor::new(), max_seq_len }
    }

    pub fn encode(&self, row: &NliRow) -> Result<NliSample> {
        let (premise, hypothesis) = self.preprocessor.clean_pair(row);

        let mut p_ids = self.token_ids(&premise)?;
        let mut h_ids = self.token_ids(&hypothesis)?;
        truncate_longest_first(
            &mut p_ids,
            &mut h_ids,
            self.max_seq_len.saturating_sub(NUM_PAIR_SPECIALS),
        );

        let mut input_ids = Vec::with_capacity(self.max_seq_len);
        input_ids.push(CLS_ID);
        input_ids.extend_from_slice(&p_ids);
        input_ids.push(SEP_ID);
        let premise_len = input_ids.len();
        input_ids.extend_from_slice(&h_ids);
        input_ids.push(SEP_ID);

        let real_len = input_ids.len();
        let mut token_type_ids = vec![0u32; premise_len];
        token_type_ids.resize(real_len, 1);
        let mut attention_mask = vec![1u32; real_len];

        input_ids.resize(self.max_seq_len, PAD_ID);
        token_type_ids.resize(self.max_seq_len, 0);
        attention_mask.resize(self.max_seq_len, 0);

        Ok(NliSample { input_ids, token_type_ids, attention_mask, label: row.label })
    }

    pub fn encode_all(&self, rows: &[NliRow]) -> Result<Vec<NliSample>> {
        rows.iter().map(|r| self.encode(r)).collect()
    }

    fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }
}

fn truncate_longest_first(a: &mut Vec<u32>, b: &mut Vec<u32>, budget: usize) {
    while a.len() + b.len() > budget {
        if a.len() >= b.len() {
            a.pop();
        } else {
            b.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::Label;
    use crate::infra::tokenizer_store::TokenizerStore;

    fn tokenizer(dir: &tempfile::TempDir) -> Tokenizer {
        let texts = vec!["a b c d e f g h".to_string()];
        TokenizerStore::new(dir.path()).build(&texts, 64).unwrap()
    }

    #[test]
    fn test_pair_layout_and_padding() {
        let dir = tempfile::tempdir().unwrap();
        let tok = tokenizer(&dir);
        let enc = PairEncoder::new(&tok, 10);
        let row = NliRow::new("x", "a b", "c", Some(Label::Neutral));
        let s   = enc.encode(&row).unwrap();

        assert_eq!(s.input_ids.len(), 10);
        assert_eq!(s.input_ids[0], CLS_ID);
        assert_eq!(s.input_ids[3], SEP_ID);
        assert_eq!(s.input_ids[5], SEP_ID);
        assert_eq!(&s.input_ids[6..], &[PAD_ID; 4]);
        assert_eq!(s.token_type_ids, vec![0, 0, 0, 0, 1, 1, 0, 0, 0, 0]);
        assert_eq!(s.attention_mask, vec![1, 1, 1, 1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(s.label, Some(Label::Neutral));
    }

    #[test]
    fn test_truncates_longer_segment_first() {
        let dir = tempfile::tempdir().unwrap();
        let tok = tokenizer(&dir);
        let enc = PairEncoder::new(&tok, 7);
        let row = NliRow::new("x", "a b c d e f", "g h", None);
        let s   = enc.encode(&row).unwrap();

        // budget 4: premise cut to 2, hypothesis keeps both tokens
        assert_eq!(s.input_ids.len(), 7);
        assert!(s.attention_mask.iter().all(|&m| m == 1));
        assert_eq!(s.input_ids[3], SEP_ID);
        assert_eq!(s.input_ids[6], SEP_ID);
        assert_eq!(s.label, None);
    }

    #[test]
    fn test_truncate_longest_first_balances() {
        let mut a = vec![1, 2, 3, 4, 5];
        let mut b = vec![6, 7, 8];
        truncate_longest_first(&mut a, &mut b, 4);
        assert_eq!(a, vec![1, 2]);
        assert_eq!(b, vec![6, 7]);
    }
}
