// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Builds a word-level tokenizer from a text corpus and writes it
// to disk in the HuggingFace tokenizer.json format, then loads
// it back as a `tokenizers::Tokenizer`.
//
// Building the JSON by hand (instead of running a trainer) keeps
// the vocabulary ordering fully under our control: words are
// ranked by frequency, ties broken alphabetically, so the same
// corpus always yields the same ids.
//
// Words are counted with the very normalizer and pre-tokenizer
// that end up in the JSON, so every counted word is guaranteed
// to be matched again at encode time (no accidental [UNK]s from
// a hand-rolled split that disagrees on punctuation or CJK).
//
// Id layout:
//   0 [PAD]  1 [UNK]  2 [CLS]  3 [SEP]  4 [MASK]  5.. words
// The largest id is always < vocab_size, so the embedding table
// of the model can be sized from the config alone.
//
// Reference: HuggingFace tokenizers JSON format

use anyhow::{anyhow, Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};
use tokenizers::{
    normalizers::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

pub const PAD_ID:  u32 = 0;
pub const UNK_ID:  u32 = 1;
pub const CLS_ID:  u32 = 2;
pub const SEP_ID:  u32 = 3;
pub const MASK_ID: u32 = 4;

pub const NUM_SPECIAL_TOKENS: usize = 5;

const SPECIAL_TOKENS: [(&str, u32); NUM_SPECIAL_TOKENS] = [
    ("[PAD]", PAD_ID),
    ("[UNK]", UNK_ID),
    ("[CLS]", CLS_ID),
    ("[SEP]", SEP_ID),
    ("[MASK]", MASK_ID),
];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Build a fresh tokenizer from `texts`, overwriting any
    /// tokenizer.json already in the directory.
    pub fn build(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count words exactly as the tokenizer will see them ──
        let normalizer    = BertNormalizer::new(true, true, Some(false), true);
        let pre_tokenizer = Whitespace {};

        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let mut normalized = NormalizedString::from(text.as_str());
            normalizer
                .normalize(&mut normalized)
                .map_err(|e| anyhow!("Normalisation error: {e}"))?;
            let mut pre = PreTokenizedString::from(normalized);
            pre_tokenizer
                .pre_tokenize(&mut pre)
                .map_err(|e| anyhow!("Pre-tokenisation error: {e}"))?;
            for (word, _, _) in pre.get_splits(OffsetReferential::Original, OffsetType::Byte) {
                *freq.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        // ── Step 2: Rank by frequency, then alphabetically ──
        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(w, _)| !SPECIAL_TOKENS.iter().any(|(s, _)| s == w))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(NUM_SPECIAL_TOKENS));

        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (i, (word, _)) in words.iter().enumerate() {
            vocab.insert(word.clone(), serde_json::json!(NUM_SPECIAL_TOKENS + i));
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ──
        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|(content, id)| {
                serde_json::json!({
                    "id": id, "content": content, "single_word": false,
                    "lstrip": false, "rstrip": false, "normalized": false, "special": true
                })
            })
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": false,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.path();
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} words (+{} special), saved to '{}'",
            words.len(),
            NUM_SPECIAL_TOKENS,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow!("Cannot reload tokenizer '{}': {e}", tok_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "The cat sat.".to_string(),
            "the cat ran, the dog sat".to_string(),
        ]
    }

    #[test]
    fn test_frequent_words_get_low_ids() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build(&corpus(), 100).unwrap();
        // "the" (3x) ranks before "cat"/"sat" (2x), which are alphabetical
        assert_eq!(tok.token_to_id("the"), Some(5));
        assert_eq!(tok.token_to_id("cat"), Some(6));
        assert_eq!(tok.token_to_id("sat"), Some(7));
        assert_eq!(tok.token_to_id("[SEP]"), Some(SEP_ID));
    }

    #[test]
    fn test_ids_stay_below_vocab_size() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build(&corpus(), 7).unwrap();
        let enc = tok.encode("the cat sat dog zebra", false).unwrap();
        assert!(enc.get_ids().iter().all(|&id| id < 7));
        // truncated words and unseen words fall back to [UNK]
        assert_eq!(*enc.get_ids().last().unwrap(), UNK_ID);
    }

    #[test]
    fn test_encoding_is_case_insensitive_and_splits_punctuation() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build(&corpus(), 100).unwrap();
        let enc = tok.encode("THE Cat.", false).unwrap();
        assert_eq!(enc.get_ids().len(), 3);
        assert!(enc.get_ids().iter().all(|&id| id != UNK_ID));
    }

    #[test]
    fn test_writes_tokenizer_file() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path().join("fold=0"));
        store.build(&corpus(), 50).unwrap();
        assert!(store.path().exists());
    }
}
