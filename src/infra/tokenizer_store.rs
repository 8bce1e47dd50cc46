// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and loads the shared English+Hausa vocabulary.
//
// One WordLevel vocabulary covers both languages, written as a
// HuggingFace `tokenizer.json` and loaded back through the
// `tokenizers` crate. Building the JSON directly avoids the
// trainer/ModelWrapper type mismatch in tokenizers 0.15.
//
// Reserved ids:
//   0 <pad>   padding, ignored by the loss
//   1 <unk>   out-of-vocabulary word
//   2 <s>     decoder start
//   3 </s>    end of sequence
//   4 <2en>   "translate into English" source prefix
//   5 <2ha>   "translate into Hausa"   source prefix
//
// The target-language tag plays the role of mT5's
// "translate English to Hausa:" task prefix: one model serves
// both directions and the first source token says which.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use tokenizers::Tokenizer;

use crate::domain::{
    error::{Result, TranslatorError},
    language::Language,
};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub const PAD_ID:    u32 = 0;
pub const UNK_ID:    u32 = 1;
pub const BOS_ID:    u32 = 2;
pub const EOS_ID:    u32 = 3;
pub const TO_EN_ID:  u32 = 4;
pub const TO_HA_ID:  u32 = 5;

const SPECIAL_TOKENS: [(&str, u32); 6] = [
    ("<pad>", PAD_ID),
    ("<unk>", UNK_ID),
    ("<s>",   BOS_ID),
    ("</s>",  EOS_ID),
    ("<2en>", TO_EN_ID),
    ("<2ha>", TO_HA_ID),
];

/// Target-language tag token for a direction
pub fn language_tag(target: Language) -> u32 {
    match target {
        Language::En => TO_EN_ID,
        Language::Ha => TO_HA_ID,
    }
}

/// Ids the decoder must never emit as content
pub fn is_control_token(id: u32) -> bool {
    id < SPECIAL_TOKENS.len() as u32 && id != EOS_ID
}

// ─── PairTokenizer ────────────────────────────────────────────────────────────
/// Wraps a `tokenizers::Tokenizer` with the sequence layout the
/// seq2seq model is trained on.
#[derive(Clone)]
pub struct PairTokenizer {
    inner: Tokenizer,
}

impl PairTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    /// Word ids without any special tokens
    pub fn encode_words(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .inner
            .encode(text, false)
            .map_err(|e| TranslatorError::Inference(format!("tokenisation failed: {e}")))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Encoder input: `<2xx> words… </s>`, at most `max_len` ids.
    pub fn encode_source(&self, text: &str, target: Language, max_len: usize) -> Result<Vec<u32>> {
        let words = self.encode_words(text)?;
        let room  = max_len.saturating_sub(2);
        let mut ids = Vec::with_capacity(room + 2);
        ids.push(language_tag(target));
        ids.extend(words.into_iter().take(room));
        ids.push(EOS_ID);
        Ok(ids)
    }

    /// Decoder input `<s> words…` and labels `words… </s>`, each at
    /// most `max_len` ids; labels are the input shifted left by one.
    pub fn encode_target(&self, text: &str, max_len: usize) -> Result<(Vec<u32>, Vec<u32>)> {
        let words = self.encode_words(text)?;
        let room  = max_len.saturating_sub(1);
        let words: Vec<u32> = words.into_iter().take(room).collect();

        let mut decoder_input = Vec::with_capacity(words.len() + 1);
        decoder_input.push(BOS_ID);
        decoder_input.extend_from_slice(&words);

        let mut labels = words;
        labels.push(EOS_ID);
        Ok((decoder_input, labels))
    }

    /// Turn generated ids back into readable text.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        let text = self
            .inner
            .decode(ids, true)
            .map_err(|e| TranslatorError::Inference(format!("decoding failed: {e}")))?;
        Ok(detokenize(&text))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.inner
            .save(path, true)
            .map_err(|e| TranslatorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
    }
}

/// Reattach punctuation the whitespace-joined WordLevel decode
/// separated: "sannu , yaya kuke ?" → "sannu, yaya kuke?"
pub fn detokenize(text: &str) -> String {
    static BEFORE_PUNCT: OnceLock<Regex> = OnceLock::new();
    static AROUND_JOINERS: OnceLock<Regex> = OnceLock::new();

    let before_punct = BEFORE_PUNCT
        .get_or_init(|| Regex::new(r"\s+([.,!?;:])").expect("valid punctuation pattern"));
    let around_joiners = AROUND_JOINERS
        .get_or_init(|| Regex::new(r"\s*(['ʼ’-])\s*").expect("valid joiner pattern"));

    let text = before_punct.replace_all(text.trim(), "$1");
    around_joiners.replace_all(&text, "$1").into_owned()
}

/// Split text the way the tokenizer's BertNormalizer + Whitespace
/// pre-tokenizer does: lowercase, then runs of word characters and
/// runs of punctuation become separate tokens.
pub fn split_words(text: &str) -> Vec<String> {
    #[derive(PartialEq, Clone, Copy)]
    enum Class { Word, Punct }

    let mut tokens  = Vec::new();
    let mut current = String::new();
    let mut class   = Class::Word;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c.is_control() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        let c_class = if c.is_alphanumeric() || c == '_' { Class::Word } else { Class::Punct };
        if !current.is_empty() && c_class != class {
            tokens.push(std::mem::take(&mut current));
        }
        class = c_class;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<PairTokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map(PairTokenizer::new)
            .map_err(|e| TranslatorError::model_load(&path, format!("cannot load tokenizer: {e}")))
    }

    /// Build a word-level vocabulary from both sides of the corpus
    /// and write a valid tokenizer JSON directly.
    pub fn build_and_save(&self, texts: &[&str], max_vocab_size: usize) -> Result<PairTokenizer> {
        fs::create_dir_all(&self.dir)?;

        // ── Step 1: Count word frequencies ────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in split_words(text) {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so the
        // vocabulary is identical across runs
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(max_vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        let mut next_id = SPECIAL_TOKENS.len() as u32;
        for (word, _) in &words {
            if !vocab.contains_key(word) {
                vocab.insert(word.clone(), serde_json::json!(next_id));
                next_id += 1;
            }
        }

        let added_tokens: Vec<_> = SPECIAL_TOKENS
            .iter()
            .map(|(content, id)| serde_json::json!({
                "id": id, "content": content, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
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
                "unk_token": "<unk>"
            }
        });

        let tok_path = self.path();
        let body = serde_json::to_string_pretty(&tokenizer_json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        fs::write(&tok_path, body)?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map(PairTokenizer::new)
            .map_err(|e| TranslatorError::model_load(&tok_path, format!("cannot reload tokenizer: {e}")))
    }
}
