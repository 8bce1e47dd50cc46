// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits instead
// of concrete types:
//
//   - PairSource        → FileLoader / DirectoryLoader (data layer)
//   - TranslationEngine → BurnEngine (ml layer), mocks in tests
//
// The inference service only ever sees `dyn TranslationEngine`,
// which is what lets the HTTP handlers be tested without a
// trained checkpoint.

use serde::{Deserialize, Serialize};

use crate::domain::{error::Result, language::Language, translation_pair::TranslationPair};

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Anything that can produce parallel sentence pairs.
pub trait PairSource {
    fn load_pairs(&self) -> Result<Vec<TranslationPair>>;
}

// ─── DecodingParams ───────────────────────────────────────────────────────────
/// Fixed generation settings, taken from configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    /// Hypotheses kept alive at every decoding step
    pub beam_size: usize,
    /// Upper bound on generated tokens
    pub max_length: usize,
    /// Exponent applied to hypothesis length when ranking beams;
    /// below 1.0 favours shorter outputs
    pub length_penalty: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self { beam_size: 5, max_length: 128, length_penalty: 0.6 }
    }
}

// ─── ModelInfo ────────────────────────────────────────────────────────────────
/// Description of the loaded model, served at `GET /model/info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub checkpoint:          String,
    pub base_model:          Option<String>,
    pub backend:             String,
    pub vocab_size:          usize,
    pub d_model:             usize,
    pub num_layers:          usize,
    pub num_heads:           usize,
    pub max_length:          usize,
    pub supported_languages: Vec<Language>,
}

// ─── TranslationEngine ────────────────────────────────────────────────────────
/// A loaded model that turns cleaned source text into target text.
///
/// Implementations must be shareable across request threads; the
/// weights are read-only after loading.
pub trait TranslationEngine: Send + Sync {
    fn generate(&self, text: &str, target: Language, params: &DecodingParams) -> Result<String>;

    fn info(&self) -> ModelInfo;
}
