// ============================================================
// Layer 3 — TranslationPair Domain Type
// ============================================================
// One parallel sentence: the same meaning written in two
// languages. The loader creates these, the preprocessor filters
// them, and the fine-tuning driver consumes them wholesale.
//
// Fields are private so the only way to build a pair is through
// `TranslationPair::new`, which refuses identical language tags.
// Once built, a pair is never mutated.

use crate::domain::{error::TranslatorError, language::Language};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationPair {
    source_text: String,
    target_text: String,
    source_lang: Language,
    target_lang: Language,
}

impl TranslationPair {
    pub fn new(
        source_text: impl Into<String>,
        target_text: impl Into<String>,
        source_lang: Language,
        target_lang: Language,
    ) -> Result<Self, TranslatorError> {
        if source_lang == target_lang {
            return Err(TranslatorError::InvalidLanguage(format!(
                "a translation pair needs two different languages, got '{source_lang}' twice"
            )));
        }
        Ok(Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
            source_lang,
            target_lang,
        })
    }

    pub fn source_text(&self) -> &str { &self.source_text }
    pub fn target_text(&self) -> &str { &self.target_text }
    pub fn source_lang(&self) -> Language { self.source_lang }
    pub fn target_lang(&self) -> Language { self.target_lang }

    /// The same sentence pair read in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            source_text: self.target_text.clone(),
            target_text: self.source_text.clone(),
            source_lang: self.target_lang,
            target_lang: self.source_lang,
        }
    }

    /// Return a copy with both texts replaced (language tags are kept).
    pub fn with_texts(&self, source_text: String, target_text: String) -> Self {
        Self {
            source_text,
            target_text,
            source_lang: self.source_lang,
            target_lang: self.target_lang,
        }
    }
}
