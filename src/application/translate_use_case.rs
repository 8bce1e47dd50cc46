// ============================================================
// Layer 2 — Translation Service
// ============================================================
// The one object request handlers talk to. Built once at startup
// (CLI `serve` / `translate`) around a loaded engine and shared
// behind an Arc; there is no global model state.
//
// Request flow:
//   1. parse + validate language tags       → InvalidLanguage
//   2. clean the text the way training data was cleaned;
//      empty → "" without touching the model
//   3. optional en→ha / ha→en auto swap when the text reads Hausa
//   4. beam search through the engine

use std::{path::Path, sync::Arc};

use crate::data::preprocessor::{looks_like_hausa, Preprocessor};
use crate::domain::{
    error::Result,
    language::Language,
    traits::{DecodingParams, ModelInfo, TranslationEngine},
};
use crate::infra::config::AppConfig;
use crate::ml::inferencer::BurnEngine;

/// Result of one request. The languages are the direction actually
/// used, which differs from the request only after an auto swap.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text:        String,
    pub source_lang: Language,
    pub target_lang: Language,
}

pub struct TranslationService {
    engine:       Arc<dyn TranslationEngine>,
    decoding:     DecodingParams,
    auto_detect:  bool,
    preprocessor: Preprocessor,
}

impl TranslationService {
    pub fn new(engine: Arc<dyn TranslationEngine>, decoding: DecodingParams, auto_detect: bool) -> Self {
        Self { engine, decoding, auto_detect, preprocessor: Preprocessor::default() }
    }

    /// Replace the default cleaning (whitespace only)
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Load the checkpoint in `checkpoint_dir`. Any missing or
    /// mismatched file is a ModelLoad error.
    pub fn load(checkpoint_dir: &Path, config: &AppConfig) -> Result<Self> {
        tracing::info!("Loading model from '{}'", checkpoint_dir.display());
        let engine = BurnEngine::load(checkpoint_dir)?;
        let service = Self::new(
            Arc::new(engine),
            config.decoding(),
            config.inference.auto_detect_direction,
        );
        Ok(service.with_preprocessor(Preprocessor::new(&config.preprocessing)))
    }

    pub fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<Translation> {
        let (mut source, mut target) = Language::parse_pair(source_lang, target_lang)?;

        let cleaned = self.preprocessor.clean(text);
        if cleaned.is_empty() {
            return Ok(Translation { text: String::new(), source_lang: source, target_lang: target });
        }

        if self.auto_detect && source == Language::En && looks_like_hausa(&cleaned) {
            tracing::debug!("Input looks like Hausa, translating ha → en instead");
            std::mem::swap(&mut source, &mut target);
        }

        let translation = self.engine.generate(&cleaned, target, &self.decoding)?;
        tracing::debug!("{} → {}: '{}' → '{}'", source, target, cleaned, translation);
        Ok(Translation { text: translation, source_lang: source, target_lang: target })
    }

    pub fn info(&self) -> ModelInfo {
        self.engine.info()
    }

    pub fn decoding(&self) -> DecodingParams {
        self.decoding
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::error::TranslatorError;

    /// Echoes its input tagged with the target language.
    #[derive(Default)]
    pub(crate) struct EchoEngine {
        pub calls: AtomicUsize,
    }

    impl TranslationEngine for EchoEngine {
        fn generate(&self, text: &str, target: Language, _: &DecodingParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(TranslatorError::Inference("engine failure".into()));
            }
            Ok(format!("[{target}] {text}"))
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                checkpoint:          "memory".into(),
                base_model:          None,
                backend:             "mock".into(),
                vocab_size:          10,
                d_model:             8,
                num_layers:          1,
                num_heads:           1,
                max_length:          16,
                supported_languages: Language::ALL.to_vec(),
            }
        }
    }

    pub(crate) fn service(auto_detect: bool) -> (Arc<EchoEngine>, TranslationService) {
        let engine = Arc::new(EchoEngine::default());
        let svc = TranslationService::new(engine.clone(), DecodingParams::default(), auto_detect);
        (engine, svc)
    }

    #[test]
    fn test_same_language_always_rejected() {
        let (engine, svc) = service(false);
        for text in ["Hello", "", "   ", "Sannu"] {
            assert!(matches!(
                svc.translate(text, "en", "en"),
                Err(TranslatorError::InvalidLanguage(_))
            ));
        }
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let (_, svc) = service(false);
        assert!(matches!(
            svc.translate("Hello", "en", "fr"),
            Err(TranslatorError::InvalidLanguage(_))
        ));
    }

    #[test]
    fn test_empty_input_skips_model() {
        let (engine, svc) = service(false);
        let out = svc.translate("", "en", "ha").unwrap();
        assert_eq!(out.text, "");
        assert_eq!(svc.translate(" \u{00A0}\t", "en", "ha").unwrap().text, "");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_text_is_cleaned_before_generation() {
        let (_, svc) = service(false);
        let out = svc.translate("  Good   morning ", "EN", "ha").unwrap();
        assert_eq!(out.text, "[ha] Good morning");
        assert_eq!((out.source_lang, out.target_lang), (Language::En, Language::Ha));
    }

    #[test]
    fn test_special_chars_stripped_like_training_data() {
        use crate::infra::config::PreprocessingSection;

        let (engine, svc) = service(false);
        let svc = svc.with_preprocessor(Preprocessor::new(&PreprocessingSection {
            remove_special_chars: true,
            ..PreprocessingSection::default()
        }));
        let out = svc.translate("Good #morning @everyone", "en", "ha").unwrap();
        assert_eq!(out.text, "[ha] Good morning everyone");

        // Nothing left after stripping: no model call
        assert_eq!(svc.translate("#@ ~", "en", "ha").unwrap().text, "");
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_auto_detect_swaps_direction() {
        let (_, svc) = service(true);
        let out = svc.translate("Na gode sosai, ya yi kyau", "en", "ha").unwrap();
        assert_eq!(out.target_lang, Language::En);
        assert_eq!(out.text, "[en] Na gode sosai, ya yi kyau");

        let (_, off) = service(false);
        let out = off.translate("Na gode sosai, ya yi kyau", "en", "ha").unwrap();
        assert_eq!(out.target_lang, Language::Ha);
    }

    #[test]
    fn test_engine_errors_propagate() {
        let (_, svc) = service(false);
        assert!(matches!(
            svc.translate("boom", "en", "ha"),
            Err(TranslatorError::Inference(_))
        ));
    }

    #[test]
    fn test_missing_checkpoint_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TranslationService::load(&dir.path().join("never-trained"), &AppConfig::default());
        assert!(matches!(result, Err(TranslatorError::ModelLoad { .. })));
    }
}
