// ============================================================
// Layer 6 — Application Configuration
// ============================================================
// One YAML document drives training, inference and the API:
//
//   model:          base model id, sequence limits, decoding
//   training:       batch size, learning rate, epochs, split
//   data:           which language the files treat as source
//   preprocessing:  cleaning / filtering rules   (optional)
//   inference:      runtime switches             (optional)
//   paths:          data and model directories
//   api:            host and port
//
// Required keys have no serde default, so a missing key fails
// deserialisation and surfaces as a ConfigError. Optional knobs
// carry `#[serde(default = ...)]` functions below.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::{Result, TranslatorError},
    language::Language,
    traits::DecodingParams,
};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Checkpoints cannot hold fewer positions than BOS + a few tokens
const MIN_MAX_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub model:         ModelSection,
    pub training:      TrainingSection,
    pub data:          DataSection,
    #[serde(default)]
    pub preprocessing: PreprocessingSection,
    #[serde(default)]
    pub inference:     InferenceSection,
    pub paths:         PathsSection,
    pub api:           ApiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSection {
    /// Architecture preset (`seq2seq-tiny|small|base`) or a checkpoint
    /// directory to continue fine-tuning from
    pub base_model: String,
    /// Sub-directory of `paths.models_dir` the checkpoint is written to
    pub name:       String,
    /// Longest source / target sequence in tokens
    pub max_length: usize,
    pub beam_size:  usize,
    #[serde(default = "default_length_penalty")]
    pub length_penalty: f32,
    #[serde(default = "default_max_vocab_size")]
    pub max_vocab_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSection {
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub num_epochs:    usize,
    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
    #[serde(default = "default_patience")]
    pub early_stopping_patience: usize,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    pub source_lang: Language,
    pub target_lang: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessingSection {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_chars")]
    pub max_length: usize,
    #[serde(default = "default_true")]
    pub remove_duplicates: bool,
    #[serde(default)]
    pub remove_special_chars: bool,
    /// Fewer surviving pairs than this aborts training
    #[serde(default = "default_min_valid_pairs")]
    pub min_valid_pairs: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InferenceSection {
    /// Swap en→ha to ha→en when English input looks like Hausa
    #[serde(default)]
    pub auto_detect_direction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsSection {
    pub data_dir:   PathBuf,
    pub models_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSection {
    pub host: String,
    pub port: u16,
}

fn default_length_penalty() -> f32 { 0.6 }
fn default_max_vocab_size() -> usize { 32_000 }
fn default_validation_split() -> f64 { 0.1 }
fn default_patience() -> usize { 3 }
fn default_true() -> bool { true }
fn default_seed() -> u64 { 42 }
fn default_min_length() -> usize { 1 }
fn default_max_chars() -> usize { 200 }
fn default_min_valid_pairs() -> usize { 1 }

impl Default for PreprocessingSection {
    fn default() -> Self {
        Self {
            min_length:           default_min_length(),
            max_length:           default_max_chars(),
            remove_duplicates:    true,
            remove_special_chars: false,
            min_valid_pairs:      default_min_valid_pairs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelSection {
                base_model:     "seq2seq-small".to_string(),
                name:           "english-hausa-translator".to_string(),
                max_length:     128,
                beam_size:      5,
                length_penalty: default_length_penalty(),
                max_vocab_size: default_max_vocab_size(),
            },
            training: TrainingSection {
                batch_size:              16,
                learning_rate:           5e-4,
                num_epochs:              10,
                validation_split:        default_validation_split(),
                early_stopping_patience: default_patience(),
                bidirectional:           true,
                seed:                    default_seed(),
            },
            data: DataSection {
                source_lang: Language::En,
                target_lang: Language::Ha,
            },
            preprocessing: PreprocessingSection::default(),
            inference:     InferenceSection::default(),
            paths: PathsSection {
                data_dir:   PathBuf::from("data"),
                models_dir: PathBuf::from("models"),
            },
            api: ApiSection {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
        }
    }
}

impl AppConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TranslatorError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let cfg = Self::from_yaml(&text)
            .map_err(|e| TranslatorError::Config(format!("{} ({})", e, path.display())))?;
        tracing::debug!("Loaded configuration from '{}'", path.display());
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: AppConfig = serde_yaml::from_str(text)
            .map_err(|e| TranslatorError::Config(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// An explicit path must exist; without one, `config.yaml` in the
    /// working directory is used when present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => {
                tracing::info!(
                    "No '{}' found, using built-in default configuration",
                    DEFAULT_CONFIG_FILE
                );
                Ok(Self::default())
            }
        }
    }

    /// Reject hyperparameters no training run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TranslatorError::Config(msg));

        if self.training.num_epochs == 0 {
            return fail("training.num_epochs must be positive".into());
        }
        if self.training.batch_size == 0 {
            return fail("training.batch_size must be positive".into());
        }
        let lr = self.training.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return fail(format!("training.learning_rate must be a positive number, got {lr}"));
        }
        let split = self.training.validation_split;
        if !(0.0..1.0).contains(&split) {
            return fail(format!("training.validation_split must be in [0, 1), got {split}"));
        }
        if self.model.max_length < MIN_MAX_LENGTH {
            return fail(format!("model.max_length must be at least {MIN_MAX_LENGTH}"));
        }
        if self.model.beam_size == 0 {
            return fail("model.beam_size must be at least 1".into());
        }
        if !self.model.length_penalty.is_finite() {
            return fail("model.length_penalty must be finite".into());
        }
        if self.model.name.trim().is_empty() {
            return fail("model.name must not be empty".into());
        }
        if self.data.source_lang == self.data.target_lang {
            return fail(format!(
                "data.source_lang and data.target_lang are both '{}'",
                self.data.source_lang
            ));
        }
        if self.preprocessing.min_length > self.preprocessing.max_length {
            return fail("preprocessing.min_length exceeds preprocessing.max_length".into());
        }
        Ok(())
    }

    /// Directory the checkpoint is written to / served from
    pub fn model_dir(&self) -> PathBuf {
        self.paths.models_dir.join(&self.model.name)
    }

    pub fn decoding(&self) -> DecodingParams {
        DecodingParams {
            beam_size:      self.model.beam_size,
            max_length:     self.model.max_length,
            length_penalty: self.model.length_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
model:
  base_model: seq2seq-small
  name: english-hausa-translator
  max_length: 64
  beam_size: 4
training:
  batch_size: 8
  learning_rate: 0.001
  num_epochs: 3
data:
  source_lang: en
  target_lang: ha
paths:
  data_dir: data
  models_dir: models
api:
  host: 127.0.0.1
  port: 9000
"#;

    #[test]
    fn test_parses_required_keys_and_fills_defaults() {
        let cfg = AppConfig::from_yaml(FULL).unwrap();
        assert_eq!(cfg.model.beam_size, 4);
        assert_eq!(cfg.api.port, 9000);
        assert_eq!(cfg.model.length_penalty, 0.6);
        assert!(cfg.training.bidirectional);
        assert_eq!(cfg.preprocessing, PreprocessingSection::default());
        assert_eq!(cfg.model_dir(), PathBuf::from("models/english-hausa-translator"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let without_port = FULL.replace("  port: 9000\n", "");
        let err = AppConfig::from_yaml(&without_port).unwrap_err();
        assert!(matches!(err, TranslatorError::Config(_)));
    }

    #[test]
    fn test_zero_epochs_is_config_error() {
        let bad = FULL.replace("num_epochs: 3", "num_epochs: 0");
        let err = AppConfig::from_yaml(&bad).unwrap_err();
        assert!(err.to_string().contains("num_epochs"));
    }

    #[test]
    fn test_negative_learning_rate_is_config_error() {
        let bad = FULL.replace("learning_rate: 0.001", "learning_rate: -0.1");
        assert!(matches!(
            AppConfig::from_yaml(&bad),
            Err(TranslatorError::Config(_))
        ));
    }

    #[test]
    fn test_identical_languages_rejected() {
        let bad = FULL.replace("target_lang: ha", "target_lang: en");
        assert!(matches!(
            AppConfig::from_yaml(&bad),
            Err(TranslatorError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_config_error() {
        let err = AppConfig::resolve(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, TranslatorError::Config(_)));
    }

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
    }
}
