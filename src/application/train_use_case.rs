// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one fine-tuning run, in order:
//
//   Step 1: Validate hyperparameters + resolve base model  (no I/O)
//   Step 2: Make sure the data dir has a corpus            (Layer 4)
//   Step 3: Load and clean sentence pairs                  (Layer 4)
//   Step 4: Lock the output directory, open staging        (Layer 6)
//   Step 5: Split train/validation, add reverse pairs      (Layer 4)
//   Step 6: Build or reuse the tokenizer                   (Layer 6)
//   Step 7: Build or warm-start the model                  (Layer 5)
//   Step 8: Run the training loop                          (Layer 5)
//   Step 9: Write the run summary, commit staging          (Layer 6)
//
// The lock is held from step 4 to the end; dropping it on any
// early return removes the lock file. Steps 6-9 write only into
// the staging dir, so the live checkpoint changes in step 9 or
// not at all.

use std::path::{Path, PathBuf};

use crate::data::{
    dataset::TranslationDataset,
    loader::{DirectoryLoader, Direction},
    preprocessor::Preprocessor,
    sample::{write_sample_dataset, SAMPLE_FILE_NAME},
    splitter::split_train_val,
};
use crate::domain::{
    error::{Result, TranslatorError},
    traits::PairSource,
    translation_pair::TranslationPair,
};
use crate::infra::{
    checkpoint::{CheckpointConfig, CheckpointManager, TrainingSummary},
    config::AppConfig,
    metrics::MetricsLogger,
    tokenizer_store::{PairTokenizer, TokenizerStore},
};
use crate::ml::{
    model::{preset, Seq2SeqConfig, Seq2SeqModel, PRESETS},
    trainer::{run_training, TrainerOptions, TrainingReport},
    TrainBackend,
};

/// Below this many pairs training still runs, but the model will
/// mostly memorise.
const SMALL_CORPUS_WARNING: usize = 10;

/// What `model.base_model` refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseModel {
    /// Fresh weights with a named architecture
    Preset(String),
    /// Continue from a previous run's checkpoint directory
    Checkpoint(PathBuf),
}

impl BaseModel {
    pub fn resolve(name: &str) -> Result<Self> {
        let as_path = Path::new(name);
        if CheckpointManager::is_checkpoint(as_path) {
            return Ok(Self::Checkpoint(as_path.to_path_buf()));
        }
        if PRESETS.contains(&name) {
            return Ok(Self::Preset(name.to_string()));
        }
        Err(TranslatorError::Config(format!(
            "model.base_model '{name}' is neither a checkpoint directory nor one of {}",
            PRESETS.join(", ")
        )))
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model_dir:     PathBuf,
    pub train_samples: usize,
    pub val_samples:   usize,
    pub report:        TrainingReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:        AppConfig,
    output_dir:    PathBuf,
    create_sample: bool,
}

impl TrainUseCase {
    /// Writes to `config.model_dir()` unless overridden.
    pub fn new(config: AppConfig) -> Self {
        let output_dir = config.model_dir();
        Self { config, output_dir, create_sample: false }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Write the built-in sample corpus into the data dir first
    pub fn with_sample(mut self, create: bool) -> Self {
        self.create_sample = create;
        self
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate before any work ──────────────────────────────────
        cfg.validate()?;
        let base = BaseModel::resolve(&cfg.model.base_model)?;
        tracing::info!("Base model: {:?}", base);

        // ── Step 2: Corpus presence ───────────────────────────────────────────
        let direction = Direction { source: cfg.data.source_lang, target: cfg.data.target_lang };
        let loader = DirectoryLoader::new(&cfg.paths.data_dir, direction);
        let sample_path = cfg.paths.data_dir.join(SAMPLE_FILE_NAME);
        if self.create_sample {
            write_sample_dataset(&sample_path)?;
        } else if loader.data_files()?.is_empty() {
            tracing::warn!(
                "No .json/.csv/.txt files in '{}', writing the built-in sample corpus",
                cfg.paths.data_dir.display()
            );
            write_sample_dataset(&sample_path)?;
        }

        // ── Step 3: Load + preprocess ─────────────────────────────────────────
        let raw = loader.load_pairs()?;
        let pairs = Preprocessor::new(&cfg.preprocessing).preprocess_pairs(&raw);
        let min_pairs = cfg.preprocessing.min_valid_pairs.max(1);
        if pairs.len() < min_pairs {
            return Err(TranslatorError::EmptyDataset(format!(
                "{} pairs survived preprocessing, at least {} required",
                pairs.len(),
                min_pairs
            )));
        }
        if pairs.len() < SMALL_CORPUS_WARNING {
            tracing::warn!("Only {} training pairs, expect a weak model", pairs.len());
        }

        // ── Step 4: Claim the output directory ────────────────────────────────
        let live   = CheckpointManager::create(&self.output_dir)?;
        let _lock  = live.lock()?;
        let staged = live.stage()?;
        let ckpt   = staged.manager();

        // ── Step 5: Split before reversing ────────────────────────────────────
        let (mut train_pairs, mut val_pairs) =
            split_train_val(pairs, cfg.training.validation_split, cfg.training.seed);
        if cfg.training.bidirectional {
            add_reverse_direction(&mut train_pairs);
            add_reverse_direction(&mut val_pairs);
        }
        tracing::info!(
            "Split: {} train, {} validation{}",
            train_pairs.len(),
            val_pairs.len(),
            if cfg.training.bidirectional { " (both directions)" } else { "" },
        );

        // ── Step 6 + 7: Tokenizer and model ───────────────────────────────────
        let device = crate::ml::default_device();
        let (tokenizer, architecture, model) = match &base {
            BaseModel::Preset(name) => {
                let texts: Vec<&str> = train_pairs
                    .iter()
                    .chain(&val_pairs)
                    .flat_map(|p| [p.source_text(), p.target_text()])
                    .collect();
                let tokenizer = TokenizerStore::new(ckpt.dir())
                    .build_and_save(&texts, cfg.model.max_vocab_size)?;
                let architecture = preset(name, tokenizer.vocab_size(), cfg.model.max_length)
                    .ok_or_else(|| TranslatorError::Config(format!("unknown preset '{name}'")))?;
                check_architecture(&architecture)?;
                let model = architecture.init::<TrainBackend>(&device);
                (tokenizer, architecture, model)
            }
            BaseModel::Checkpoint(dir) => warm_start(dir, ckpt.dir(), &device)?,
        };

        let max_length = cfg.model.max_length.min(architecture.max_positions);
        if max_length < cfg.model.max_length {
            tracing::warn!(
                "Base checkpoint holds {} positions; sequences truncated to that instead of {}",
                architecture.max_positions,
                cfg.model.max_length
            );
        }
        ckpt.save_config(&CheckpointConfig {
            architecture: architecture.clone(),
            max_length,
            base_model: cfg.model.base_model.clone(),
        })?;

        let train_ds = TranslationDataset::from_pairs(&train_pairs, &tokenizer, max_length)?;
        let val_ds   = TranslationDataset::from_pairs(&val_pairs, &tokenizer, max_length)?;

        // ── Step 8: Training loop ─────────────────────────────────────────────
        let opts = TrainerOptions {
            epochs:        cfg.training.num_epochs,
            batch_size:    cfg.training.batch_size,
            learning_rate: cfg.training.learning_rate,
            patience:      cfg.training.early_stopping_patience,
            seed:          cfg.training.seed,
        };
        let metrics = MetricsLogger::new(ckpt.dir())?;
        let report = run_training(model, opts, train_ds, val_ds, ckpt, &metrics, device)?;

        // ── Step 9: Summary ───────────────────────────────────────────────────
        ckpt.save_summary(&TrainingSummary {
            completed_at:     chrono::Utc::now(),
            base_model:       cfg.model.base_model.clone(),
            epochs_completed: report.epochs_completed,
            stopped_early:    report.stopped_early,
            best_val_loss:    report.best_val_loss,
            train_samples:    train_pairs.len(),
            val_samples:      val_pairs.len(),
            bidirectional:    cfg.training.bidirectional,
            vocab_size:       tokenizer.vocab_size(),
        })?;
        staged.commit()?;
        tracing::info!("Model saved to '{}'", self.output_dir.display());

        Ok(TrainOutcome {
            model_dir:     self.output_dir.clone(),
            train_samples: train_pairs.len(),
            val_samples:   val_pairs.len(),
            report,
        })
    }
}

/// Reuse a previous checkpoint's vocabulary, architecture and
/// weights. The tokenizer is copied into `staging_dir` with the run.
fn warm_start(
    dir:         &Path,
    staging_dir: &Path,
    device:      &crate::ml::Device,
) -> Result<(PairTokenizer, Seq2SeqConfig, Seq2SeqModel<TrainBackend>)> {
    let base = CheckpointManager::open(dir)?;
    let base_cfg  = base.load_config()?;
    let tokenizer = TokenizerStore::new(dir).load()?;
    check_architecture(&base_cfg.architecture)?;

    let model = base.load_model(base_cfg.architecture.init::<TrainBackend>(device), device)?;
    tokenizer.save(&TokenizerStore::new(staging_dir).path())?;
    tracing::info!("Continuing from checkpoint '{}'", dir.display());
    Ok((tokenizer, base_cfg.architecture, model))
}

/// Append every pair's reverse, so one model learns both directions.
fn add_reverse_direction(pairs: &mut Vec<TranslationPair>) {
    let reversed: Vec<TranslationPair> = pairs.iter().map(TranslationPair::reversed).collect();
    pairs.extend(reversed);
}

fn check_architecture(arch: &Seq2SeqConfig) -> Result<()> {
    if arch.num_heads == 0 || arch.d_model % arch.num_heads != 0 {
        return Err(TranslatorError::Config(format!(
            "d_model {} is not divisible by num_heads {}",
            arch.d_model, arch.num_heads
        )));
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::translate_use_case::TranslationService;
    use crate::domain::language::Language;
    use crate::infra::checkpoint::LOCK_FILE;

    fn tiny_config(root: &Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.model.base_model       = "seq2seq-tiny".into();
        cfg.model.max_length       = 16;
        cfg.model.beam_size        = 2;
        cfg.training.batch_size    = 8;
        cfg.training.num_epochs    = 2;
        cfg.training.learning_rate = 1e-3;
        cfg.paths.data_dir         = root.join("data");
        cfg.paths.models_dir       = root.join("models");
        cfg
    }

    #[test]
    fn test_resolve_base_model() {
        assert_eq!(
            BaseModel::resolve("seq2seq-base").unwrap(),
            BaseModel::Preset("seq2seq-base".into())
        );
        assert!(matches!(
            BaseModel::resolve("google/mt5-small"),
            Err(TranslatorError::Config(_))
        ));
    }

    #[test]
    fn test_reverse_direction_doubles_pairs() {
        let mut pairs = vec![TranslationPair::new("Good morning", "Barka da safe", Language::En, Language::Ha).unwrap()];
        add_reverse_direction(&mut pairs);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].source_lang(), Language::Ha);
        assert_eq!(pairs[1].source_text(), "Barka da safe");
    }

    #[test]
    fn test_invalid_config_fails_before_touching_disk() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(root.path());
        cfg.training.num_epochs = 0;
        let err = TrainUseCase::new(cfg).with_sample(true).execute().unwrap_err();
        assert!(matches!(err, TranslatorError::Config(_)));
        assert!(!root.path().join("data").exists());
    }

    #[test]
    fn test_too_few_pairs_is_empty_dataset() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(root.path());
        cfg.preprocessing.min_valid_pairs = 100;
        let err = TrainUseCase::new(cfg).with_sample(true).execute().unwrap_err();
        assert!(matches!(err, TranslatorError::EmptyDataset(_)));
    }

    #[test]
    fn test_busy_output_dir_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let cfg = tiny_config(root.path());
        let ckpt = CheckpointManager::create(cfg.model_dir()).unwrap();
        let _held = ckpt.lock().unwrap();

        let err = TrainUseCase::new(cfg).with_sample(true).execute().unwrap_err();
        assert!(matches!(err, TranslatorError::CheckpointInUse(_)));
    }

    fn checkpoint_bytes(dir: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_file())
            .map(|p| (p.file_name().unwrap().to_string_lossy().into_owned(), std::fs::read(&p).unwrap()))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_diverging_run_is_resource_error() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(root.path());
        cfg.training.learning_rate = 1e30;

        let err = TrainUseCase::new(cfg.clone()).with_sample(true).execute().unwrap_err();
        assert!(matches!(err, TranslatorError::Resource(_)), "got {err:?}");

        let dir = cfg.model_dir();
        assert!(!dir.join(LOCK_FILE).exists());
        assert!(!CheckpointManager::is_checkpoint(&dir));
        assert!(!dir.join("model.mpk").exists());
    }

    #[test]
    fn test_failed_rerun_leaves_checkpoint_untouched() {
        let root = tempfile::tempdir().unwrap();
        let cfg = tiny_config(root.path());
        TrainUseCase::new(cfg.clone()).with_sample(true).execute().unwrap();
        let dir = cfg.model_dir();
        let before = checkpoint_bytes(&dir);

        // New words would change the vocabulary if anything leaked through
        std::fs::write(
            cfg.paths.data_dir.join("extra.txt"),
            "The river is rising fast\tKogin yana cika da sauri\n",
        )
        .unwrap();
        let mut diverging = cfg.clone();
        diverging.training.learning_rate = 1e30;
        let err = TrainUseCase::new(diverging).execute().unwrap_err();
        assert!(matches!(err, TranslatorError::Resource(_)), "got {err:?}");

        assert_eq!(checkpoint_bytes(&dir), before);
        let staging = dir.with_file_name(format!(".{}.staging", cfg.model.name));
        assert!(!staging.exists());
        TranslationService::load(&dir, &cfg).unwrap();
    }

    #[test]
    fn test_end_to_end_train_then_translate() {
        let root = tempfile::tempdir().unwrap();
        let cfg = tiny_config(root.path());

        // Empty data dir: the sample corpus is written automatically
        let outcome = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(outcome.model_dir, cfg.model_dir());
        assert!((1..=2).contains(&outcome.report.epochs_completed));
        assert_eq!(outcome.train_samples + outcome.val_samples, 30);

        let dir = cfg.model_dir();
        for file in ["model.mpk", "tokenizer.json", "model_config.json", "training_summary.json", "metrics.csv"] {
            assert!(dir.join(file).is_file(), "missing {file}");
        }
        assert!(!dir.join(LOCK_FILE).exists());

        let svc = TranslationService::load(&dir, &cfg).unwrap();
        let out = svc.translate("Hello, how are you?", "en", "ha").unwrap();
        assert!(!out.text.trim().is_empty());
        assert_eq!(svc.info().max_length, 16);

        // Warm start from the checkpoint just written
        let mut again = cfg.clone();
        again.model.base_model = dir.display().to_string();
        again.model.name = "continued".into();
        again.training.num_epochs = 1;
        let outcome = TrainUseCase::new(again.clone()).execute().unwrap();
        assert!(outcome.model_dir.join("tokenizer.json").is_file());
        TranslationService::load(&again.model_dir(), &again).unwrap();
    }
}
