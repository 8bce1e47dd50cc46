// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// One checkpoint directory holds everything inference needs:
//
//   models/<name>/
//     model.mpk              ← weights (Burn CompactRecorder)
//     tokenizer.json         ← shared en+ha vocabulary
//     model_config.json      ← architecture + max_length
//     training_summary.json  ← when/how the run happened
//     metrics.csv            ← per-epoch losses
//     .training.lock         ← present only while a run is active
//
// Weights are recorded to `model_staging.mpk` and renamed over
// `model.mpk`, so an interrupted save never leaves a torn file
// where the server would look for weights.
//
// The lock file is created with `create_new`, which fails when
// the file exists, so two concurrent runs on one directory are
// refused instead of interleaving their saves.
//
// A training run never writes into the live directory. Everything
// goes to a `.<name>.staging/` sibling and is renamed into place
// by `StagedCheckpoint::commit` once the run has finished. A run
// that fails leaves the previous checkpoint exactly as it was.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, TranslatorError};
use crate::infra::{metrics::METRICS_FILE, tokenizer_store::TOKENIZER_FILE};
use crate::ml::model::{Seq2SeqConfig, Seq2SeqModel};

pub const MODEL_CONFIG_FILE: &str = "model_config.json";
pub const SUMMARY_FILE:      &str = "training_summary.json";
pub const LOCK_FILE:         &str = ".training.lock";

const WEIGHTS_STEM: &str = "model";
const STAGING_STEM: &str = "model_staging";
const WEIGHTS_EXT:  &str = "mpk";
const WEIGHTS_FILE: &str = "model.mpk";

/// Files a finished run moves from staging into the live directory
const RUN_FILES: [&str; 5] = [WEIGHTS_FILE, TOKENIZER_FILE, MODEL_CONFIG_FILE, SUMMARY_FILE, METRICS_FILE];

/// Everything needed to rebuild the network before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub architecture: Seq2SeqConfig,
    /// Longest source / target sequence the model was trained on
    pub max_length:   usize,
    /// Preset or checkpoint the run started from
    pub base_model:   String,
}

/// Written once at the end of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub completed_at:     DateTime<Utc>,
    pub base_model:       String,
    pub epochs_completed: usize,
    pub stopped_early:    bool,
    pub best_val_loss:    Option<f64>,
    pub train_samples:    usize,
    pub val_samples:      usize,
    pub bidirectional:    bool,
    pub vocab_size:       usize,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir` as a training output, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint for inference.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TranslatorError::model_load(&dir, "checkpoint directory does not exist"));
        }
        let manager = Self { dir };
        if !manager.config_path().is_file() {
            return Err(TranslatorError::model_load(
                &manager.dir,
                format!("missing {MODEL_CONFIG_FILE}; has this model been trained?"),
            ));
        }
        Ok(manager)
    }

    /// Whether `dir` looks like a checkpoint (used to tell a
    /// warm-start directory apart from an architecture preset).
    pub fn is_checkpoint(dir: &Path) -> bool {
        dir.join(MODEL_CONFIG_FILE).is_file()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(MODEL_CONFIG_FILE)
    }

    /// Record weights to the staging file, then rename over the live one.
    pub fn save_model<B: Backend>(&self, model: &Seq2SeqModel<B>) -> Result<()> {
        // The recorder appends the extension itself
        let staging_stem = self.dir.join(STAGING_STEM);
        CompactRecorder::new()
            .record(model.clone().into_record(), staging_stem.clone())
            .map_err(|e| {
                TranslatorError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("cannot record weights to '{}': {e}", staging_stem.display()),
                ))
            })?;

        let staged = staging_stem.with_extension(WEIGHTS_EXT);
        fs::rename(&staged, self.weights_path())?;
        tracing::debug!("Saved weights to '{}'", self.weights_path().display());
        Ok(())
    }

    /// Load weights into a freshly initialised model of matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  Seq2SeqModel<B>,
        device: &B::Device,
    ) -> Result<Seq2SeqModel<B>> {
        let path = self.weights_path();
        if !path.is_file() {
            return Err(TranslatorError::model_load(&path, "weights file not found"));
        }
        let record = CompactRecorder::new()
            .load(self.dir.join(WEIGHTS_STEM), device)
            .map_err(|e| TranslatorError::model_load(&path, e))?;

        // load_record takes tensors as recorded, whatever their shape
        let expected = model.weight_shapes();
        let model = model.load_record(record);
        for ((name, want), (_, got)) in expected.iter().zip(model.weight_shapes()) {
            if *want != got {
                return Err(TranslatorError::model_load(
                    &path,
                    format!("{name} weight is {got:?} but the architecture expects {want:?}"),
                ));
            }
        }
        Ok(model)
    }

    pub fn save_config(&self, cfg: &CheckpointConfig) -> Result<()> {
        write_json(&self.config_path(), cfg)
    }

    pub fn load_config(&self) -> Result<CheckpointConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path).map_err(|e| TranslatorError::model_load(&path, e))?;
        serde_json::from_str(&json).map_err(|e| TranslatorError::model_load(&path, e))
    }

    pub fn save_summary(&self, summary: &TrainingSummary) -> Result<()> {
        write_json(&self.dir.join(SUMMARY_FILE), summary)
    }

    /// Claim the directory for one training run.
    pub fn lock(&self) -> Result<TrainingLock> {
        let path = self.dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                writeln!(f, "pid={}", std::process::id())?;
                Ok(TrainingLock { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(TranslatorError::CheckpointInUse(self.dir.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Start a fresh staging directory next to this one. Call with
    /// the lock held; a leftover staging dir from a crashed run is
    /// discarded.
    pub fn stage(&self) -> Result<StagedCheckpoint> {
        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "checkpoint".to_string());
        let staging_dir = self.dir.with_file_name(format!(".{name}.staging"));
        if staging_dir.exists() {
            tracing::warn!("Discarding stale staging dir '{}'", staging_dir.display());
            fs::remove_dir_all(&staging_dir)?;
        }
        fs::create_dir_all(&staging_dir)?;

        // Warm-started runs keep appending to the existing log
        let live_metrics = self.dir.join(METRICS_FILE);
        if live_metrics.is_file() {
            fs::copy(&live_metrics, staging_dir.join(METRICS_FILE))?;
        }

        Ok(StagedCheckpoint {
            staging:   CheckpointManager { dir: staging_dir },
            live:      self.dir.clone(),
            committed: false,
        })
    }
}

// ─── StagedCheckpoint ─────────────────────────────────────────────────────────
/// Output of a run in progress. Dropped without `commit`, the
/// staging directory is deleted and the live checkpoint is untouched.
pub struct StagedCheckpoint {
    staging:   CheckpointManager,
    live:      PathBuf,
    committed: bool,
}

impl StagedCheckpoint {
    /// Where the run writes weights, tokenizer, config and metrics
    pub fn manager(&self) -> &CheckpointManager {
        &self.staging
    }

    /// Move the finished run into the live directory. The config is
    /// renamed after the weights and tokenizer it describes.
    pub fn commit(mut self) -> Result<()> {
        let weights = self.staging.weights_path();
        if !weights.is_file() {
            return Err(TranslatorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("run finished without saving weights to '{}'", weights.display()),
            )));
        }
        for file in RUN_FILES {
            let from = self.staging.dir.join(file);
            if from.is_file() {
                fs::rename(&from, self.live.join(file))?;
            }
        }
        fs::remove_dir_all(&self.staging.dir)?;
        self.committed = true;
        tracing::debug!("Committed run into '{}'", self.live.display());
        Ok(())
    }
}

impl Drop for StagedCheckpoint {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.staging.dir) {
            tracing::warn!("Could not remove staging dir '{}': {e}", self.staging.dir.display());
        }
    }
}

/// Removes the lock file when dropped, including on error paths.
pub struct TrainingLock {
    path: PathBuf,
}

impl Drop for TrainingLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Could not remove lock '{}': {e}", self.path.display());
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{model::preset, InferBackend};

    fn tiny() -> CheckpointConfig {
        CheckpointConfig {
            architecture: preset("seq2seq-tiny", 20, 16).unwrap(),
            max_length:   16,
            base_model:   "seq2seq-tiny".into(),
        }
    }

    #[test]
    fn test_second_lock_is_refused_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();

        let first = ckpt.lock().unwrap();
        assert!(matches!(ckpt.lock(), Err(TranslatorError::CheckpointInUse(_))));
        drop(first);
        assert!(!dir.path().join(LOCK_FILE).exists());
        ckpt.lock().unwrap();
    }

    #[test]
    fn test_open_requires_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CheckpointManager::open(dir.path()),
            Err(TranslatorError::ModelLoad { .. })
        ));
        assert!(matches!(
            CheckpointManager::open(dir.path().join("absent")),
            Err(TranslatorError::ModelLoad { .. })
        ));

        CheckpointManager::create(dir.path()).unwrap().save_config(&tiny()).unwrap();
        assert!(CheckpointManager::is_checkpoint(dir.path()));
        let cfg = CheckpointManager::open(dir.path()).unwrap().load_config().unwrap();
        assert_eq!(cfg.max_length, 16);
        assert_eq!(cfg.architecture.vocab_size, 20);
    }

    #[test]
    fn test_weights_round_trip_through_staging() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let device = Default::default();
        let cfg = tiny();

        let model = cfg.architecture.init::<InferBackend>(&device);
        ckpt.save_model(&model).unwrap();
        assert!(ckpt.weights_path().is_file());
        assert!(!dir.path().join("model_staging.mpk").exists());

        let fresh = cfg.architecture.init::<InferBackend>(&device);
        ckpt.load_model(fresh, &device).unwrap();
    }

    #[test]
    fn test_mismatched_weights_are_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let device = Default::default();
        ckpt.save_model(&tiny().architecture.init::<InferBackend>(&device)).unwrap();

        let wider = preset("seq2seq-tiny", 40, 16).unwrap().init::<InferBackend>(&device);
        assert!(matches!(
            ckpt.load_model(wider, &device),
            Err(TranslatorError::ModelLoad { .. })
        ));

        let longer = preset("seq2seq-tiny", 20, 32).unwrap().init::<InferBackend>(&device);
        assert!(matches!(
            ckpt.load_model(longer, &device),
            Err(TranslatorError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_commit_moves_staged_run_into_place() {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("translator");
        let ckpt = CheckpointManager::create(&live).unwrap();
        fs::write(live.join(METRICS_FILE), "epoch,train_loss,val_loss,val_token_acc\n").unwrap();

        let staged = ckpt.stage().unwrap();
        let staging_dir = staged.manager().dir().to_path_buf();
        assert_eq!(staging_dir, root.path().join(".translator.staging"));
        // Existing log carried over so the run appends to it
        assert!(staging_dir.join(METRICS_FILE).is_file());

        staged.manager().save_config(&tiny()).unwrap();
        staged.manager().save_model(&tiny().architecture.init::<InferBackend>(&Default::default())).unwrap();
        assert!(!CheckpointManager::is_checkpoint(&live));

        staged.commit().unwrap();
        assert!(CheckpointManager::is_checkpoint(&live));
        assert!(live.join(WEIGHTS_FILE).is_file());
        assert!(!staging_dir.exists());
    }

    #[test]
    fn test_abandoned_stage_leaves_live_dir_alone() {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("translator");
        let ckpt = CheckpointManager::create(&live).unwrap();
        ckpt.save_config(&tiny()).unwrap();
        let before = fs::read(live.join(MODEL_CONFIG_FILE)).unwrap();

        let staged = ckpt.stage().unwrap();
        let staging_dir = staged.manager().dir().to_path_buf();
        let mut changed = tiny();
        changed.max_length = 8;
        staged.manager().save_config(&changed).unwrap();
        drop(staged);

        assert!(!staging_dir.exists());
        assert_eq!(fs::read(live.join(MODEL_CONFIG_FILE)).unwrap(), before);
    }

    #[test]
    fn test_commit_without_weights_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(root.path().join("translator")).unwrap();
        let staged = ckpt.stage().unwrap();
        staged.manager().save_config(&tiny()).unwrap();
        assert!(staged.commit().is_err());
        assert!(!CheckpointManager::is_checkpoint(&root.path().join("translator")));
    }

    #[test]
    fn test_missing_weights_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let model = tiny().architecture.init::<InferBackend>(&Default::default());
        assert!(matches!(
            ckpt.load_model(model, &Default::default()),
            Err(TranslatorError::ModelLoad { .. })
        ));
    }
}
