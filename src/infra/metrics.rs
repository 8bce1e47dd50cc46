// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per epoch to <checkpoint>/metrics.csv.
//
//   epoch,train_loss,val_loss,val_token_acc
//   1,6.912300,6.801100,0.041000
//   2,5.102700,5.344400,0.118000
//
// val_loss / val_token_acc are blank when no validation set was
// held out. The header is written only when the file is new, so
// warm-started runs keep appending to the same log.
//
// How to read the metrics:
//   - train_loss falling, val_loss rising → overfitting; early
//     stopping will end the run after `early_stopping_patience`
//   - val_token_acc is teacher-forced next-token accuracy over
//     non-padding positions, not a translation quality score

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, TranslatorError};

pub const METRICS_FILE: &str = "metrics.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:         usize,
    pub train_loss:    f64,
    pub val_loss:      Option<f64>,
    pub val_token_acc: Option<f64>,
}

impl EpochMetrics {
    /// Without a validation loss there is nothing to compare, so
    /// every epoch counts as an improvement.
    pub fn is_improvement(&self, best_val_loss: Option<f64>) -> bool {
        match (self.val_loss, best_val_loss) {
            (Some(current), Some(best)) => current < best,
            _ => true,
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { csv_path: dir.join(METRICS_FILE) })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let is_new = !self.csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        writer.serialize(m).map_err(|e| csv_error(&self.csv_path, e))?;
        writer.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:?}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn csv_error(path: &Path, e: csv::Error) -> TranslatorError {
    TranslatorError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("cannot write '{}': {e}", path.display()),
    ))
}
