// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure the translator can report, as one enum.
//
// Only per-record and per-file parse failures are recovered
// locally (the loader logs and skips them). Everything else
// travels up to the CLI (non-zero exit) or the HTTP layer
// (mapped to a status code in `api::ApiError`).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("malformed data in '{}': {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    #[error("no usable translation pairs: {0}")]
    EmptyDataset(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("training aborted by the backend (out of memory?): {0}")]
    Resource(String),

    #[error("invalid language: {0}")]
    InvalidLanguage(String),

    #[error("cannot load model from '{}': {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("output directory '{}' is in use by another training run", .0.display())]
    CheckpointInUse(PathBuf),

    #[error("translation failed: {0}")]
    Inference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslatorError {
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format { path: path.into(), reason: reason.into() }
    }

    pub fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad { path: path.into(), reason: reason.to_string() }
    }

    /// Short machine-readable name, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format { .. }       => "format_error",
            Self::EmptyDataset(_)     => "empty_dataset",
            Self::Config(_)           => "config_error",
            Self::Resource(_)         => "resource_error",
            Self::InvalidLanguage(_)  => "invalid_language",
            Self::ModelLoad { .. }    => "model_load_error",
            Self::InvalidRequest(_)   => "invalid_request",
            Self::CheckpointInUse(_)  => "checkpoint_in_use",
            Self::Inference(_)        => "inference_error",
            Self::Io(_)               => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_include_path() {
        let err = TranslatorError::format("data/pairs.csv", "missing hausa column");
        assert_eq!(
            err.to_string(),
            "malformed data in 'data/pairs.csv': missing hausa column"
        );
        assert_eq!(err.kind(), "format_error");
    }
}
