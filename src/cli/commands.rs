// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `serve` and `translate`.
//
// Every flag is optional: anything not given on the command line
// comes from the YAML config (`--config`, else ./config.yaml,
// else built-in defaults).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::infra::config::AppConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the translation model on the corpus in the data directory
    Train(TrainArgs),

    /// Serve the trained model over HTTP
    Serve(ServeArgs),

    /// Translate one text and print the result
    Translate(TranslateArgs),
}

impl Commands {
    pub fn debug(&self) -> bool {
        match self {
            Commands::Train(a)     => a.common.debug,
            Commands::Serve(a)     => a.common.debug,
            Commands::Translate(a) => a.common.debug,
        }
    }
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,
}

impl CommonArgs {
    pub fn load_config(&self) -> crate::domain::error::Result<AppConfig> {
        AppConfig::resolve(self.config.as_deref())
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory holding .json/.csv/.txt parallel corpus files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Where the checkpoint is written (default: models_dir/model.name)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Write the built-in sample corpus into the data directory first
    #[arg(long)]
    pub create_sample: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Checkpoint directory (default: models_dir/model.name)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Text to translate
    #[arg(long)]
    pub text: String,

    /// Source language tag (en or ha)
    #[arg(long, default_value = "en")]
    pub source: String,

    /// Target language tag (en or ha)
    #[arg(long, default_value = "ha")]
    pub target: String,

    /// Checkpoint directory (default: models_dir/model.name)
    #[arg(long)]
    pub model_dir: Option<PathBuf>,
}
