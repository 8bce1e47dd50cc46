// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, merges them over the YAML config
// and hands off to Layer 2. Library errors arrive here as
// TranslatorError and leave as anyhow errors, which `main`
// turns into a non-zero exit code.
//
//   1. `train`     - fine-tune on the data directory
//   2. `serve`     - load the checkpoint, then start the HTTP API
//   3. `translate` - one-shot translation to stdout

pub mod commands;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, ServeArgs, TrainArgs, TranslateArgs};

use crate::api::{self, AppState};
use crate::application::{train_use_case::TrainUseCase, translate_use_case::TranslationService};

#[derive(Parser, Debug)]
#[command(
    name = "hausa-translator",
    version,
    about = "Fine-tune and serve an English <-> Hausa translation model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn debug(&self) -> bool {
        self.command.debug()
    }

    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Serve(args)     => run_serve(args),
            Commands::Translate(args) => run_translate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(dir) = args.data_dir {
        config.paths.data_dir = dir;
    }
    let output_dir = args.output_dir.unwrap_or_else(|| config.model_dir());

    tracing::info!("Starting training on corpus in: {}", config.paths.data_dir.display());
    let outcome = TrainUseCase::new(config)
        .with_output_dir(output_dir)
        .with_sample(args.create_sample)
        .execute()?;

    println!(
        "Training complete after {} epoch(s). Checkpoint saved to '{}'.",
        outcome.report.epochs_completed,
        outcome.model_dir.display()
    );
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = args.common.load_config()?;
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    let model_dir = args.model_dir.unwrap_or_else(|| config.model_dir());

    // Refuse to listen without a model
    let service = TranslationService::load(&model_dir, &config)?;

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.api.host, config.api.port))?;

    let runtime = tokio::runtime::Runtime::new().context("cannot start the async runtime")?;
    runtime.block_on(api::serve(AppState::new(service), addr))
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    let config = args.common.load_config()?;
    let model_dir = args.model_dir.unwrap_or_else(|| config.model_dir());

    let service = TranslationService::load(&model_dir, &config)?;
    let result = service.translate(&args.text, &args.source, &args.target)?;
    println!("{}", result.text);
    Ok(())
}
