#![allow(dead_code)]
#![recursion_limit = "256"]

mod api;
mod application;
mod cli;
mod data;
mod domain;
mod infra;
mod ml;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::filter::Directive;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("hausa_translator={level}").parse::<Directive>()?),
        )
        .init();

    cli.run()
}
