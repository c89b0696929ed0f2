//! Codeflow CLI Application
//!
//! Terminal front end for the codeflow coding assistant: describe a task,
//! review the plan, run the generated code, and read the explanation.

mod args;
mod cli;
mod panels;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use codeflow_core::StoreBuilder;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let store = StoreBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize request store")?;

    let cli = Cli::new(store, TerminalRenderer::new(!no_color));

    info!("Codeflow started");

    match command {
        Run(args) => cli.run(&args).await,
        History(args) => cli.history(&args).await,
        Show(args) => cli.show(&args).await,
    }
}
