//! Strictly CRM - Unified CLI
//!
//! Data-entry training game played in the terminal.

#![warn(missing_docs)]

mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use strictly_crm::{
    BuiltinCatalog, DrillConfig, GameController, GameSession, StageCatalog, TomlCatalog,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the game on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,strictly_crm=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Play {
            stages,
            config,
            delay_ms,
        } => run_play(stages, config, delay_ms).await,
        Command::Stages { stages, json } => run_stages(stages, json),
        Command::Check { file } => run_check(&file),
    }
}

/// Play the drill interactively
#[instrument]
async fn run_play(
    stages: Option<PathBuf>,
    config: Option<PathBuf>,
    delay_ms: Option<u64>,
) -> Result<()> {
    let mut drill_config = match config {
        Some(path) => DrillConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DrillConfig::default(),
    };
    if let Some(ms) = delay_ms {
        drill_config = drill_config.with_display_delay_ms(ms);
    }
    if let Some(path) = stages {
        drill_config = drill_config.with_stages_file(path);
    }

    let game = match drill_config.stages_file() {
        Some(path) => GameController::new(load_catalog(path)?),
        None => GameController::new(BuiltinCatalog),
    };
    info!(
        stages = game.stages().len(),
        delay_ms = drill_config.result_display_delay_ms(),
        "Starting drill"
    );

    terminal::run(GameSession::new(game, drill_config.display_delay())).await
}

/// List the stages of a catalog
#[instrument]
fn run_stages(stages: Option<PathBuf>, json: bool) -> Result<()> {
    let definitions = match stages {
        Some(path) => load_catalog(&path)?.load_stages(),
        None => BuiltinCatalog.load_stages(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    for stage in &definitions {
        let clock = match stage.time_limit_seconds() {
            Some(seconds) => format!("{}s", seconds),
            None => "untimed".to_string(),
        };
        println!(
            "{}. {} - {} fields, +{}/-{} per field, {}",
            stage.sequence_number(),
            stage.name(),
            stage.fields().len(),
            stage.points_per_correct_field(),
            stage.penalty_per_incorrect_field(),
            clock
        );
    }
    Ok(())
}

/// Validate a catalog file
#[instrument]
fn run_check(file: &Path) -> Result<()> {
    let catalog = load_catalog(file)?;
    println!(
        "{}: OK ({} stages)",
        file.display(),
        catalog.load_stages().len()
    );
    Ok(())
}

fn load_catalog(path: &Path) -> Result<TomlCatalog> {
    TomlCatalog::from_file(path).with_context(|| format!("loading stages {}", path.display()))
}
