//! pa-scenectl - smart-amp scene arbitration tool
//!
//! Usage:
//!   pa-scenectl table [--config scenes.json]
//!   pa-scenectl run [--config scenes.json] [--fail-profile 3] [--fail-next N] [--json] STEP...
//!
//! `run` replays scene transitions against a dry-run DSP and reports every
//! profile push, so a scene table can be checked without hardware.

mod replay;
mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pa_scene::{ProfileId, SceneConfig};

use crate::replay::{FailurePlan, replay};
use crate::script::parse_steps;

#[derive(Parser)]
#[command(name = "pa-scenectl", about = "Smart-amp scene arbitration tool")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved scene table
    Table {
        /// Scene config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Replay scene transitions against a dry-run DSP
    Run {
        /// Scene config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Make the DSP reject this profile (repeatable)
        #[arg(long = "fail-profile")]
        fail_profile: Vec<u32>,
        /// Make the next N pushes fail
        #[arg(long, default_value_t = 0)]
        fail_next: usize,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
        /// Steps: `<scene>+`, `<scene>-` or `resync`
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Table { config } => print_table(config.as_deref()),
        Commands::Run {
            config,
            fail_profile,
            fail_next,
            json,
            steps,
        } => run_steps(config.as_deref(), &fail_profile, fail_next, json, &steps),
    }
}

fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn print_table(config: Option<&Path>) -> Result<()> {
    let table = load_config(config)?
        .build_table()
        .context("Invalid scene table")?;
    print!("{}", table);
    Ok(())
}

fn run_steps(
    config: Option<&Path>,
    fail_profiles: &[u32],
    fail_next: usize,
    json: bool,
    raw_steps: &[String],
) -> Result<()> {
    let config = load_config(config)?;
    let steps = parse_steps(raw_steps)?;
    let failures = FailurePlan {
        profiles: fail_profiles.iter().copied().map(ProfileId).collect(),
        next: fail_next,
    };

    let run = replay(&config, &steps, &failures)?;
    print!("{}", run.render(json)?);
    if json {
        println!();
    }
    Ok(())
}
