pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod session;
pub mod writer;

use std::io;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::EditorConfig;
use processor::catalog;

pub fn run() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path).with_context(|| format!("Loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Dump { level, area, root } => {
            let level = parser::load_level(&level, area, root.as_deref(), &config);
            writer::json::emit(&level, io::stdout().lock()).context("Writing level JSON")?;
        }
        Command::Behaviors { root } => {
            let behaviors = catalog::resolve_behaviors(&root, &config);
            writer::json::emit(&behaviors, io::stdout().lock()).context("Writing behavior list")?;
        }
        Command::Models { root, level } => {
            let models = match level {
                Some(level) => catalog::resolve_level_models(&level, &root, &config),
                None => catalog::resolve_models(&root, &config),
            };
            writer::json::emit(&models, io::stdout().lock()).context("Writing model list")?;
        }
        Command::Apply { objects: path } => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("Reading {}", path.display()))?;
            let mut objects = parser::load_from_json(&json).with_context(|| format!("Parsing {}", path.display()))?;

            let report = writer::patch::save(&mut objects, &config);
            writer::json::emit(&report, io::stdout().lock()).context("Writing save report")?;
            if !report.is_complete() {
                bail!("{} change(s) could not be saved", report.failed.len());
            }
        }
    }

    Ok(())
}
