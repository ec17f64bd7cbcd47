// SPDX-License-Identifier: MIT OR Apache-2.0
//! `seam` - headless host for the dataflow graph engine
//!
//! Builds the demo graph, runs a fixed number of frames with a simulated
//! clock and logs what was evaluated and drawn. Halfway through, the graph
//! is rewired while it is live.
//!
//! ## Usage
//!
//! ```text
//! seam --config seam.ron --frames 30 --dump
//! ```

mod nodes;
mod scene;
mod settings;

use clap::Parser;
use scene::{Scene, SceneError};
use seam_graph::GraphEngine;
use settings::{RunnerSettings, SettingsError, SETTINGS_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "seam", version, about, long_about = None)]
struct Cli {
    /// Path to a RON settings file (defaults to ./seam.ron when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run, overriding the settings file
    #[arg(short, long)]
    frames: Option<u32>,

    /// Print frame stats and a final graph snapshot as JSON
    #[arg(long)]
    dump: bool,

    /// Write the effective settings to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    let settings = load_settings(&cli);

    let log_filter = match &settings {
        Ok(settings) => settings.log_filter.clone(),
        Err(_) => RunnerSettings::default().log_filter,
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting seam v{}", env!("CARGO_PKG_VERSION"));

    let result = settings
        .map_err(AppError::from)
        .and_then(|settings| run(&cli, &settings));
    if let Err(e) = result {
        tracing::error!("seam failed: {e}");
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> Result<RunnerSettings, SettingsError> {
    let default_path = PathBuf::from(SETTINGS_FILE_NAME);
    let mut settings = match &cli.config {
        Some(path) => RunnerSettings::load(path)?,
        None if default_path.is_file() => RunnerSettings::load(&default_path)?,
        None => RunnerSettings::default(),
    };
    if let Some(frames) = cli.frames {
        settings.frames = frames;
    }
    Ok(settings)
}

fn run(cli: &Cli, settings: &RunnerSettings) -> Result<(), AppError> {
    if let Some(path) = &cli.write_config {
        settings.save(path)?;
        tracing::info!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let registry = nodes::builtin_registry();
    let mut engine = GraphEngine::with_registry(registry, settings.engine.clone());
    let scene = Scene::build(&mut engine)?;

    for frame in 1..=settings.frames {
        let stats = engine.update(frame as f32 * settings.time_step);
        engine.draw();

        let drawn: Vec<&str> = engine
            .nodes_to_draw()
            .iter()
            .filter_map(|&id| engine.node(id))
            .map(|node| node.name())
            .collect();
        tracing::info!(
            frame = stats.frame,
            evaluated = stats.evaluated,
            ?drawn,
            "Frame complete"
        );
        if cli.dump {
            println!("{}", serde_json::to_string(&stats)?);
        }

        if settings.rewire_after == Some(frame) {
            scene.rewire(&mut engine)?;
        }
    }

    if cli.dump {
        println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::try_parse_from(["seam", "--frames", "3", "--dump"]).unwrap();
        assert_eq!(cli.frames, Some(3));
        assert!(cli.dump);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_run_without_dump() {
        let cli = Cli::try_parse_from(["seam"]).unwrap();
        let settings = RunnerSettings {
            frames: 6,
            rewire_after: Some(2),
            ..RunnerSettings::default()
        };
        run(&cli, &settings).unwrap();
    }
}
