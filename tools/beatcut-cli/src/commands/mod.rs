//! Subcommand implementations.

pub mod batch;
pub mod beat;
pub mod check;
pub mod merge;
pub mod pip;
pub mod preview;
pub mod probe;
pub mod still;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use beatcut_common::{AppConfig, RenderError};
use beatcut_project_model::RenderOutput;
use beatcut_render_engine::{FfmpegEngine, MediaEngine, Renderer};

/// Explicit config file, or the standard location with defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

/// Renderer backed by ffmpeg, validated before any job runs.
pub fn renderer(config: &AppConfig) -> anyhow::Result<Renderer> {
    let engine: Arc<dyn MediaEngine> = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let info = engine
        .validate()
        .context("Media engine is not usable (run `beatcut check`)")?;
    tracing::debug!(engine = %info.name, version = %info.version, "Engine ready");
    Ok(Renderer::new(engine, config))
}

/// Print a finished render, or turn a failed one into an error.
pub fn report(result: Result<RenderOutput, RenderError>) -> anyhow::Result<()> {
    match result {
        Ok(output) => {
            println!("Render complete: {}", output.path.display());
            println!("  Duration: {:.2}s", output.duration_secs);
            if !output.has_audio {
                println!("  Audio: none (kept silent render)");
            }
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err)),
    }
}
