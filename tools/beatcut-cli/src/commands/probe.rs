//! Show media information.

use std::path::PathBuf;

use beatcut_common::{format_clock, AppConfig};
use beatcut_render_engine::{FfmpegEngine, MediaEngine};

pub fn run(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    let engine = FfmpegEngine::new(config.engine.clone());
    let info = engine.probe(&path)?;

    println!("File: {}", path.display());
    if let Some(format) = &info.format_name {
        println!("  Container: {format}");
    }
    match info.duration_secs {
        Some(secs) => println!("  Duration: {secs:.3}s ({})", format_clock(secs)),
        None => println!("  Duration: unknown"),
    }
    if info.has_video {
        println!("  Video: {}x{}", info.width, info.height);
    } else {
        println!("  Video: none");
    }
    println!("  Audio: {}", if info.has_audio { "yes" } else { "no" });
    Ok(())
}
