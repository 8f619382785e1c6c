//! Render a beat video.

use std::path::PathBuf;

use beatcut_common::AppConfig;

pub fn run(
    config: &AppConfig,
    source_a: PathBuf,
    source_b: PathBuf,
    beats: Vec<f64>,
    speed: f64,
    font_size: u32,
    music: Option<PathBuf>,
) -> anyhow::Result<()> {
    if beats.is_empty() {
        println!("No beats given; output will contain the second clip only.");
    }
    println!("Beat video: {} + {}", source_a.display(), source_b.display());
    println!("  Beats: {beats:?}");
    println!("  Speed: {speed}x");

    let renderer = super::renderer(config)?;
    super::report(renderer.render_beat_video(source_a, source_b, beats, speed, font_size, music))
}
