//! Show the window around each beat.

use std::path::PathBuf;

use beatcut_common::{format_clock, AppConfig};

pub fn run(config: &AppConfig, path: PathBuf, beats: Vec<f64>, window: f64) -> anyhow::Result<()> {
    let renderer = super::renderer(config)?;
    let previews = renderer.preview_beat_windows(&path, &beats, window)?;

    println!("Beat preview: {}", path.display());
    for preview in &previews {
        if preview.in_range {
            println!(
                "  Beat {}: {:.2}s (preview {} - {}, {:.2}s - {:.2}s)",
                preview.index + 1,
                preview.beat_secs,
                format_clock(preview.start_secs),
                format_clock(preview.end_secs),
                preview.start_secs,
                preview.end_secs,
            );
        } else {
            println!(
                "  Beat {}: {:.2}s (past the end of the clip, skipped)",
                preview.index + 1,
                preview.beat_secs
            );
        }
    }
    Ok(())
}
