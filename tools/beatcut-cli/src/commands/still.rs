//! Write one frame of a beat cut, with its effects, as a PNG.

use std::path::PathBuf;

use beatcut_common::AppConfig;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    beats: Vec<f64>,
    beat: usize,
    at: f64,
    out: PathBuf,
) -> anyhow::Result<()> {
    if beat == 0 {
        anyhow::bail!("beats are numbered from 1");
    }
    let renderer = super::renderer(config)?;
    let still = renderer.render_beat_still(&path, &beats, beat - 1, at, &out)?;

    println!("Still written: {}", still.output.display());
    println!(
        "  Beat {}: {:.2}s, frame at {:.3}s ({:.3}s into the cut)",
        beat, still.beat_secs, still.source_secs, still.clip_secs
    );
    println!("  Size: {}x{}", still.width, still.height);
    for skipped in &still.skipped {
        println!("  Skipped {skipped}");
    }
    Ok(())
}
