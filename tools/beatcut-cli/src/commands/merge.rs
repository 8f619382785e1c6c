//! Merge the head of one clip with the tail of another.

use std::path::PathBuf;

use beatcut_common::AppConfig;

pub fn run(
    config: &AppConfig,
    first: PathBuf,
    second: PathBuf,
    segment_secs: f64,
    music: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!(
        "Merging first {segment_secs}s of {} with last {segment_secs}s of {}",
        first.display(),
        second.display()
    );
    let renderer = super::renderer(config)?;
    super::report(renderer.render_head_tail(first, second, segment_secs, music))
}
