//! Check the media engine.

use beatcut_common::AppConfig;
use beatcut_render_engine::{FfmpegEngine, MediaEngine};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("beatcut System Check");
    println!("{}", "=".repeat(50));

    let engine = FfmpegEngine::new(config.engine.clone());
    let ready = match engine.validate() {
        Ok(info) => {
            println!("[OK] Engine: {} {}", info.name, info.version);
            true
        }
        Err(e) => {
            println!("[FAIL] Engine: {e}");
            false
        }
    };

    println!(
        "[OK] Canvas: {}x{} @ {}fps",
        config.engine.canvas_width, config.engine.canvas_height, config.engine.fps
    );
    println!("[OK] Output directory: {}", config.output_dir.display());
    println!("[OK] Scratch root: {}", config.scratch_root.display());
    println!("[OK] Workers: {}", config.workers.threads);

    println!();
    if ready {
        println!("beatcut is ready.");
        Ok(())
    } else {
        anyhow::bail!("ffmpeg/ffprobe are required; install them or set engine.tools in the config")
    }
}
