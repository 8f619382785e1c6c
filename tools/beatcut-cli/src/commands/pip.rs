//! Render a picture-in-picture video.

use std::path::PathBuf;

use beatcut_common::AppConfig;
use beatcut_project_model::{JobRequest, PipLayout, PipRequest, PipText, Position, TimeWindow};
use beatcut_render_engine::CancellationToken;

pub struct PipArgs {
    pub main: PathBuf,
    pub overlay: PathBuf,
    pub scale: f64,
    pub position: Position,
    pub opacity: f64,
    pub margin: u32,
    pub window: Option<TimeWindow>,
    pub text: Option<String>,
    pub text_size: Option<u32>,
    pub text_position: Position,
    pub music: Option<PathBuf>,
}

pub fn run(config: &AppConfig, args: PipArgs) -> anyhow::Result<()> {
    let layout = PipLayout {
        scale: args.scale,
        position: args.position,
        opacity: args.opacity,
        margin: args.margin,
    };
    println!(
        "Picture-in-picture: {} over {}",
        args.overlay.display(),
        args.main.display()
    );
    println!("  Scale: {} at {:?}", layout.scale, layout.position);

    let request = JobRequest::PictureInPicture(PipRequest {
        main: args.main,
        overlay: args.overlay,
        layout,
        overlay_window: args.window,
        text: args.text.map(|content| PipText {
            content,
            font_size: args.text_size,
            position: args.text_position,
        }),
        music: args.music,
    });

    let renderer = super::renderer(config)?;
    let job = renderer.job(request);
    super::report(renderer.run(&job, &CancellationToken::new()))
}
