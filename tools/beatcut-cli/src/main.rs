//! beatcut CLI: render beat videos, picture-in-picture and merges.
//!
//! Usage:
//!   beatcut beat <A> <B> --beats 1,3,5   Beat cuts of A, then B sped up
//!   beatcut pip <MAIN> <OVERLAY>         Overlay one clip on another
//!   beatcut merge <FIRST> <SECOND>       Head of FIRST + tail of SECOND
//!   beatcut probe <PATH>                 Show media information
//!   beatcut preview <PATH> --beats ...   Show the window around each beat
//!   beatcut still <PATH> --beats ...     Write one beat frame as a PNG
//!   beatcut check                        Check the media engine
//!   beatcut batch <JOBS.json>            Render a list of jobs on the pool

use std::path::PathBuf;

use beatcut_project_model::{Position, TimeWindow};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "beatcut",
    about = "Beat-synced short video assembly on top of ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/beatcut/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory (overrides the configuration)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Beat cuts of one clip followed by a sped-up second clip
    Beat {
        /// Clip the beat cuts are taken from
        source_a: PathBuf,

        /// Clip played after the beat cuts
        source_b: PathBuf,

        /// Beat times in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        beats: Vec<f64>,

        /// Playback speed of the second clip
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Timer font size in pixels
        #[arg(long, default_value = "60")]
        font_size: u32,

        /// Background music
        #[arg(long)]
        music: Option<PathBuf>,
    },

    /// Draw one clip scaled down over another
    Pip {
        /// Full-canvas clip
        main: PathBuf,

        /// Clip drawn on top
        overlay: PathBuf,

        /// Overlay size as a fraction of the canvas
        #[arg(long, default_value = "0.25")]
        scale: f64,

        /// Anchor name (top-left, top-right, bottom-left, bottom-right, center) or x,y
        #[arg(long, default_value = "top-right")]
        position: Position,

        /// Overlay opacity [0.0, 1.0]
        #[arg(long, default_value = "1.0")]
        opacity: f64,

        /// Margin from the canvas edges in pixels
        #[arg(long, default_value = "10")]
        margin: u32,

        /// Show the overlay from this second on
        #[arg(long)]
        overlay_start: Option<f64>,

        /// Show the overlay for this many seconds
        #[arg(long, requires = "overlay_start")]
        overlay_duration: Option<f64>,

        /// Text drawn in a box over the video (e.g. a score)
        #[arg(long)]
        text: Option<String>,

        /// Text font size (defaults to canvas width / 40)
        #[arg(long)]
        text_size: Option<u32>,

        /// Text position
        #[arg(long, default_value = "top-left")]
        text_position: Position,

        /// Background music
        #[arg(long)]
        music: Option<PathBuf>,
    },

    /// The opening of one clip followed by the ending of another
    Merge {
        first: PathBuf,

        second: PathBuf,

        /// Seconds taken from each clip
        #[arg(long, default_value = "10.0")]
        segment_secs: f64,

        /// Background music
        #[arg(long)]
        music: Option<PathBuf>,
    },

    /// Show media information
    Probe {
        path: PathBuf,
    },

    /// Show the window around each beat without rendering
    Preview {
        path: PathBuf,

        /// Beat times in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        beats: Vec<f64>,

        /// Preview window length in seconds
        #[arg(long, default_value = "2.0")]
        window: f64,
    },

    /// Write one frame of a beat cut, effects applied, as a PNG
    Still {
        path: PathBuf,

        /// Beat times in seconds, comma separated
        #[arg(long, value_delimiter = ',')]
        beats: Vec<f64>,

        /// Beat to show, counting from 1
        #[arg(long, default_value = "1")]
        beat: usize,

        /// Seconds into the beat cut
        #[arg(long, default_value = "0.0")]
        at: f64,

        /// PNG to write
        #[arg(long, default_value = "still.png")]
        out: PathBuf,
    },

    /// Check that ffmpeg and ffprobe work
    Check,

    /// Render a JSON list of jobs on the worker pool
    Batch {
        /// JSON file holding an array of job requests
        jobs: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    beatcut_common::logging::init_logging(&config.logging);
    config.validate()?;

    match cli.command {
        Commands::Beat {
            source_a,
            source_b,
            beats,
            speed,
            font_size,
            music,
        } => commands::beat::run(&config, source_a, source_b, beats, speed, font_size, music),
        Commands::Pip {
            main,
            overlay,
            scale,
            position,
            opacity,
            margin,
            overlay_start,
            overlay_duration,
            text,
            text_size,
            text_position,
            music,
        } => {
            let window = overlay_start.map(|start| {
                TimeWindow::new(start, overlay_duration.unwrap_or(f64::MAX))
            });
            commands::pip::run(
                &config,
                commands::pip::PipArgs {
                    main,
                    overlay,
                    scale,
                    position,
                    opacity,
                    margin,
                    window,
                    text,
                    text_size,
                    text_position,
                    music,
                },
            )
        }
        Commands::Merge {
            first,
            second,
            segment_secs,
            music,
        } => commands::merge::run(&config, first, second, segment_secs, music),
        Commands::Probe { path } => commands::probe::run(&config, path),
        Commands::Preview {
            path,
            beats,
            window,
        } => commands::preview::run(&config, path, beats, window),
        Commands::Still {
            path,
            beats,
            beat,
            at,
            out,
        } => commands::still::run(&config, path, beats, beat, at, out),
        Commands::Check => commands::check::run(&config),
        Commands::Batch { jobs } => commands::batch::run(&config, jobs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_still_args() {
        let cli = Cli::try_parse_from([
            "beatcut", "still", "a.mp4", "--beats", "1.5,3", "--beat", "2", "--at", "0.25",
            "-o", "renders",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("renders")));
        match cli.command {
            Commands::Still {
                beats, beat, at, out, ..
            } => {
                assert_eq!(beats, vec![1.5, 3.0]);
                assert_eq!((beat, at), (2, 0.25));
                assert_eq!(out, PathBuf::from("still.png"));
            }
            _ => panic!("expected the still command"),
        }
    }
}
