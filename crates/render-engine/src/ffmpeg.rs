//! ffmpeg/ffprobe implementation of [`MediaEngine`].

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::Context;
use beatcut_common::{BeatcutError, BeatcutResult, EngineConfig, FrameClock, VideoCodecConfig};
use beatcut_project_model::AudioTrack;
use serde::Deserialize;

use crate::compositor::Composition;
use crate::engine::{EncodeProgress, EngineInfo, MediaEngine, ProbeInfo};
use crate::filter_graph::{build_filter_graph, FilterGraph, OUTPUT_LABEL};
use crate::process::{command_exists, last_lines, run_with_timeout};

const VERSION_TIMEOUT: Duration = Duration::from_secs(15);
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Media engine backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: EngineConfig,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn ffmpeg(&self) -> &Path {
        &self.config.tools.ffmpeg
    }

    fn ffprobe(&self) -> &Path {
        &self.config.tools.ffprobe
    }

    fn run_ffmpeg(
        &self,
        args: &[String],
        expected_duration_secs: f64,
        progress: Option<&dyn Fn(EncodeProgress)>,
    ) -> Result<(), String> {
        tracing::debug!(binary = %self.ffmpeg().display(), args = ?args, "Running ffmpeg");
        let mut cmd = Command::new(self.ffmpeg());
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| format!("Failed to start ffmpeg: {e}"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| "Failed to capture ffmpeg stdout".to_string())?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| "Failed to capture ffmpeg stderr".to_string())?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let total_frames = FrameClock::new(self.config.fps).frames_for(expected_duration_secs);
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut latest = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| format!("Failed reading ffmpeg progress: {e}"))?;
            if bytes == 0 {
                break;
            }
            if let Some((key, value)) = line.trim().split_once('=') {
                latest.update(key, value);
                if key == "progress" {
                    if let Some(cb) = progress {
                        cb(progress_report(
                            &latest,
                            total_frames,
                            expected_duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| format!("Failed to wait on ffmpeg: {e}"))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(format!(
                "ffmpeg exited with {status}: {}",
                last_lines(&stderr_output, 20)
            ));
        }
        tracing::debug!(elapsed_secs = start.elapsed().as_secs_f64(), "ffmpeg finished");
        Ok(())
    }
}

impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn validate(&self) -> BeatcutResult<EngineInfo> {
        for binary in [self.ffmpeg(), self.ffprobe()] {
            let name = binary.to_string_lossy();
            if !command_exists(&name) {
                return Err(BeatcutError::config(format!(
                    "{name} not found; install ffmpeg or set engine.tools in the config"
                )));
            }
        }

        let mut cmd = Command::new(self.ffmpeg());
        cmd.arg("-version");
        let output = run_with_timeout(cmd, VERSION_TIMEOUT)
            .context("ffmpeg -version failed")?;
        let version = parse_version_line(&output.stdout)
            .unwrap_or_else(|| "unknown".to_string());
        tracing::info!(version = %version, "ffmpeg engine validated");
        Ok(EngineInfo {
            name: self.name().to_string(),
            version,
        })
    }

    fn probe(&self, path: &Path) -> BeatcutResult<ProbeInfo> {
        let mut cmd = Command::new(self.ffprobe());
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
        let output = run_with_timeout(cmd, PROBE_TIMEOUT)
            .map_err(|e| BeatcutError::source_unavailable(path, e.to_string()))?;
        parse_probe_output(&output.stdout)
            .map_err(|e| BeatcutError::source_unavailable(path, e.to_string()))
    }

    fn extract_segment(
        &self,
        source: &Path,
        start_secs: f64,
        duration_secs: f64,
        out: &Path,
    ) -> BeatcutResult<()> {
        let args = extract_args(source, start_secs, duration_secs, out, &self.config.video);
        self.run_ffmpeg(&args, duration_secs, None).map_err(|e| {
            BeatcutError::extraction(format!(
                "{} [{start_secs:.3}s +{duration_secs:.3}s]: {e}",
                source.display()
            ))
        })
    }

    fn extract_frame(&self, source: &Path, at_secs: f64, out: &Path) -> BeatcutResult<()> {
        let args = frame_args(source, at_secs, out);
        self.run_ffmpeg(&args, 0.0, None).map_err(|e| {
            BeatcutError::extraction(format!("{} [frame at {at_secs:.3}s]: {e}", source.display()))
        })
    }

    fn encode(
        &self,
        composition: &Composition,
        out: &Path,
        progress: Option<&dyn Fn(EncodeProgress)>,
    ) -> BeatcutResult<()> {
        let graph = build_filter_graph(composition);
        let args = encode_args(&graph, composition, out, &self.config.video);
        tracing::info!(
            inputs = graph.inputs.len(),
            duration_secs = composition.duration_secs,
            output = %out.display(),
            "Encoding silent video"
        );
        self.run_ffmpeg(&args, composition.duration_secs, progress)
            .map_err(BeatcutError::encode)
    }

    fn render_audio(&self, track: &AudioTrack, out: &Path) -> BeatcutResult<()> {
        let args = audio_args(track, out, self.config.audio.sample_rate);
        self.run_ffmpeg(&args, track.target_secs, None)
            .map_err(|e| anyhow::anyhow!("audio preparation failed: {e}"))?;
        Ok(())
    }
}

/// Encoder arguments from the configured codec settings.
pub fn codec_args(video: &VideoCodecConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        video.codec.clone(),
        "-preset".to_string(),
        video.preset.clone(),
        "-crf".to_string(),
        video.crf.to_string(),
        "-pix_fmt".to_string(),
        video.pix_fmt.clone(),
    ]
}

fn base_args() -> Vec<String> {
    ["-y", "-hide_banner", "-nostats", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Single RGBA frame at `at_secs`, written as a PNG.
pub fn frame_args(source: &Path, at_secs: f64, out: &Path) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-ss".to_string(),
        format!("{:.6}", at_secs.max(0.0)),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-update".to_string(),
        "1".to_string(),
        out.to_string_lossy().into_owned(),
    ]);
    args
}

/// Re-encoding cut of one segment. Audio is dropped; music is muxed later.
pub fn extract_args(
    source: &Path,
    start_secs: f64,
    duration_secs: f64,
    out: &Path,
    video: &VideoCodecConfig,
) -> Vec<String> {
    let mut args = base_args();
    args.extend([
        "-ss".to_string(),
        format!("{start_secs:.6}"),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-t".to_string(),
        format!("{duration_secs:.6}"),
        "-an".to_string(),
    ]);
    args.extend(codec_args(video));
    args.extend([
        "-avoid_negative_ts".to_string(),
        "make_zero".to_string(),
        "-fflags".to_string(),
        "+genpts".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out.to_string_lossy().into_owned(),
    ]);
    args
}

/// Full encode of a composition with progress on stdout.
pub fn encode_args(
    graph: &FilterGraph,
    composition: &Composition,
    out: &Path,
    video: &VideoCodecConfig,
) -> Vec<String> {
    let mut args = base_args();
    args.extend(["-progress".to_string(), "pipe:1".to_string()]);
    for input in &graph.inputs {
        args.extend([
            "-t".to_string(),
            format!("{:.6}", input.read_secs),
            "-i".to_string(),
            input.path.to_string_lossy().into_owned(),
        ]);
    }
    args.extend([
        "-filter_complex".to_string(),
        graph.graph.clone(),
        "-map".to_string(),
        format!("[{OUTPUT_LABEL}]"),
        "-an".to_string(),
        "-r".to_string(),
        composition.fps.to_string(),
    ]);
    args.extend(codec_args(video));
    args.extend([
        "-t".to_string(),
        format!("{:.6}", composition.duration_secs),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out.to_string_lossy().into_owned(),
    ]);
    args
}

/// Loop the track `copies` times, then trim to the target as PCM.
pub fn audio_args(track: &AudioTrack, out: &Path, sample_rate: u32) -> Vec<String> {
    let mut args = base_args();
    if track.needs_loop() {
        args.extend([
            "-stream_loop".to_string(),
            (track.copies - 1).to_string(),
        ]);
    }
    args.extend([
        "-i".to_string(),
        track.path.to_string_lossy().into_owned(),
        "-t".to_string(),
        format!("{:.6}", track.target_secs),
        "-vn".to_string(),
        "-ac".to_string(),
        "2".to_string(),
        "-ar".to_string(),
        sample_rate.to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        out.to_string_lossy().into_owned(),
    ]);
    args
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(json: &str) -> BeatcutResult<ProbeInfo> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let parse_secs = |raw: &Option<String>| {
        raw.as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    };
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration))
        .or_else(|| parsed.streams.iter().find_map(|s| parse_secs(&s.duration)));

    Ok(ProbeInfo {
        duration_secs,
        width: video.and_then(|v| v.width).unwrap_or(0),
        height: video.and_then(|v| v.height).unwrap_or(0),
        has_video: video.is_some(),
        has_audio,
        format_name: parsed.format.and_then(|f| f.format_name),
    })
}

fn parse_version_line(stdout: &str) -> Option<String> {
    let first = stdout.lines().next()?;
    let rest = first.strip_prefix("ffmpeg version ")?;
    rest.split_whitespace().next().map(str::to_string)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> EncodeProgress {
    let progress = if state.complete {
        1.0
    } else if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    EncodeProgress {
        progress,
        frames_rendered: (progress * total_frames as f64).round() as u64,
        total_frames,
        eta_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::TimelineAssembler;
    use beatcut_project_model::{CanvasSize, Clip, Timeline, TimelineSlot};

    const PROBE_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "width": 1280, "height": 720, "duration": "12.000000"},
            {"index": 1, "codec_type": "audio", "duration": "11.980000"}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "12.012000"}
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(PROBE_JSON).unwrap();
        assert_eq!(info.duration_secs, Some(12.012));
        assert_eq!((info.width, info.height), (1280, 720));
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!(info.format_name.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
    }

    #[test]
    fn test_parse_probe_audio_only_falls_back_to_stream_duration() {
        let json = r#"{"streams": [{"codec_type": "audio", "duration": "30.5"}], "format": {"duration": "N/A"}}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration_secs, Some(30.5));
        assert!(!info.has_video);
        assert_eq!(info.width, 0);
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        assert!(matches!(
            parse_probe_output("not json"),
            Err(BeatcutError::Json(_))
        ));
    }

    #[test]
    fn test_extract_args() {
        let args = extract_args(
            Path::new("in.mp4"),
            0.9,
            1.0,
            Path::new("out.mp4"),
            &VideoCodecConfig::default(),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-ss 0.900000 -i in.mp4 -t 1.000000 -an"));
        assert!(joined.contains("-c:v libx264 -preset medium -crf 18 -pix_fmt yuv420p"));
        assert!(joined.contains("-avoid_negative_ts make_zero -fflags +genpts"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn test_frame_args() {
        let args = frame_args(Path::new("in.mp4"), -1.0, Path::new("still.png"));
        let joined = args.join(" ");
        assert!(joined.starts_with("-y -hide_banner"));
        assert!(joined.contains("-ss 0.000000 -i in.mp4 -frames:v 1 -an -pix_fmt rgba"));
        assert_eq!(args.last().map(String::as_str), Some("still.png"));
    }

    #[test]
    fn test_encode_args() {
        let mut timeline = Timeline::new(CanvasSize::new(640, 360));
        timeline.push(TimelineSlot::new(Clip::color("black", 2.0)));
        let composition = TimelineAssembler::new(25).assemble(&timeline).unwrap();
        let graph = build_filter_graph(&composition);
        let args = encode_args(
            &graph,
            &composition,
            Path::new("silent.mp4"),
            &VideoCodecConfig::default(),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-progress pipe:1"));
        assert!(joined.contains("-map [vout] -an -r 25"));
        assert!(joined.contains("-t 2.000000 -movflags +faststart silent.mp4"));
    }

    #[test]
    fn test_audio_args_loop_and_trim() {
        let track = AudioTrack::fit("song.mp3", 4.0, 9.0);
        let joined = audio_args(&track, Path::new("audio.wav"), 48000).join(" ");
        assert!(joined.contains("-stream_loop 2 -i song.mp3 -t 9.000000 -vn"));
        assert!(joined.ends_with("-c:a pcm_s16le audio.wav"));

        let trim_only = AudioTrack::fit("song.mp3", 180.0, 9.0);
        let joined = audio_args(&trim_only, Path::new("audio.wav"), 48000).join(" ");
        assert!(!joined.contains("-stream_loop"));
    }

    #[test]
    fn test_parse_version_line() {
        assert_eq!(
            parse_version_line("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\n"),
            Some("6.1.1-3ubuntu5".to_string())
        );
        assert_eq!(parse_version_line("garbage"), None);
    }

    #[test]
    fn test_progress_report() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "4500000");
        let report = progress_report(&state, 270, 9.0, 2.0);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert_eq!(report.frames_rendered, 135);
        assert!((report.eta_secs - 2.0).abs() < 1e-9);

        state.update("progress", "end");
        assert_eq!(progress_report(&state, 270, 9.0, 4.0).progress, 1.0);
    }
}
