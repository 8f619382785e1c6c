//! The media engine contract.
//!
//! All pixel work (probe, decode, encode) goes through one engine,
//! validated once at startup. The renderer never branches on engine
//! capabilities.

use std::path::Path;

use beatcut_common::BeatcutResult;
use beatcut_project_model::AudioTrack;
use serde::{Deserialize, Serialize};

use crate::compositor::Composition;

/// What a probe learned about a file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeInfo {
    /// Container duration, if the engine could determine one.
    pub duration_secs: Option<f64>,

    pub width: u32,

    pub height: u32,

    pub has_video: bool,

    pub has_audio: bool,

    /// Container format name (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format_name: Option<String>,
}

/// Identity of a validated engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

/// Encode progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,
}

/// Decode/encode/probe primitives.
pub trait MediaEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Check that the engine works. Called once before any job runs.
    fn validate(&self) -> BeatcutResult<EngineInfo>;

    /// Inspect a media file.
    fn probe(&self, path: &Path) -> BeatcutResult<ProbeInfo>;

    /// Cut `[start, start + duration)` of `source` into `out`.
    fn extract_segment(
        &self,
        source: &Path,
        start_secs: f64,
        duration_secs: f64,
        out: &Path,
    ) -> BeatcutResult<()>;

    /// Decode the frame shown at `at_secs` of `source` into a PNG at `out`.
    fn extract_frame(&self, source: &Path, at_secs: f64, out: &Path) -> BeatcutResult<()>;

    /// Encode a composition to a silent video at `out`.
    fn encode(
        &self,
        composition: &Composition,
        out: &Path,
        progress: Option<&dyn Fn(EncodeProgress)>,
    ) -> BeatcutResult<()>;

    /// Loop/trim `track` to its target duration and write it to `out`.
    fn render_audio(&self, track: &AudioTrack, out: &Path) -> BeatcutResult<()>;
}
