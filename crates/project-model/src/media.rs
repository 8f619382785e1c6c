//! Probed sources and the segments cut from them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::CanvasSize;

/// A probed input file. Immutable once probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMedia {
    /// Location on disk.
    pub path: PathBuf,

    /// Container duration in seconds.
    pub duration_secs: f64,

    /// Width of the first video stream (0 for audio-only sources).
    pub width: u32,

    /// Height of the first video stream (0 for audio-only sources).
    pub height: u32,

    /// Whether the container carries an audio stream.
    pub has_audio: bool,
}

impl SourceMedia {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for log lines, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Whether the source has a video stream with usable dimensions.
    pub fn has_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Native frame size (not even-rounded).
    pub fn frame_size(&self) -> Option<CanvasSize> {
        self.has_video().then(|| CanvasSize {
            width: self.width,
            height: self.height,
        })
    }
}

/// A contiguous span of a source.
///
/// `start_secs + duration_secs <= source.duration_secs` always holds for
/// segments produced by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// The source this span was cut from.
    pub source: Arc<SourceMedia>,

    /// Start offset in seconds.
    pub start_secs: f64,

    /// Actual duration in seconds.
    pub duration_secs: f64,

    /// Duration the caller asked for.
    pub requested_secs: f64,

    /// Set when the source was too short to satisfy the request.
    pub short: bool,
}

impl Segment {
    /// End offset in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Whether the span lies inside its source (with a small float tolerance).
    pub fn within_source(&self) -> bool {
        self.start_secs >= 0.0 && self.end_secs() <= self.source.duration_secs + 1e-9
    }
}

/// Background music fitted to a composition.
///
/// Loaded once per job and discarded after muxing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub path: PathBuf,

    /// Duration of the source file in seconds.
    pub source_secs: f64,

    /// Duration the prepared track must have.
    pub target_secs: f64,

    /// Whole copies of the source concatenated before trimming (1 = trim only).
    pub copies: u32,
}

impl AudioTrack {
    /// Plan how to fit `source_secs` of audio to `target_secs`.
    ///
    /// A shorter source is looped `ceil(target / source)` times, then trimmed.
    pub fn fit(path: impl Into<PathBuf>, source_secs: f64, target_secs: f64) -> Self {
        let copies = if source_secs > 0.0 && target_secs > source_secs {
            (target_secs / source_secs).ceil().min(u32::MAX as f64) as u32
        } else {
            1
        };
        Self {
            path: path.into(),
            source_secs,
            target_secs,
            copies,
        }
    }

    pub fn needs_loop(&self) -> bool {
        self.copies > 1
    }

    /// Length before the final trim.
    pub fn untrimmed_secs(&self) -> f64 {
        self.source_secs * self.copies as f64
    }
}
