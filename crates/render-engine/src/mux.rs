//! Final mux of the silent render with the prepared audio.
//!
//! A failed mux is never a job failure: the silent render becomes the
//! output instead.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use beatcut_common::{BeatcutError, BeatcutResult, EngineConfig};

use crate::process::run_with_timeout;

/// How the output file was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxOutcome {
    /// Video and audio were muxed into the output.
    Muxed,

    /// The silent render was moved to the output path.
    SilentKept { reason: String },
}

impl MuxOutcome {
    pub fn has_audio(&self) -> bool {
        matches!(self, Self::Muxed)
    }
}

/// Runs the external muxer.
#[derive(Debug, Clone)]
pub struct Muxer {
    binary: PathBuf,
    timeout: Duration,
    audio_codec: String,
    bitrate_kbps: u32,
}

impl Muxer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            binary: config.tools.ffmpeg.clone(),
            timeout: Duration::from_secs(config.mux_timeout_secs),
            audio_codec: config.audio.codec.clone(),
            bitrate_kbps: config.audio.bitrate_kbps,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce `out` from `silent` and, when present, `audio`.
    ///
    /// Only a failure to place the silent fallback at `out` is an error.
    pub fn finalize(&self, silent: &Path, audio: Option<&Path>, out: &Path) -> BeatcutResult<MuxOutcome> {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let Some(audio) = audio else {
            keep_silent(silent, out)?;
            return Ok(MuxOutcome::SilentKept {
                reason: "no background audio".to_string(),
            });
        };

        match self.mux(silent, audio, out) {
            Ok(()) => {
                tracing::info!(output = %out.display(), "Muxed audio into output");
                if let Err(e) = std::fs::remove_file(silent) {
                    tracing::debug!(path = %silent.display(), error = %e, "Silent render not removed");
                }
                Ok(MuxOutcome::Muxed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Mux failed, keeping silent render");
                keep_silent(silent, out)?;
                Ok(MuxOutcome::SilentKept {
                    reason: e.to_string(),
                })
            }
        }
    }

    fn mux(&self, silent: &Path, audio: &Path, out: &Path) -> BeatcutResult<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(mux_args(silent, audio, out, &self.audio_codec, self.bitrate_kbps));
        run_with_timeout(cmd, self.timeout).map_err(|e| BeatcutError::mux(e.to_string()))?;

        let written = std::fs::metadata(out).map(|m| m.len() > 0).unwrap_or(false);
        if !written {
            return Err(BeatcutError::mux(format!(
                "muxer exited cleanly but {} is missing or empty",
                out.display()
            )));
        }
        Ok(())
    }
}

/// Arguments for muxing `video` (stream copied) with `audio`.
pub fn mux_args(video: &Path, audio: &Path, out: &Path, codec: &str, bitrate_kbps: u32) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video.to_string_lossy().into_owned(),
        "-i".to_string(),
        audio.to_string_lossy().into_owned(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        codec.to_string(),
        "-b:a".to_string(),
        format!("{bitrate_kbps}k"),
        "-shortest".to_string(),
        out.to_string_lossy().into_owned(),
    ]
}

/// Move the silent render to `out`, replacing any partial mux output.
fn keep_silent(silent: &Path, out: &Path) -> BeatcutResult<()> {
    if out.exists() {
        std::fs::remove_file(out)?;
    }
    if std::fs::rename(silent, out).is_err() {
        // Different filesystem: fall back to copy + remove.
        std::fs::copy(silent, out)?;
        if let Err(e) = std::fs::remove_file(silent) {
            tracing::debug!(path = %silent.display(), error = %e, "Silent render not removed");
        }
    }
    Ok(())
}
