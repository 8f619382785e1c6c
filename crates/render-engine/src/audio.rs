//! Audio mixer: fits background music to the composition length.

use std::path::{Path, PathBuf};

use beatcut_common::{BeatcutError, BeatcutResult};
use beatcut_project_model::AudioTrack;

use crate::engine::MediaEngine;
use crate::loader::SourceLoader;

/// A background track rendered to the job's scratch directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAudio {
    pub track: AudioTrack,
    pub path: PathBuf,
}

pub struct AudioMixer<'a> {
    engine: &'a dyn MediaEngine,
}

impl<'a> AudioMixer<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self { engine }
    }

    /// Loop or trim `music` to `target_secs` and write it to `out`.
    ///
    /// Failures are not fatal: the job continues without audio.
    pub fn prepare(&self, music: &Path, target_secs: f64, out: &Path) -> Option<PreparedAudio> {
        match self.try_prepare(music, target_secs, out) {
            Ok(prepared) => {
                tracing::info!(
                    music = %music.display(),
                    source_secs = prepared.track.source_secs,
                    target_secs,
                    copies = prepared.track.copies,
                    "Background audio prepared"
                );
                Some(prepared)
            }
            Err(e) => {
                tracing::warn!(
                    music = %music.display(),
                    error = %e,
                    "Background audio unavailable, continuing without audio"
                );
                None
            }
        }
    }

    fn try_prepare(&self, music: &Path, target_secs: f64, out: &Path) -> BeatcutResult<PreparedAudio> {
        if !(target_secs.is_finite() && target_secs > 0.0) {
            return Err(BeatcutError::unsupported(format!(
                "cannot fit audio to {target_secs}s"
            )));
        }
        let media = SourceLoader::new(self.engine).probe_audio(music)?;
        let track = AudioTrack::fit(music, media.duration_secs, target_secs);
        self.engine.render_audio(&track, out)?;
        if !out.is_file() {
            return Err(BeatcutError::FileNotFound {
                path: out.to_path_buf(),
            });
        }
        Ok(PreparedAudio {
            track,
            path: out.to_path_buf(),
        })
    }
}
