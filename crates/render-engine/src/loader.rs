//! Source loader: turns paths into probed [`SourceMedia`].

use std::path::Path;
use std::sync::Arc;

use beatcut_common::{BeatcutError, BeatcutResult};
use beatcut_project_model::SourceMedia;

use crate::engine::MediaEngine;

/// Probes inputs through the configured engine. No retries.
pub struct SourceLoader<'a> {
    engine: &'a dyn MediaEngine,
}

impl<'a> SourceLoader<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self { engine }
    }

    /// Probe a video source.
    ///
    /// Missing or empty files and files without a usable duration or frame
    /// size are `SourceUnavailable`; a container with no video stream is
    /// `UnsupportedFormat`.
    pub fn probe(&self, path: &Path) -> BeatcutResult<Arc<SourceMedia>> {
        check_readable(path)?;
        let info = self.engine.probe(path)?;

        if !info.has_video {
            return Err(BeatcutError::unsupported_format(format!(
                "{} has no video stream",
                path.display()
            )));
        }
        let duration_secs = info
            .duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| BeatcutError::source_unavailable(path, "could not determine duration"))?;
        if info.width == 0 || info.height == 0 {
            return Err(BeatcutError::source_unavailable(
                path,
                "could not determine frame size",
            ));
        }

        let media = SourceMedia {
            path: path.to_path_buf(),
            duration_secs,
            width: info.width,
            height: info.height,
            has_audio: info.has_audio,
        };
        tracing::info!(
            source = %media.display_name(),
            duration_secs,
            width = media.width,
            height = media.height,
            has_audio = media.has_audio,
            "Probed source"
        );
        Ok(Arc::new(media))
    }

    /// Probe a background-music file. Only a positive duration is required.
    pub fn probe_audio(&self, path: &Path) -> BeatcutResult<SourceMedia> {
        check_readable(path)?;
        let info = self.engine.probe(path)?;
        let duration_secs = info
            .duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| BeatcutError::source_unavailable(path, "could not determine duration"))?;
        tracing::debug!(path = %path.display(), duration_secs, "Probed audio");
        Ok(SourceMedia {
            path: path.to_path_buf(),
            duration_secs,
            width: info.width,
            height: info.height,
            has_audio: info.has_audio,
        })
    }
}

fn check_readable(path: &Path) -> BeatcutResult<()> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BeatcutError::source_unavailable(path, e.to_string()))?;
    if !metadata.is_file() {
        return Err(BeatcutError::source_unavailable(path, "not a regular file"));
    }
    if metadata.len() == 0 {
        return Err(BeatcutError::source_unavailable(path, "file is empty"));
    }
    Ok(())
}
