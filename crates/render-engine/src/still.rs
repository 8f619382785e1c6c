//! Still previews of one beat cut.
//!
//! One frame is decoded through the engine and run through the per-frame
//! effects the beat video would apply at that point, then written as a PNG.
//! Nothing is encoded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use beatcut_common::{BeatcutError, BeatcutResult, EngineConfig};
use beatcut_processing_core::{EffectOutcome, EffectPipeline, Frame, LayerRole};
use beatcut_project_model::SourceMedia;
use image::ImageFormat;
use serde::Serialize;

use crate::engine::MediaEngine;
use crate::extractor::{plan_segment, ExtractedSegment};
use crate::plan::{beat_cut_clip, canvas, plan_beat_clips};

const FRAME_FILE: &str = "still_source.png";

/// A rendered beat still.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatStill {
    /// Position among the beats that fall inside the source.
    pub index: usize,
    pub beat_secs: f64,
    /// Source time of the decoded frame.
    pub source_secs: f64,
    /// Time into the beat cut the effects were evaluated at.
    pub clip_secs: f64,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
    /// Effects that could not be applied, with the reason.
    pub skipped: Vec<String>,
}

/// Renders beat stills against one engine.
pub struct StillRenderer<'a> {
    engine: &'a dyn MediaEngine,
    config: &'a EngineConfig,
}

impl<'a> StillRenderer<'a> {
    pub fn new(engine: &'a dyn MediaEngine, config: &'a EngineConfig) -> Self {
        Self { engine, config }
    }

    /// Render the frame `offset_secs` into beat cut `index` of `source` to `out`.
    ///
    /// `scratch` holds the decoded frame. The offset is clamped to the cut.
    pub fn render(
        &self,
        source: Arc<SourceMedia>,
        beat_times: &[f64],
        index: usize,
        offset_secs: f64,
        scratch: &Path,
        out: &Path,
    ) -> BeatcutResult<BeatStill> {
        let beats = plan_beat_clips(
            source.duration_secs,
            beat_times,
            self.config.beat_lead_in_secs,
            self.config.beat_frame_duration_secs,
        );
        let Some(beat) = beats.clips.get(index) else {
            return Err(BeatcutError::extraction(format!(
                "{}: no beat {index}, {} of {} beats fall inside the source",
                source.display_name(),
                beats.clips.len(),
                beat_times.len()
            )));
        };
        let segment = plan_segment(source.clone(), beat.start_secs, beat.duration_secs)?;

        let clip_secs = if offset_secs.is_finite() {
            offset_secs.clamp(0.0, segment.duration_secs)
        } else {
            0.0
        };
        let source_secs = segment.start_secs + clip_secs;
        let frame_file = scratch.join(FRAME_FILE);
        self.engine.extract_frame(&source.path, source_secs, &frame_file)?;
        let decoded = image::open(&frame_file)
            .map_err(|e| {
                BeatcutError::extraction(format!("{}: {e}", frame_file.display()))
            })?
            .to_rgba8();

        let clip = beat_cut_clip(
            ExtractedSegment {
                segment,
                file: frame_file,
            }
            .into_clip(),
            index,
            self.config,
        );
        let pipeline = EffectPipeline::new(canvas(self.config));
        let (frame, outcomes) =
            pipeline.apply_frame(&clip, LayerRole::Main, &Frame::from_image(decoded), clip_secs);

        let mut skipped = Vec::new();
        for outcome in outcomes {
            if let EffectOutcome::Skipped { effect, reason } = outcome {
                tracing::warn!(effect, reason = %reason, index, "Effect skipped in still");
                skipped.push(format!("{effect}: {reason}"));
            }
        }

        frame
            .as_image()
            .save_with_format(out, ImageFormat::Png)
            .map_err(|e| BeatcutError::encode(format!("{}: {e}", out.display())))?;
        tracing::info!(
            index,
            beat_secs = beat.beat_secs,
            source_secs,
            output = %out.display(),
            "Beat still written"
        );

        Ok(BeatStill {
            index,
            beat_secs: beat.beat_secs,
            source_secs,
            clip_secs,
            width: frame.width(),
            height: frame.height(),
            output: out.to_path_buf(),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Composition;
    use crate::engine::{EncodeProgress, EngineInfo, ProbeInfo};
    use beatcut_common::TransitionConfig;
    use beatcut_project_model::AudioTrack;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Serves a solid grey frame and records where it was asked for.
    #[derive(Default)]
    struct GreyFrames {
        requested: Mutex<Vec<f64>>,
    }

    impl MediaEngine for GreyFrames {
        fn name(&self) -> &str {
            "grey"
        }
        fn validate(&self) -> BeatcutResult<EngineInfo> {
            Ok(EngineInfo {
                name: "grey".into(),
                version: "0".into(),
            })
        }
        fn probe(&self, _: &Path) -> BeatcutResult<ProbeInfo> {
            unreachable!()
        }
        fn extract_segment(&self, _: &Path, _: f64, _: f64, _: &Path) -> BeatcutResult<()> {
            unreachable!()
        }
        fn extract_frame(&self, _: &Path, at_secs: f64, out: &Path) -> BeatcutResult<()> {
            self.requested.lock().unwrap().push(at_secs);
            RgbaImage::from_pixel(32, 18, Rgba([120, 120, 120, 255]))
                .save_with_format(out, ImageFormat::Png)
                .map_err(|e| BeatcutError::extraction(e.to_string()))
        }
        fn encode(
            &self,
            _: &Composition,
            _: &Path,
            _: Option<&dyn Fn(EncodeProgress)>,
        ) -> BeatcutResult<()> {
            unreachable!()
        }
        fn render_audio(&self, _: &AudioTrack, _: &Path) -> BeatcutResult<()> {
            unreachable!()
        }
    }

    fn source(secs: f64) -> Arc<SourceMedia> {
        Arc::new(SourceMedia {
            path: PathBuf::from("a.mp4"),
            duration_secs: secs,
            width: 32,
            height: 18,
            has_audio: false,
        })
    }

    fn small_canvas() -> EngineConfig {
        EngineConfig {
            canvas_width: 64,
            canvas_height: 36,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_still_lands_on_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GreyFrames::default();
        let config = small_canvas();
        let out = dir.path().join("beat.png");

        let still = StillRenderer::new(&engine, &config)
            .render(source(10.0), &[2.0, 4.0], 1, 0.5, dir.path(), &out)
            .unwrap();

        assert_eq!((still.width, still.height), (64, 36));
        assert_eq!(still.beat_secs, 4.0);
        assert!(still.skipped.is_empty());
        let written = image::open(&out).unwrap();
        assert_eq!((written.width(), written.height()), (64, 36));
        let requested = engine.requested.lock().unwrap().clone();
        assert_eq!(requested.len(), 1);
        assert!((requested[0] - still.source_secs).abs() < 1e-9);
    }

    #[test]
    fn test_offset_is_clamped_to_the_cut() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GreyFrames::default();
        let config = small_canvas();

        let still = StillRenderer::new(&engine, &config)
            .render(source(10.0), &[3.0], 0, 99.0, dir.path(), &dir.path().join("s.png"))
            .unwrap();

        assert!((still.clip_secs - config.beat_frame_duration_secs).abs() < 1e-9);
        assert!(still.source_secs <= 10.0);
    }

    #[test]
    fn test_fade_edge_is_black() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GreyFrames::default();
        let mut config = small_canvas();
        config.transition = Some(TransitionConfig {
            duration_secs: 1.0,
            color: "black".into(),
        });
        let out = dir.path().join("edge.png");

        StillRenderer::new(&engine, &config)
            .render(source(10.0), &[3.0], 0, 0.0, dir.path(), &out)
            .unwrap();

        let written = image::open(&out).unwrap().to_rgba8();
        assert_eq!(written.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_beat_outside_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GreyFrames::default();
        let config = small_canvas();

        let err = StillRenderer::new(&engine, &config)
            .render(source(5.0), &[2.0, 8.0], 1, 0.0, dir.path(), &dir.path().join("x.png"))
            .unwrap_err();

        assert!(matches!(err, BeatcutError::Extraction { .. }));
        assert!(engine.requested.lock().unwrap().is_empty());
    }
}
