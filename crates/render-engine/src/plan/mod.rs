//! Job planners.
//!
//! A plan turns a [`JobRequest`] into the segments to extract and, once
//! they exist on disk, into a [`Timeline`]. Planning is pure apart from
//! probing the sources.

mod beat;
mod head_tail;
mod picture_in_picture;

pub use beat::{beat_cut_clip, plan_beat_clips, preview_beat_windows, BeatClip, BeatClipPlan, BeatPlan, BeatPreview};
pub use head_tail::HeadTailPlan;
pub use picture_in_picture::{score_font_size, PipPlan};

use beatcut_common::{BeatcutError, BeatcutResult, EngineConfig};
use beatcut_project_model::{CanvasSize, Clip, Effect, JobRequest, Timeline, TransitionSpec};

use crate::extractor::{ExtractedSegment, SegmentRequest};
use crate::loader::SourceLoader;

/// Planned work for one job.
#[derive(Debug, Clone)]
pub enum JobPlan {
    Beat(BeatPlan),
    PictureInPicture(PipPlan),
    HeadTail(HeadTailPlan),
}

impl JobPlan {
    /// Probe the request's sources and plan the segments to cut.
    pub fn prepare(
        request: &JobRequest,
        loader: &SourceLoader<'_>,
        config: &EngineConfig,
    ) -> BeatcutResult<Self> {
        request
            .validate()
            .map_err(|e| BeatcutError::Other(anyhow::Error::new(e)))?;
        Ok(match request {
            JobRequest::BeatVideo(r) => {
                let a = loader.probe(&r.source_a)?;
                let b = loader.probe(&r.source_b)?;
                Self::Beat(BeatPlan::new(a, b, r, config))
            }
            JobRequest::PictureInPicture(r) => {
                let main = loader.probe(&r.main)?;
                let overlay = loader.probe(&r.overlay)?;
                Self::PictureInPicture(PipPlan::new(main, overlay, r, config))
            }
            JobRequest::HeadTail(r) => {
                let first = loader.probe(&r.first)?;
                let second = loader.probe(&r.second)?;
                Self::HeadTail(HeadTailPlan::new(first, second, r, config))
            }
        })
    }

    pub fn requests(&self) -> &[SegmentRequest] {
        match self {
            Self::Beat(p) => p.requests(),
            Self::PictureInPicture(p) => p.requests(),
            Self::HeadTail(p) => p.requests(),
        }
    }

    /// Build the timeline from segments extracted in request order.
    pub fn timeline(&self, segments: Vec<ExtractedSegment>) -> BeatcutResult<Timeline> {
        if segments.len() != self.requests().len() {
            return Err(BeatcutError::Other(anyhow::anyhow!(
                "expected {} extracted segments, got {}",
                self.requests().len(),
                segments.len()
            )));
        }
        Ok(match self {
            Self::Beat(p) => p.timeline(segments),
            Self::PictureInPicture(p) => p.timeline(segments),
            Self::HeadTail(p) => p.timeline(segments),
        })
    }
}

pub(crate) fn canvas(config: &EngineConfig) -> CanvasSize {
    CanvasSize::new(config.canvas_width, config.canvas_height)
}

/// Empty timeline on the job canvas with the configured transition.
pub(crate) fn base_timeline(config: &EngineConfig) -> Timeline {
    let timeline = Timeline::new(canvas(config));
    match &config.transition {
        Some(transition) => timeline.with_transition(TransitionSpec {
            filler_secs: transition.duration_secs,
            color: transition.color.clone(),
            overlap_secs: config.fade_duration_secs,
        }),
        None => timeline,
    }
}

/// Fade a slot's main clip in and out when transitions are configured.
pub(crate) fn with_fades(clip: Clip, config: &EngineConfig) -> Clip {
    if config.transition.is_none() || config.fade_duration_secs <= 0.0 {
        return clip;
    }
    clip.with_effect(Effect::FadeIn {
        duration_secs: config.fade_duration_secs,
    })
    .with_effect(Effect::FadeOut {
        duration_secs: config.fade_duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcut_common::TransitionConfig;

    #[test]
    fn test_base_timeline_carries_transition() {
        let mut config = EngineConfig::default();
        assert!(base_timeline(&config).transition.is_none());

        config.transition = Some(TransitionConfig {
            duration_secs: 1.0,
            color: "black".into(),
        });
        let timeline = base_timeline(&config);
        let spec = timeline.transition.unwrap();
        assert_eq!(spec.filler_secs, 1.0);
        assert_eq!(spec.overlap_secs, 0.5);
        assert_eq!(timeline.canvas, CanvasSize::new(1920, 1080));
    }

    #[test]
    fn test_fades_only_with_transition() {
        let mut config = EngineConfig::default();
        assert!(with_fades(Clip::color("black", 2.0), &config).effects.is_empty());

        config.transition = Some(TransitionConfig {
            duration_secs: 1.0,
            color: "black".into(),
        });
        let clip = with_fades(Clip::color("black", 2.0), &config);
        assert_eq!(clip.effects.len(), 2);
        assert_eq!(clip.effects[0].name(), "fade_in");
    }
}
