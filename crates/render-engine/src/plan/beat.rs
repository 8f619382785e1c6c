//! Beat video: short zooming cuts of source A on each beat, then source B
//! sped up under a running timer.

use std::sync::Arc;

use beatcut_common::EngineConfig;
use beatcut_project_model::{
    BeatVideoRequest, Clip, Effect, SourceMedia, TextOverlay, Timeline, TimelineSlot,
};
use serde::Serialize;

use super::{base_timeline, with_fades};
use crate::extractor::{ExtractedSegment, SegmentRequest};

/// One beat cut.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatClip {
    pub beat_secs: f64,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Beat cuts for one source, plus beats that fell outside it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeatClipPlan {
    pub clips: Vec<BeatClip>,
    pub skipped: Vec<f64>,
}

/// Plan a cut per beat starting `lead_in_secs` before it.
///
/// Beats at or past the end of the source (or not finite, or negative) are
/// skipped. Cut bounds are resolved later by the extractor.
pub fn plan_beat_clips(
    source_secs: f64,
    beats: &[f64],
    lead_in_secs: f64,
    frame_secs: f64,
) -> BeatClipPlan {
    let mut plan = BeatClipPlan::default();
    for &beat in beats {
        if beat.is_finite() && beat >= 0.0 && beat < source_secs {
            plan.clips.push(BeatClip {
                beat_secs: beat,
                start_secs: beat - lead_in_secs,
                duration_secs: frame_secs,
            });
        } else {
            tracing::warn!(beat_secs = beat, source_secs, "Beat outside source, skipped");
            plan.skipped.push(beat);
        }
    }
    plan
}

/// Planned beat video.
#[derive(Debug, Clone)]
pub struct BeatPlan {
    config: EngineConfig,
    beats: BeatClipPlan,
    speed_factor: f64,
    font_size: u32,
    requests: Vec<SegmentRequest>,
}

impl BeatPlan {
    pub fn new(
        source_a: Arc<SourceMedia>,
        source_b: Arc<SourceMedia>,
        request: &BeatVideoRequest,
        config: &EngineConfig,
    ) -> Self {
        let beats = plan_beat_clips(
            source_a.duration_secs,
            &request.beat_times,
            config.beat_lead_in_secs,
            config.beat_frame_duration_secs,
        );
        let mut requests: Vec<SegmentRequest> = beats
            .clips
            .iter()
            .map(|clip| SegmentRequest::new(source_a.clone(), clip.start_secs, clip.duration_secs))
            .collect();
        let main_secs = source_b.duration_secs;
        requests.push(SegmentRequest::new(source_b, 0.0, main_secs));

        tracing::info!(
            beats = beats.clips.len(),
            skipped = beats.skipped.len(),
            speed_factor = request.speed_factor,
            "Planned beat video"
        );
        Self {
            config: config.clone(),
            beats,
            speed_factor: request.speed_factor,
            font_size: request.font_size,
            requests,
        }
    }

    pub fn beats(&self) -> &BeatClipPlan {
        &self.beats
    }

    pub fn requests(&self) -> &[SegmentRequest] {
        &self.requests
    }

    pub(crate) fn timeline(&self, segments: Vec<ExtractedSegment>) -> Timeline {
        let mut timeline = base_timeline(&self.config);
        let beat_count = self.beats.clips.len();
        let mut segments = segments.into_iter();

        for (i, segment) in segments.by_ref().take(beat_count).enumerate() {
            let clip = beat_cut_clip(segment.into_clip(), i, &self.config);
            timeline.push(TimelineSlot::new(clip));
        }

        if let Some(main) = segments.next() {
            let clip = main
                .into_clip()
                .with_speed(self.speed_factor)
                .with_effect(Effect::TextOverlay(TextOverlay::running_clock(
                    self.font_size,
                )));
            timeline.push(TimelineSlot::new(with_fades(clip, &self.config)));
        }
        timeline
    }
}

/// Effects for the `index`th beat cut: every cut after the first zooms.
pub fn beat_cut_clip(clip: Clip, index: usize, config: &EngineConfig) -> Clip {
    let clip = if index > 0 && config.zoom_amplitude > 0.0 {
        clip.with_effect(Effect::Zoom {
            amplitude: config.zoom_amplitude,
            period_secs: config.zoom_period_secs,
        })
    } else {
        clip
    };
    with_fades(clip, config)
}

/// Where a beat sits in its source, for checking beat lists by eye.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatPreview {
    pub index: usize,
    pub beat_secs: f64,
    pub start_secs: f64,
    pub end_secs: f64,
    pub in_range: bool,
}

/// A `window_secs` window centred on each beat, clamped to the source.
pub fn preview_beat_windows(source: &SourceMedia, beats: &[f64], window_secs: f64) -> Vec<BeatPreview> {
    let half = window_secs.max(0.0) / 2.0;
    beats
        .iter()
        .enumerate()
        .map(|(index, &beat)| {
            let in_range = beat.is_finite() && beat >= 0.0 && beat < source.duration_secs;
            let (start_secs, end_secs) = if in_range {
                ((beat - half).max(0.0), (beat + half).min(source.duration_secs))
            } else {
                (beat, beat)
            };
            BeatPreview {
                index,
                beat_secs: beat,
                start_secs,
                end_secs,
                in_range,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::plan_segment;
    use beatcut_project_model::TextContent;
    use std::path::PathBuf;

    fn source(name: &str, secs: f64) -> Arc<SourceMedia> {
        Arc::new(SourceMedia {
            path: PathBuf::from(name),
            duration_secs: secs,
            width: 1920,
            height: 1080,
            has_audio: false,
        })
    }

    fn extracted(plan: &BeatPlan) -> Vec<ExtractedSegment> {
        plan.requests()
            .iter()
            .enumerate()
            .map(|(i, r)| ExtractedSegment {
                segment: plan_segment(r.source.clone(), r.start_secs, r.duration_secs).unwrap(),
                file: PathBuf::from(format!("seg_{i:03}.mp4")),
            })
            .collect()
    }

    fn request(beats: Vec<f64>) -> BeatVideoRequest {
        BeatVideoRequest {
            source_a: PathBuf::from("a.mp4"),
            source_b: PathBuf::from("b.mp4"),
            beat_times: beats,
            speed_factor: 2.0,
            font_size: 60,
            music: None,
        }
    }

    #[test]
    fn test_plan_beat_clips_skips_out_of_range() {
        let plan = plan_beat_clips(12.0, &[1.0, 3.0, 12.0, 20.0, -1.0], 0.1, 1.0);
        assert_eq!(plan.clips.len(), 2);
        assert!((plan.clips[0].start_secs - 0.9).abs() < 1e-12);
        assert_eq!(plan.skipped, vec![12.0, 20.0, -1.0]);
    }

    #[test]
    fn test_beat_timeline_duration() {
        let plan = BeatPlan::new(
            source("a.mp4", 12.0),
            source("b.mp4", 12.0),
            &request(vec![1.0, 3.0, 5.0]),
            &EngineConfig::default(),
        );
        assert_eq!(plan.requests().len(), 4);
        let timeline = plan.timeline(extracted(&plan));
        assert_eq!(timeline.slots.len(), 4);
        assert!((timeline.total_duration() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_after_first_beat_and_clock_on_main() {
        let plan = BeatPlan::new(
            source("a.mp4", 12.0),
            source("b.mp4", 12.0),
            &request(vec![1.0, 3.0]),
            &EngineConfig::default(),
        );
        let timeline = plan.timeline(extracted(&plan));
        assert!(timeline.slots[0].main.effects.is_empty());
        assert!(matches!(
            timeline.slots[1].main.effects[0],
            Effect::Zoom { amplitude, .. } if amplitude == 0.05
        ));
        let main = &timeline.slots[2].main;
        assert_eq!(main.speed, 2.0);
        match &main.effects[0] {
            Effect::TextOverlay(text) => {
                assert_eq!(text.content, TextContent::RunningClock);
                assert_eq!(text.font_size, 60);
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_no_beats_keeps_main_only() {
        let plan = BeatPlan::new(
            source("a.mp4", 2.0),
            source("b.mp4", 8.0),
            &request(vec![5.0]),
            &EngineConfig::default(),
        );
        assert_eq!(plan.beats().skipped, vec![5.0]);
        let timeline = plan.timeline(extracted(&plan));
        assert_eq!(timeline.slots.len(), 1);
        assert!((timeline.total_duration() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_preview_windows() {
        let previews = preview_beat_windows(&source("a.mp4", 10.0), &[0.5, 5.0, 9.5, 11.0], 2.0);
        assert_eq!(previews[0].start_secs, 0.0);
        assert_eq!(previews[0].end_secs, 1.5);
        assert_eq!((previews[1].start_secs, previews[1].end_secs), (4.0, 6.0));
        assert_eq!(previews[2].end_secs, 10.0);
        assert!(!previews[3].in_range);
        assert_eq!(previews[3].index, 3);
    }
}
