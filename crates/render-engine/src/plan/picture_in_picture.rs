//! Picture-in-picture: a scaled overlay source over a main source, with an
//! optional boxed score line.

use std::sync::Arc;

use beatcut_common::EngineConfig;
use beatcut_project_model::{
    Effect, PipRequest, SourceMedia, TextBackground, TextContent, TextOverlay, Timeline,
    TimelineSlot,
};

use super::{base_timeline, canvas};
use crate::extractor::{ExtractedSegment, SegmentRequest};

const SCORE_MARGIN: u32 = 20;
const MIN_SCORE_FONT: u32 = 24;

/// Default score font size for a canvas `width` pixels wide.
pub fn score_font_size(width: u32) -> u32 {
    (width / 40).max(MIN_SCORE_FONT)
}

#[derive(Debug, Clone)]
pub struct PipPlan {
    config: EngineConfig,
    request: PipRequest,
    duration_secs: f64,
    requests: Vec<SegmentRequest>,
}

impl PipPlan {
    /// Both sources are cut to the shorter of the two.
    pub fn new(
        main: Arc<SourceMedia>,
        overlay: Arc<SourceMedia>,
        request: &PipRequest,
        config: &EngineConfig,
    ) -> Self {
        let duration_secs = main.duration_secs.min(overlay.duration_secs);
        tracing::info!(
            main = %main.display_name(),
            overlay = %overlay.display_name(),
            duration_secs,
            scale = request.layout.scale,
            "Planned picture-in-picture"
        );
        let requests = vec![
            SegmentRequest::new(main, 0.0, duration_secs),
            SegmentRequest::new(overlay, 0.0, duration_secs),
        ];
        Self {
            config: config.clone(),
            request: request.clone(),
            duration_secs,
            requests,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn requests(&self) -> &[SegmentRequest] {
        &self.requests
    }

    pub(crate) fn timeline(&self, segments: Vec<ExtractedSegment>) -> Timeline {
        let mut timeline = base_timeline(&self.config);
        let mut segments = segments.into_iter();
        let (Some(main), Some(overlay)) = (segments.next(), segments.next()) else {
            return timeline;
        };

        let mut main = main.into_clip();
        if let Some(text) = &self.request.text {
            let font_size = text
                .font_size
                .unwrap_or_else(|| score_font_size(canvas(&self.config).width));
            let overlay_text = TextOverlay::new(
                TextContent::Static(text.content.clone()),
                font_size,
                text.position,
            )
            .with_background(TextBackground::default())
            .with_margin(SCORE_MARGIN);
            main = main.with_effect(Effect::TextOverlay(overlay_text));
        }

        let mut overlay = overlay
            .into_clip()
            .with_z_order(1)
            .with_effect(Effect::PictureInPicture(self.request.layout.clone()));
        if let Some(window) = self.request.overlay_window {
            overlay = overlay.with_window(window);
        }

        timeline.push(TimelineSlot::new(main).with_overlay(overlay));
        timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::plan_segment;
    use beatcut_project_model::{Anchor, PipLayout, PipText, Position, TimeWindow};
    use std::path::PathBuf;

    fn source(name: &str, secs: f64) -> Arc<SourceMedia> {
        Arc::new(SourceMedia {
            path: PathBuf::from(name),
            duration_secs: secs,
            width: 1280,
            height: 720,
            has_audio: true,
        })
    }

    fn request(text: Option<PipText>) -> PipRequest {
        PipRequest {
            main: PathBuf::from("main.mp4"),
            overlay: PathBuf::from("cam.mp4"),
            layout: PipLayout::default(),
            overlay_window: Some(TimeWindow::new(1.0, 3.0)),
            text,
            music: None,
        }
    }

    fn extracted(plan: &PipPlan) -> Vec<ExtractedSegment> {
        plan.requests()
            .iter()
            .map(|r| ExtractedSegment {
                segment: plan_segment(r.source.clone(), r.start_secs, r.duration_secs).unwrap(),
                file: r.source.path.clone(),
            })
            .collect()
    }

    #[test]
    fn test_score_font_size() {
        assert_eq!(score_font_size(1920), 48);
        assert_eq!(score_font_size(640), 24);
    }

    #[test]
    fn test_trimmed_to_shorter_source() {
        let plan = PipPlan::new(
            source("main.mp4", 20.0),
            source("cam.mp4", 8.0),
            &request(None),
            &EngineConfig::default(),
        );
        assert_eq!(plan.duration_secs(), 8.0);
        assert!(plan.requests().iter().all(|r| r.duration_secs == 8.0));

        let timeline = plan.timeline(extracted(&plan));
        assert_eq!(timeline.slots.len(), 1);
        assert!((timeline.total_duration() - 8.0).abs() < 1e-9);
        let overlay = &timeline.slots[0].overlays[0];
        assert_eq!(overlay.window, Some(TimeWindow::new(1.0, 3.0)));
        assert!(matches!(overlay.effects[0], Effect::PictureInPicture(_)));
    }

    #[test]
    fn test_score_text_defaults() {
        let plan = PipPlan::new(
            source("main.mp4", 10.0),
            source("cam.mp4", 10.0),
            &request(Some(PipText {
                content: "Home 2 - 1 Away".into(),
                font_size: None,
                position: Position::Anchored(Anchor::TopLeft),
            })),
            &EngineConfig::default(),
        );
        let timeline = plan.timeline(extracted(&plan));
        match &timeline.slots[0].main.effects[0] {
            Effect::TextOverlay(text) => {
                assert_eq!(text.font_size, 48);
                assert_eq!(text.margin, 20);
                assert_eq!(text.color, "white");
                assert_eq!(text.background, Some(TextBackground::default()));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }
}
