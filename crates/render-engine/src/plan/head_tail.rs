//! Head + tail merge: the opening of one source followed by the ending of
//! another.

use std::sync::Arc;

use beatcut_common::EngineConfig;
use beatcut_project_model::{HeadTailRequest, SourceMedia, Timeline, TimelineSlot};

use super::{base_timeline, with_fades};
use crate::extractor::{ExtractedSegment, SegmentRequest};

#[derive(Debug, Clone)]
pub struct HeadTailPlan {
    config: EngineConfig,
    requests: Vec<SegmentRequest>,
}

impl HeadTailPlan {
    pub fn new(
        first: Arc<SourceMedia>,
        second: Arc<SourceMedia>,
        request: &HeadTailRequest,
        config: &EngineConfig,
    ) -> Self {
        let segment_secs = request.segment_secs;
        let head_secs = segment_secs.min(first.duration_secs);
        let tail_start = (second.duration_secs - segment_secs).max(0.0);
        tracing::info!(
            first = %first.display_name(),
            second = %second.display_name(),
            head_secs,
            tail_start,
            "Planned head/tail merge"
        );
        Self {
            config: config.clone(),
            requests: vec![
                SegmentRequest::new(first, 0.0, head_secs),
                SegmentRequest::new(second, tail_start, segment_secs),
            ],
        }
    }

    pub fn requests(&self) -> &[SegmentRequest] {
        &self.requests
    }

    pub(crate) fn timeline(&self, segments: Vec<ExtractedSegment>) -> Timeline {
        let mut timeline = base_timeline(&self.config);
        for segment in segments {
            timeline.push(TimelineSlot::new(with_fades(
                segment.into_clip(),
                &self.config,
            )));
        }
        timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::plan_segment;
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

    fn request(segment_secs: f64) -> HeadTailRequest {
        HeadTailRequest {
            first: PathBuf::from("first.mp4"),
            second: PathBuf::from("second.mp4"),
            segment_secs,
            music: None,
        }
    }

    #[test]
    fn test_head_and_tail_requests() {
        let plan = HeadTailPlan::new(
            source("first.mp4", 30.0),
            source("second.mp4", 45.0),
            &request(10.0),
            &EngineConfig::default(),
        );
        let [head, tail] = plan.requests() else {
            panic!("expected two requests");
        };
        assert_eq!((head.start_secs, head.duration_secs), (0.0, 10.0));
        assert_eq!((tail.start_secs, tail.duration_secs), (35.0, 10.0));
    }

    #[test]
    fn test_short_sources() {
        let plan = HeadTailPlan::new(
            source("first.mp4", 4.0),
            source("second.mp4", 6.0),
            &request(10.0),
            &EngineConfig::default(),
        );
        let segments: Vec<ExtractedSegment> = plan
            .requests()
            .iter()
            .map(|r| ExtractedSegment {
                segment: plan_segment(r.source.clone(), r.start_secs, r.duration_secs).unwrap(),
                file: r.source.path.clone(),
            })
            .collect();
        assert!(!segments[0].segment.short);
        assert!(segments[1].segment.short);
        let timeline = plan.timeline(segments);
        assert!((timeline.total_duration() - 10.0).abs() < 1e-9);
    }
}
