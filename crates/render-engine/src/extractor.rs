//! Segment extractor.
//!
//! Bounds are resolved in pure code ([`plan_segment`]) before the engine
//! cuts anything, so every extracted segment lies inside its source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use beatcut_common::{BeatcutError, BeatcutResult};
use beatcut_project_model::{Clip, Segment, SourceMedia};

use crate::engine::MediaEngine;

/// One span to cut.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub source: Arc<SourceMedia>,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl SegmentRequest {
    pub fn new(source: Arc<SourceMedia>, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            source,
            start_secs,
            duration_secs,
        }
    }
}

/// A segment materialized on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSegment {
    pub segment: Segment,
    pub file: PathBuf,
}

impl ExtractedSegment {
    /// Full-canvas clip playing this segment.
    pub fn into_clip(self) -> Clip {
        Clip::from_segment(self.segment, self.file)
    }
}

/// Resolve `[start, start + duration)` against the source length.
///
/// The requested duration wins over the requested start: a span running
/// past the end is shifted back (never before 0). A source shorter than
/// the request yields the whole source flagged `short`.
pub fn plan_segment(
    source: Arc<SourceMedia>,
    start_secs: f64,
    duration_secs: f64,
) -> BeatcutResult<Segment> {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(BeatcutError::extraction(format!(
            "{}: duration must be positive, got {duration_secs}",
            source.display_name()
        )));
    }
    let available = source.duration_secs;
    if !(available.is_finite() && available > 0.0) {
        return Err(BeatcutError::extraction(format!(
            "{}: source has no usable duration",
            source.display_name()
        )));
    }

    let start = if start_secs.is_finite() {
        start_secs.max(0.0)
    } else {
        0.0
    };

    let (start, duration, short) = if available >= duration_secs {
        let end = available.min(start + duration_secs);
        let deficit = duration_secs - (end - start);
        let start = if deficit > 0.0 {
            (start - deficit).max(0.0).min(available - duration_secs)
        } else {
            start
        };
        (start, duration_secs, false)
    } else {
        (0.0, available, true)
    };

    if short {
        tracing::warn!(
            source = %source.display_name(),
            requested_secs = duration_secs,
            available_secs = available,
            "Source shorter than requested segment"
        );
    } else if (start - start_secs).abs() > 1e-9 {
        tracing::debug!(
            source = %source.display_name(),
            requested_start = start_secs,
            start,
            "Segment start adjusted to fit source"
        );
    }

    Ok(Segment {
        source,
        start_secs: start,
        duration_secs: duration,
        requested_secs: duration_secs,
        short,
    })
}

/// Cuts segments through the engine into a job's scratch directory.
pub struct SegmentExtractor<'a> {
    engine: &'a dyn MediaEngine,
    parallel: bool,
}

impl<'a> SegmentExtractor<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self {
            engine,
            parallel: false,
        }
    }

    /// Extract independent segments on scoped threads.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Extract one span into `out`. Running the same request twice
    /// overwrites `out` with the same segment.
    pub fn extract(&self, request: &SegmentRequest, out: &Path) -> BeatcutResult<ExtractedSegment> {
        let segment = plan_segment(
            request.source.clone(),
            request.start_secs,
            request.duration_secs,
        )?;
        self.engine
            .extract_segment(
                segment.source.path(),
                segment.start_secs,
                segment.duration_secs,
                out,
            )
            .map_err(|e| match e {
                err @ BeatcutError::Extraction { .. } => err,
                other => BeatcutError::extraction(other.to_string()),
            })?;

        if !out.is_file() {
            return Err(BeatcutError::extraction(format!(
                "engine produced no output at {}",
                out.display()
            )));
        }
        tracing::debug!(
            source = %segment.source.display_name(),
            start_secs = segment.start_secs,
            duration_secs = segment.duration_secs,
            out = %out.display(),
            "Extracted segment"
        );
        Ok(ExtractedSegment {
            segment,
            file: out.to_path_buf(),
        })
    }

    /// Extract every request into `dir` as `seg_000.mp4`, `seg_001.mp4`, ...
    ///
    /// Results keep request order. The first failure (in request order) is
    /// returned.
    pub fn extract_all(
        &self,
        requests: &[SegmentRequest],
        dir: &Path,
    ) -> BeatcutResult<Vec<ExtractedSegment>> {
        let outputs: Vec<PathBuf> = (0..requests.len())
            .map(|i| dir.join(segment_file_name(i)))
            .collect();

        if !self.parallel || requests.len() < 2 {
            return requests
                .iter()
                .zip(&outputs)
                .map(|(request, out)| self.extract(request, out))
                .collect();
        }

        let results: Vec<BeatcutResult<ExtractedSegment>> = std::thread::scope(|scope| {
            let handles: Vec<_> = requests
                .iter()
                .zip(&outputs)
                .map(|(request, out)| scope.spawn(move || self.extract(request, out)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(BeatcutError::extraction("extraction thread panicked"))
                    })
                })
                .collect()
        });
        results.into_iter().collect()
    }
}

/// Deterministic scratch name of the `index`-th segment of a job.
pub fn segment_file_name(index: usize) -> String {
    format!("seg_{index:03}.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn source(duration: f64) -> Arc<SourceMedia> {
        Arc::new(SourceMedia {
            path: PathBuf::from("a.mp4"),
            duration_secs: duration,
            width: 1920,
            height: 1080,
            has_audio: false,
        })
    }

    #[test]
    fn test_plan_inside_source() {
        let seg = plan_segment(source(12.0), 0.9, 1.0).unwrap();
        assert!((seg.start_secs - 0.9).abs() < 1e-12);
        assert_eq!(seg.duration_secs, 1.0);
        assert!(!seg.short);
    }

    #[test]
    fn test_plan_shifts_start_back() {
        let seg = plan_segment(source(10.0), 9.5, 2.0).unwrap();
        assert!((seg.start_secs - 8.0).abs() < 1e-12);
        assert_eq!(seg.duration_secs, 2.0);
        assert!(seg.within_source());
    }

    #[test]
    fn test_plan_start_past_end() {
        let seg = plan_segment(source(10.0), 25.0, 3.0).unwrap();
        assert!((seg.start_secs - 7.0).abs() < 1e-12);
        assert_eq!(seg.duration_secs, 3.0);
    }

    #[test]
    fn test_plan_negative_start_clamps() {
        let seg = plan_segment(source(10.0), -0.1, 1.0).unwrap();
        assert_eq!(seg.start_secs, 0.0);
        assert_eq!(seg.duration_secs, 1.0);
    }

    #[test]
    fn test_plan_short_source() {
        let seg = plan_segment(source(4.0), 1.0, 10.0).unwrap();
        assert_eq!(seg.start_secs, 0.0);
        assert_eq!(seg.duration_secs, 4.0);
        assert_eq!(seg.requested_secs, 10.0);
        assert!(seg.short);
    }

    #[test]
    fn test_plan_rejects_non_positive_duration() {
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                plan_segment(source(10.0), 0.0, bad),
                Err(BeatcutError::Extraction { .. })
            ));
        }
    }

    #[test]
    fn test_segment_file_names() {
        assert_eq!(segment_file_name(0), "seg_000.mp4");
        assert_eq!(segment_file_name(12), "seg_012.mp4");
    }

    proptest! {
        #[test]
        fn prop_exact_duration_when_source_long_enough(
            source_secs in 0.5f64..600.0,
            start in -50.0f64..700.0,
            frac in 0.01f64..1.0,
        ) {
            let duration = source_secs * frac;
            let seg = plan_segment(source(source_secs), start, duration).unwrap();
            prop_assert!((seg.duration_secs - duration).abs() < 1.0 / 30.0);
            prop_assert!(seg.within_source());
            prop_assert!(!seg.short);
        }

        #[test]
        fn prop_segment_always_inside_source(
            source_secs in 0.5f64..600.0,
            start in -50.0f64..700.0,
            duration in 0.01f64..900.0,
        ) {
            let seg = plan_segment(source(source_secs), start, duration).unwrap();
            prop_assert!(seg.start_secs >= 0.0);
            prop_assert!(seg.within_source());
            prop_assert!(seg.duration_secs <= duration + 1e-9);
        }
    }
}
