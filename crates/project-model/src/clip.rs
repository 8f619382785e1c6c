//! Renderable clips.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::geometry::{CanvasSize, Position};
use crate::media::Segment;

/// Where a clip's pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipSource {
    /// An extracted segment materialized at `file`.
    Segment { segment: Segment, file: PathBuf },

    /// A generated solid-colour card.
    Color { color: String },
}

/// Visible interval of a layer relative to its slot start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl TimeWindow {
    pub fn new(start_secs: f64, duration_secs: f64) -> Self {
        Self {
            start_secs,
            duration_secs,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Clamp to `[0, parent_secs]`. Returns `None` when nothing stays visible.
    pub fn clamp_to(&self, parent_secs: f64) -> Option<TimeWindow> {
        if !self.start_secs.is_finite() || !self.duration_secs.is_finite() {
            return None;
        }
        let start = self.start_secs.max(0.0);
        let available = parent_secs - start;
        let duration = self.duration_secs.min(available);
        (duration > 0.0).then(|| TimeWindow::new(start, duration))
    }
}

/// A renderable unit placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub source: ClipSource,

    /// Output duration in seconds (source duration divided by speed).
    pub duration_secs: f64,

    /// Playback speed multiplier.
    pub speed: f64,

    /// Placement on the canvas.
    pub position: Position,

    /// Target size; `None` fills the canvas.
    pub size: Option<CanvasSize>,

    /// Layer opacity in [0, 1].
    pub opacity: f64,

    /// Stacking order inside a slot (higher draws later).
    pub z_order: i32,

    /// Visible interval inside the parent slot.
    pub window: Option<TimeWindow>,

    /// Effects in attachment order. The pipeline sorts them into stage order.
    pub effects: Vec<Effect>,
}

impl Clip {
    /// A full-canvas clip playing `segment` from `file` at normal speed.
    pub fn from_segment(segment: Segment, file: impl Into<PathBuf>) -> Self {
        let duration_secs = segment.duration_secs;
        Self::with_source(
            ClipSource::Segment {
                segment,
                file: file.into(),
            },
            duration_secs,
        )
    }

    /// A generated solid-colour card.
    pub fn color(color: impl Into<String>, duration_secs: f64) -> Self {
        Self::with_source(
            ClipSource::Color {
                color: color.into(),
            },
            duration_secs,
        )
    }

    fn with_source(source: ClipSource, duration_secs: f64) -> Self {
        Self {
            source,
            duration_secs,
            speed: 1.0,
            position: Position::default(),
            size: None,
            opacity: 1.0,
            z_order: 0,
            window: None,
            effects: Vec::new(),
        }
    }

    /// Change playback speed. Non-positive or non-finite factors are ignored.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.duration_secs = self.duration_secs * self.speed / speed;
            self.speed = speed;
        }
        self
    }

    /// Shorten the clip to `duration_secs` (never lengthens it).
    pub fn trimmed_to(mut self, duration_secs: f64) -> Self {
        if duration_secs > 0.0 && duration_secs < self.duration_secs {
            self.duration_secs = duration_secs;
        }
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: CanvasSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self
    }

    pub fn with_z_order(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Materialized input file, if the clip is backed by a segment.
    pub fn file(&self) -> Option<&Path> {
        match &self.source {
            ClipSource::Segment { file, .. } => Some(file),
            ClipSource::Color { .. } => None,
        }
    }

    /// Whether the clip is a generated card.
    pub fn is_generated(&self) -> bool {
        matches!(self.source, ClipSource::Color { .. })
    }

    /// Source-time length consumed from the segment.
    pub fn source_secs(&self) -> f64 {
        self.duration_secs * self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SourceMedia;
    use std::sync::Arc;

    fn segment(duration: f64) -> Segment {
        Segment {
            source: Arc::new(SourceMedia {
                path: PathBuf::from("b.mp4"),
                duration_secs: duration,
                width: 1920,
                height: 1080,
                has_audio: false,
            }),
            start_secs: 0.0,
            duration_secs: duration,
            requested_secs: duration,
            short: false,
        }
    }

    #[test]
    fn test_speed_shortens_duration() {
        let clip = Clip::from_segment(segment(12.0), "/tmp/b.mp4").with_speed(2.0);
        assert!((clip.duration_secs - 6.0).abs() < 1e-12);
        assert!((clip.source_secs() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_speed_ignored() {
        let clip = Clip::from_segment(segment(4.0), "x.mp4")
            .with_speed(0.0)
            .with_speed(f64::NAN);
        assert_eq!(clip.speed, 1.0);
        assert_eq!(clip.duration_secs, 4.0);
    }

    #[test]
    fn test_trim_never_lengthens() {
        let clip = Clip::from_segment(segment(4.0), "x.mp4");
        assert_eq!(clip.clone().trimmed_to(10.0).duration_secs, 4.0);
        assert_eq!(clip.trimmed_to(2.5).duration_secs, 2.5);
    }

    #[test]
    fn test_opacity_clamped() {
        let clip = Clip::color("black", 1.0).with_opacity(1.7);
        assert_eq!(clip.opacity, 1.0);
        assert!(clip.is_generated());
        assert!(clip.file().is_none());
    }

    #[test]
    fn test_window_clamp() {
        let window = TimeWindow::new(-1.0, 20.0);
        assert_eq!(window.clamp_to(8.0), Some(TimeWindow::new(0.0, 8.0)));
        assert_eq!(TimeWindow::new(3.0, 2.0).clamp_to(8.0), Some(TimeWindow::new(3.0, 2.0)));
        assert_eq!(TimeWindow::new(9.0, 2.0).clamp_to(8.0), None);
        assert_eq!(TimeWindow::new(f64::NAN, 2.0).clamp_to(8.0), None);
    }
}
