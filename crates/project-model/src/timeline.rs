//! Ordered slots, transition fillers and the duration invariant.
//!
//! A timeline is a list of slots (one main clip plus its overlays). With a
//! transition configured, a solid-colour filler sits between every pair of
//! adjacent slots and neighbouring entries blend over a fixed overlap:
//!
//! ```text
//! total = sum(entry durations) - (entries - 1) * overlap
//! ```

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::error::ModelError;
use crate::geometry::CanvasSize;

/// Solid-colour filler inserted between adjacent slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// Filler duration in seconds.
    pub filler_secs: f64,

    /// Filler colour.
    pub color: String,

    /// Blend overlap between neighbouring entries in seconds.
    pub overlap_secs: f64,
}

/// One position on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSlot {
    /// The clip that defines the slot duration.
    pub main: Clip,

    /// Layers drawn over `main`, in z-order once assembled.
    pub overlays: Vec<Clip>,
}

impl TimelineSlot {
    pub fn new(main: Clip) -> Self {
        Self {
            main,
            overlays: Vec::new(),
        }
    }

    pub fn with_overlay(mut self, overlay: Clip) -> Self {
        self.overlays.push(overlay);
        self
    }

    pub fn duration_secs(&self) -> f64 {
        self.main.duration_secs
    }
}

/// A slot or a filler, in playback order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEntry<'a> {
    Slot(&'a TimelineSlot),
    Filler { color: &'a str, duration_secs: f64 },
}

impl TimelineEntry<'_> {
    pub fn duration_secs(&self) -> f64 {
        match self {
            Self::Slot(slot) => slot.duration_secs(),
            Self::Filler { duration_secs, .. } => *duration_secs,
        }
    }
}

/// The full render plan for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Canonical canvas every entry is resized to.
    pub canvas: CanvasSize,

    pub slots: Vec<TimelineSlot>,

    pub transition: Option<TransitionSpec>,
}

impl Timeline {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            slots: Vec::new(),
            transition: None,
        }
    }

    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn push(&mut self, slot: TimelineSlot) {
        self.slots.push(slot);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots interleaved with fillers when a transition is configured.
    pub fn entries(&self) -> Vec<TimelineEntry<'_>> {
        let mut entries = Vec::with_capacity(self.slots.len() * 2);
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                if let Some(t) = &self.transition {
                    entries.push(TimelineEntry::Filler {
                        color: &t.color,
                        duration_secs: t.filler_secs,
                    });
                }
            }
            entries.push(TimelineEntry::Slot(slot));
        }
        entries
    }

    pub fn entry_durations(&self) -> Vec<f64> {
        self.entries().iter().map(|e| e.duration_secs()).collect()
    }

    /// Overlap actually used between neighbouring entries.
    ///
    /// Zero without a transition or with a single entry. Otherwise the
    /// configured overlap, clamped to half the shortest entry so no entry is
    /// consumed by the blends on both of its sides.
    pub fn effective_overlap(&self) -> f64 {
        let Some(transition) = &self.transition else {
            return 0.0;
        };
        let durations = self.entry_durations();
        if durations.len() < 2 {
            return 0.0;
        }
        let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
        transition.overlap_secs.min(shortest / 2.0).max(0.0)
    }

    /// Sum of entry durations minus the total overlap.
    pub fn total_duration(&self) -> f64 {
        let durations = self.entry_durations();
        if durations.is_empty() {
            return 0.0;
        }
        let sum: f64 = durations.iter().sum();
        sum - (durations.len() - 1) as f64 * self.effective_overlap()
    }

    /// Reject timelines the assembler cannot render.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.slots.is_empty() {
            return Err(ModelError::invalid_timeline("timeline has no slots"));
        }
        for (i, slot) in self.slots.iter().enumerate() {
            let d = slot.duration_secs();
            if !(d.is_finite() && d > 0.0) {
                return Err(ModelError::invalid_timeline(format!(
                    "slot {i} has non-positive duration {d}"
                )));
            }
        }
        if let Some(t) = &self.transition {
            if !(t.filler_secs.is_finite() && t.filler_secs > 0.0) {
                return Err(ModelError::invalid_timeline(format!(
                    "transition filler duration must be positive, got {}",
                    t.filler_secs
                )));
            }
            if !(t.overlap_secs.is_finite() && t.overlap_secs >= 0.0) {
                return Err(ModelError::invalid_timeline(format!(
                    "transition overlap must not be negative, got {}",
                    t.overlap_secs
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot(duration: f64) -> TimelineSlot {
        TimelineSlot::new(Clip::color("gray", duration))
    }

    fn timeline(durations: &[f64], transition: Option<TransitionSpec>) -> Timeline {
        let mut tl = Timeline::new(CanvasSize::new(1920, 1080));
        tl.transition = transition;
        for d in durations {
            tl.push(slot(*d));
        }
        tl
    }

    fn fade(filler: f64, overlap: f64) -> TransitionSpec {
        TransitionSpec {
            filler_secs: filler,
            color: "black".to_string(),
            overlap_secs: overlap,
        }
    }

    #[test]
    fn test_plain_concatenation() {
        let tl = timeline(&[1.0, 1.0, 1.0, 6.0], None);
        assert_eq!(tl.entries().len(), 4);
        assert_eq!(tl.effective_overlap(), 0.0);
        assert!((tl.total_duration() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_fillers_between_slots() {
        let tl = timeline(&[2.0, 2.0, 2.0], Some(fade(1.0, 0.5)));
        let entries = tl.entries();
        assert_eq!(entries.len(), 5);
        assert!(matches!(entries[1], TimelineEntry::Filler { .. }));
        assert!(matches!(entries[3], TimelineEntry::Filler { .. }));
        // 6 + 2 fillers - 4 overlaps of 0.5
        assert!((tl.total_duration() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_clamped_to_shortest_entry() {
        let tl = timeline(&[0.6, 3.0], Some(fade(1.0, 0.5)));
        assert!((tl.effective_overlap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_single_slot_has_no_overlap() {
        let tl = timeline(&[4.0], Some(fade(1.0, 0.5)));
        assert_eq!(tl.entries().len(), 1);
        assert_eq!(tl.total_duration(), 4.0);
    }

    #[test]
    fn test_validate() {
        assert!(timeline(&[], None).validate().is_err());
        assert!(timeline(&[1.0, 0.0], None).validate().is_err());
        assert!(timeline(&[1.0], Some(fade(0.0, 0.5))).validate().is_err());
        assert!(timeline(&[1.0, 2.0], Some(fade(1.0, 0.5))).validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_total_duration_matches_invariant(
            durations in prop::collection::vec(0.1f64..30.0, 1..12),
            filler in 0.1f64..3.0,
            overlap in 0.0f64..2.0,
            with_transition in any::<bool>(),
        ) {
            let transition = with_transition.then(|| fade(filler, overlap));
            let tl = timeline(&durations, transition);
            let entries = tl.entry_durations();
            let expected: f64 = entries.iter().sum::<f64>()
                - (entries.len() - 1) as f64 * tl.effective_overlap();
            prop_assert!((tl.total_duration() - expected).abs() < 1e-9);
            prop_assert!(tl.total_duration() > 0.0);
            for d in &entries {
                prop_assert!(tl.effective_overlap() <= d / 2.0 + 1e-12);
            }
        }
    }
}
