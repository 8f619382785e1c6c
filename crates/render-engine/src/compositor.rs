//! Timeline assembler: flattens a [`Timeline`] into a [`Composition`].
//!
//! The composition is the engine-neutral render plan. Every entry is sized
//! to the timeline canvas, overlays carry their resolved placement, and the
//! duration obeys `sum(entries) - (entries - 1) * overlap`.

use std::path::{Path, PathBuf};

use beatcut_common::{BeatcutError, BeatcutResult};
use beatcut_processing_core::{EffectPipeline, LayerPlan, LayerRole};
use beatcut_project_model::{CanvasSize, Clip, ClipSource, Timeline, TimelineEntry};

/// Pixel source of one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    File(PathBuf),
    Color(String),
}

/// A clip with its effects resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedLayer {
    pub source: LayerSource,

    /// Playback speed multiplier.
    pub speed: f64,

    /// Seconds read from the source.
    pub source_secs: f64,

    /// Seconds the layer lasts in the output.
    pub duration_secs: f64,

    pub z_order: i32,

    /// Decoded size of the source file; `None` for generated colour layers.
    pub source_size: Option<CanvasSize>,

    pub plan: LayerPlan,
}

impl ComposedLayer {
    /// Whether the source has to be scaled to reach its planned size.
    pub fn needs_resize(&self) -> bool {
        self.source_size.is_some_and(|size| size != self.plan.size)
    }
}

/// One slot: a main layer and the overlays drawn over it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSlot {
    pub main: ComposedLayer,
    pub overlays: Vec<ComposedLayer>,
}

impl ComposedSlot {
    pub fn duration_secs(&self) -> f64 {
        self.main.duration_secs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompositionEntry {
    Slot(ComposedSlot),
    Filler { color: String, duration_secs: f64 },
}

impl CompositionEntry {
    pub fn duration_secs(&self) -> f64 {
        match self {
            Self::Slot(slot) => slot.duration_secs(),
            Self::Filler { duration_secs, .. } => *duration_secs,
        }
    }
}

/// The full render plan handed to [`crate::MediaEngine::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub canvas: CanvasSize,

    pub fps: u32,

    pub entries: Vec<CompositionEntry>,

    /// Blend overlap between neighbouring entries in seconds.
    pub overlap_secs: f64,

    /// Target duration of the encoded video.
    pub duration_secs: f64,
}

impl Composition {
    /// Source files read by the encode, in first-use order.
    pub fn input_files(&self) -> Vec<&Path> {
        let mut files = Vec::new();
        for entry in &self.entries {
            if let CompositionEntry::Slot(slot) = entry {
                for layer in std::iter::once(&slot.main).chain(slot.overlays.iter()) {
                    if let LayerSource::File(path) = &layer.source {
                        files.push(path.as_path());
                    }
                }
            }
        }
        files
    }

    pub fn entry_durations(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.duration_secs()).collect()
    }
}

/// Builds compositions at a fixed output frame rate.
#[derive(Debug, Clone, Copy)]
pub struct TimelineAssembler {
    fps: u32,
}

impl TimelineAssembler {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    /// Flatten `timeline` into a composition.
    pub fn assemble(&self, timeline: &Timeline) -> BeatcutResult<Composition> {
        timeline
            .validate()
            .map_err(|e| BeatcutError::Other(anyhow::Error::new(e)))?;

        let canvas = timeline.canvas;
        let pipeline = EffectPipeline::new(canvas);

        let entries = timeline
            .entries()
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                TimelineEntry::Slot(slot) => {
                    let main_secs = slot.duration_secs();
                    let main = compose_layer(&pipeline, &slot.main, LayerRole::Main);
                    if let Some(size) = main.source_size.filter(|_| main.needs_resize()) {
                        tracing::info!(
                            entry = index,
                            size = %size,
                            canvas = %canvas,
                            "Source does not match the canvas, resizing"
                        );
                    }

                    let mut overlays: Vec<&Clip> = slot.overlays.iter().collect();
                    overlays.sort_by_key(|c| c.z_order);
                    let overlays = overlays
                        .into_iter()
                        .map(|clip| compose_layer(&pipeline, clip, LayerRole::Overlay { main_secs }))
                        .filter(|layer| {
                            if !layer.plan.visible {
                                tracing::warn!(entry = index, "Overlay never visible, dropped");
                            }
                            layer.plan.visible
                        })
                        .map(|mut layer| {
                            let visible = layer
                                .plan
                                .window
                                .map(|w| w.duration_secs)
                                .unwrap_or(main_secs);
                            layer.duration_secs = layer.duration_secs.min(visible);
                            layer.source_secs = layer.duration_secs * layer.speed;
                            layer
                        })
                        .collect();

                    CompositionEntry::Slot(ComposedSlot { main, overlays })
                }
                TimelineEntry::Filler {
                    color,
                    duration_secs,
                } => CompositionEntry::Filler {
                    color: color.to_string(),
                    duration_secs,
                },
            })
            .collect::<Vec<_>>();

        let composition = Composition {
            canvas,
            fps: self.fps,
            entries,
            overlap_secs: timeline.effective_overlap(),
            duration_secs: timeline.total_duration(),
        };
        tracing::info!(
            entries = composition.entries.len(),
            overlap_secs = composition.overlap_secs,
            duration_secs = composition.duration_secs,
            canvas = %canvas,
            "Timeline assembled"
        );
        Ok(composition)
    }
}

fn compose_layer(pipeline: &EffectPipeline, clip: &Clip, role: LayerRole) -> ComposedLayer {
    let (source, source_size) = match &clip.source {
        ClipSource::Segment { segment, file } => (
            LayerSource::File(file.clone()),
            Some(CanvasSize::new(segment.source.width, segment.source.height)),
        ),
        ClipSource::Color { color } => (LayerSource::Color(color.clone()), None),
    };
    ComposedLayer {
        source,
        speed: clip.speed,
        source_secs: clip.source_secs(),
        duration_secs: clip.duration_secs,
        z_order: clip.z_order,
        source_size,
        plan: pipeline.plan(clip, role),
    }
}
