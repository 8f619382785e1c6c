//! Beatcut Processing Core: the Effect Pipeline
//!
//! Boundary-safe math for the fixed effect set:
//! - **Zoom:** sinusoidal magnify + centre crop
//! - **Fade:** linear in/out ramps clamped to a third of the clip
//! - **Text:** `drawtext` placement, escaping and running clocks
//! - **Picture-in-picture:** overlay rectangles contained in the canvas
//!
//! This crate is pure computation with no I/O and no subprocesses.
//! Inputs are clips and frames; outputs are frames, layer plans and
//! filter fragments for the media engine.

pub mod error;
pub mod fade;
pub mod frame;
pub mod pip;
pub mod pipeline;
pub mod text;
pub mod zoom;

pub use error::{EffectError, EffectResult};
pub use frame::Frame;
pub use pipeline::{EffectOutcome, EffectPipeline, LayerPlan, LayerRole};
pub use zoom::ZoomConfig;
