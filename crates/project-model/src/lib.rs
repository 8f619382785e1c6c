//! Beatcut Project Model
//!
//! Defines the data contracts shared by every beatcut crate:
//! - **Media:** Probed sources, segments cut from them, background audio
//! - **Clips & effects:** Renderable units and the fixed effect set
//! - **Timeline:** Ordered slots, transition fillers, the duration invariant
//! - **Jobs:** Render requests, job identity, and the job state machine
//!
//! Durations are `f64` seconds and coordinates are output-canvas pixels.

pub mod clip;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod job;
pub mod media;
pub mod timeline;

pub use clip::*;
pub use effect::*;
pub use error::*;
pub use geometry::*;
pub use job::*;
pub use media::*;
pub use timeline::*;
