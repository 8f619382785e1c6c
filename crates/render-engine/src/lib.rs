//! Beatcut Render Engine
//!
//! Offline pipeline that cuts source clips, lays them out on a timeline
//! and renders the result through ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source files ──┐
//!                ├── Source Loader (probe)
//! request ───────┘         │
//!                          ├── Segment Extractor (scratch dir)
//!                          │         │
//!                          │         ├── Effect Pipeline + Timeline Assembler
//!                          │         │         │
//!                          │         │         ▼
//!                          │         │   Encode (silent H.264)
//!                          │         │         │
//! music ───────────────────┴─ Audio Mixer ─────┤
//!                                              ▼
//!                                      Mux (or keep silent)
//!                                              │
//!                                              ▼
//!                                          output.mp4
//! ```

pub mod audio;
pub mod cancel;
pub mod compositor;
pub mod engine;
pub mod extractor;
pub mod ffmpeg;
pub mod filter_graph;
pub mod loader;
pub mod mux;
pub mod plan;
pub mod pool;
pub mod process;
pub mod renderer;
pub mod scratch;
pub mod status;
pub mod still;

pub use audio::{AudioMixer, PreparedAudio};
pub use cancel::CancellationToken;
pub use compositor::{Composition, CompositionEntry, TimelineAssembler};
pub use engine::{EncodeProgress, EngineInfo, MediaEngine, ProbeInfo};
pub use extractor::{plan_segment, ExtractedSegment, SegmentExtractor, SegmentRequest};
pub use ffmpeg::FfmpegEngine;
pub use loader::SourceLoader;
pub use mux::{MuxOutcome, Muxer};
pub use plan::{BeatPreview, JobPlan};
pub use pool::{JobHandle, RenderPool};
pub use renderer::Renderer;
pub use scratch::ScratchDir;
pub use status::{FanoutSink, JobStatus, LoggingSink, StatusRegistry, StatusSink};
pub use still::{BeatStill, StillRenderer};
