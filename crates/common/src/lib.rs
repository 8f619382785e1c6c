//! Beatcut Common Utilities
//!
//! Shared infrastructure for all beatcut crates:
//! - Error types, the stage-tagged render error, and result aliases
//! - Frame timing helpers and job stopwatches
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timing;

pub use config::*;
pub use error::*;
pub use timing::*;
