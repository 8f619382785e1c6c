//! Error types shared across beatcut crates.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for beatcut operations.
#[derive(Debug, thiserror::Error)]
pub enum BeatcutError {
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Unsupported format: {message}")]
    UnsupportedFormat { message: String },

    #[error("Extraction failed: {message}")]
    Extraction { message: String },

    #[error("Effect application failed: {message}")]
    Effect { message: String },

    #[error("Encode failed: {message}")]
    Encode { message: String },

    #[error("Mux failed: {message}")]
    Mux { message: String },

    #[error("Resource cleanup failed: {message}")]
    Cleanup { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Job cancelled")]
    Cancelled,

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BeatcutError.
pub type BeatcutResult<T> = Result<T, BeatcutError>;

impl BeatcutError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: msg.into(),
        }
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    pub fn effect(msg: impl Into<String>) -> Self {
        Self::Effect {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux {
            message: msg.into(),
        }
    }

    pub fn cleanup(msg: impl Into<String>) -> Self {
        Self::Cleanup {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether the pipeline absorbs this error with a local fallback
    /// (skip the effect, keep the silent render, log the cleanup failure).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Effect { .. } | Self::Mux { .. } | Self::Cleanup { .. }
        )
    }
}

/// Pipeline stage an unrecoverable error surfaced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    Probing,
    Extracting,
    Compositing,
    Encoding,
    Muxing,
    Cleanup,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probing => "probing",
            Self::Extracting => "extracting",
            Self::Compositing => "compositing",
            Self::Encoding => "encoding",
            Self::Muxing => "muxing",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error a render job reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("render failed during {stage}: {message}")]
pub struct RenderError {
    /// Stage that failed.
    pub stage: RenderStage,

    /// Human-readable cause.
    pub message: String,
}

impl RenderError {
    pub fn new(stage: RenderStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    /// Tag a pipeline error with the stage it escaped from.
    pub fn at(stage: RenderStage, err: &BeatcutError) -> Self {
        Self::new(stage, err.to_string())
    }

    /// Whether the job ended because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.message == BeatcutError::Cancelled.to_string()
    }
}
