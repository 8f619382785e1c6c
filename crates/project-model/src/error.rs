//! Errors raised by the data model itself.

use crate::job::JobState;

/// Validation errors for model objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid job state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid timeline: {message}")]
    InvalidTimeline { message: String },
}

impl ModelError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }

    pub fn invalid_timeline(msg: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            message: msg.into(),
        }
    }
}
