//! Effect errors.
//!
//! Every effect is best-effort: the pipeline turns these into a `Skipped`
//! outcome and keeps the input unchanged. They only escape this crate when a
//! caller asks for a single effect directly.

use beatcut_common::BeatcutError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EffectError {
    #[error("invalid {effect} parameter: {message}")]
    InvalidParameter {
        effect: &'static str,
        message: String,
    },

    #[error("{effect} cannot be applied to a {width}x{height} frame")]
    DegenerateFrame {
        effect: &'static str,
        width: u32,
        height: u32,
    },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
}

impl EffectError {
    pub fn invalid(effect: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            effect,
            message: message.into(),
        }
    }
}

impl From<EffectError> for BeatcutError {
    fn from(err: EffectError) -> Self {
        BeatcutError::effect(err.to_string())
    }
}

pub type EffectResult<T> = Result<T, EffectError>;
