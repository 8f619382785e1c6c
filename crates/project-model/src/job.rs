//! Render jobs, their requests and the job state machine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::TimeWindow;
use crate::effect::PipLayout;
use crate::error::ModelError;
use crate::geometry::{Anchor, Position};

/// Beat montage: beat clips from `source_a`, then `source_b` sped up with a
/// running timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatVideoRequest {
    pub source_a: PathBuf,

    pub source_b: PathBuf,

    /// Seconds into `source_a` to highlight, in playback order.
    #[serde(default)]
    pub beat_times: Vec<f64>,

    /// Playback speed of `source_b`.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,

    /// Timer font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Optional background music.
    #[serde(default)]
    pub music: Option<PathBuf>,
}

fn default_speed_factor() -> f64 {
    1.0
}

fn default_font_size() -> u32 {
    60
}

/// Text drawn over a picture-in-picture render (e.g. a score line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipText {
    pub content: String,

    /// Font size in pixels; `None` derives it from the canvas width.
    #[serde(default)]
    pub font_size: Option<u32>,

    #[serde(default = "default_pip_text_position")]
    pub position: Position,
}

fn default_pip_text_position() -> Position {
    Position::Anchored(Anchor::TopLeft)
}

/// Picture-in-picture: `overlay` drawn over `main`, both cut to the shorter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipRequest {
    pub main: PathBuf,

    pub overlay: PathBuf,

    #[serde(default)]
    pub layout: PipLayout,

    /// Visible interval of the overlay; `None` shows it throughout.
    #[serde(default)]
    pub overlay_window: Option<TimeWindow>,

    #[serde(default)]
    pub text: Option<PipText>,

    #[serde(default)]
    pub music: Option<PathBuf>,
}

/// Head of `first` followed by the tail of `second`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadTailRequest {
    pub first: PathBuf,

    pub second: PathBuf,

    /// Length of each part in seconds.
    #[serde(default = "default_segment_secs")]
    pub segment_secs: f64,

    #[serde(default)]
    pub music: Option<PathBuf>,
}

fn default_segment_secs() -> f64 {
    10.0
}

/// Kind-specific job parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobRequest {
    BeatVideo(BeatVideoRequest),
    PictureInPicture(PipRequest),
    HeadTail(HeadTailRequest),
}

impl JobRequest {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::BeatVideo(_) => "beat_video",
            Self::PictureInPicture(_) => "picture_in_picture",
            Self::HeadTail(_) => "head_tail",
        }
    }

    /// Output file name prefix.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Self::BeatVideo(_) => "processed_video",
            Self::PictureInPicture(_) => "pip",
            Self::HeadTail(_) => "merged",
        }
    }

    pub fn music(&self) -> Option<&PathBuf> {
        match self {
            Self::BeatVideo(r) => r.music.as_ref(),
            Self::PictureInPicture(r) => r.music.as_ref(),
            Self::HeadTail(r) => r.music.as_ref(),
        }
    }

    /// Check parameters that no amount of clamping can repair.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::BeatVideo(r) => {
                if !(r.speed_factor.is_finite() && r.speed_factor > 0.0) {
                    return Err(ModelError::invalid_request(format!(
                        "speed_factor must be positive, got {}",
                        r.speed_factor
                    )));
                }
                if r.font_size == 0 {
                    return Err(ModelError::invalid_request("font_size must be positive"));
                }
                if let Some(bad) = r.beat_times.iter().find(|t| !t.is_finite()) {
                    return Err(ModelError::invalid_request(format!(
                        "beat time {bad} is not a finite number"
                    )));
                }
            }
            Self::PictureInPicture(r) => {
                if !r.layout.scale.is_finite() || !r.layout.opacity.is_finite() {
                    return Err(ModelError::invalid_request(
                        "layout scale and opacity must be finite",
                    ));
                }
                if let Some(text) = &r.text {
                    if text.font_size == Some(0) {
                        return Err(ModelError::invalid_request("font_size must be positive"));
                    }
                }
            }
            Self::HeadTail(r) => {
                if !(r.segment_secs.is_finite() && r.segment_secs > 0.0) {
                    return Err(ModelError::invalid_request(format!(
                        "segment_secs must be positive, got {}",
                        r.segment_secs
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A unit of work. Owns every temporary file it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: Uuid,

    pub request: JobRequest,

    /// Directory the final file is written to.
    pub output_dir: PathBuf,
}

impl RenderJob {
    pub fn new(request: JobRequest, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            output_dir: output_dir.into(),
        }
    }

    /// `<prefix>_<id>.mp4`
    pub fn output_filename(&self) -> String {
        format!("{}_{}.mp4", self.request.output_prefix(), self.id)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_filename())
    }
}

/// Lifecycle of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Extracting,
    Compositing,
    SilentEncoded,
    Muxed,
    SilentKept,
    Completed,
    Failed,
}

impl JobState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Extracting)
                | (Pending, Failed)
                | (Extracting, Compositing)
                | (Extracting, Failed)
                | (Compositing, SilentEncoded)
                | (Compositing, Failed)
                | (SilentEncoded, Muxed)
                | (SilentEncoded, SilentKept)
                | (SilentEncoded, Failed)
                | (Muxed, Completed)
                | (SilentKept, Completed)
        )
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(self, next: JobState) -> Result<JobState, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Progress percentage reported on entering this state, if any.
    pub fn checkpoint(self) -> Option<u8> {
        match self {
            Self::Extracting => Some(20),
            Self::Compositing => Some(40),
            Self::SilentEncoded => Some(80),
            Self::Completed => Some(100),
            Self::Failed => Some(0),
            Self::Pending | Self::Muxed | Self::SilentKept => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Compositing => "compositing",
            Self::SilentEncoded => "silent_encoded",
            Self::Muxed => "muxed",
            Self::SilentKept => "silent_kept",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The file a finished job produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub path: PathBuf,

    pub filename: String,

    /// False when the job fell back to the silent render.
    pub has_audio: bool,

    /// Planned composition duration in seconds.
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = JobState::Pending;
        for next in [
            JobState::Extracting,
            JobState::Compositing,
            JobState::SilentEncoded,
            JobState::Muxed,
            JobState::Completed,
        ] {
            state = state.transition(next).unwrap();
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn test_silent_fallback_path() {
        let state = JobState::SilentEncoded
            .transition(JobState::SilentKept)
            .unwrap();
        assert_eq!(state.transition(JobState::Completed), Ok(JobState::Completed));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert_eq!(
            JobState::Pending.transition(JobState::Completed),
            Err(ModelError::InvalidTransition {
                from: JobState::Pending,
                to: JobState::Completed
            })
        );
        assert!(JobState::Muxed.transition(JobState::Failed).is_err());
        assert!(JobState::Completed.transition(JobState::Extracting).is_err());
        assert!(JobState::Failed.transition(JobState::Pending).is_err());
    }

    #[test]
    fn test_checkpoints() {
        assert_eq!(JobState::Extracting.checkpoint(), Some(20));
        assert_eq!(JobState::Compositing.checkpoint(), Some(40));
        assert_eq!(JobState::SilentEncoded.checkpoint(), Some(80));
        assert_eq!(JobState::Completed.checkpoint(), Some(100));
        assert_eq!(JobState::Failed.checkpoint(), Some(0));
        assert_eq!(JobState::Muxed.checkpoint(), None);
    }

    #[test]
    fn test_request_serde_defaults() {
        let json = r#"{"kind": "beat_video", "source_a": "a.mp4", "source_b": "b.mp4", "beat_times": [1, 3, 5]}"#;
        let request: JobRequest = serde_json::from_str(json).unwrap();
        match &request {
            JobRequest::BeatVideo(r) => {
                assert_eq!(r.beat_times, vec![1.0, 3.0, 5.0]);
                assert_eq!(r.speed_factor, 1.0);
                assert_eq!(r.font_size, 60);
                assert!(r.music.is_none());
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert!(request.validate().is_ok());

        let merge: JobRequest =
            serde_json::from_str(r#"{"kind": "head_tail", "first": "1.mp4", "second": "2.mp4"}"#)
                .unwrap();
        assert_eq!(merge.output_prefix(), "merged");
    }

    #[test]
    fn test_request_validation() {
        let bad_speed = JobRequest::BeatVideo(BeatVideoRequest {
            source_a: "a.mp4".into(),
            source_b: "b.mp4".into(),
            beat_times: vec![1.0],
            speed_factor: 0.0,
            font_size: 60,
            music: None,
        });
        assert!(bad_speed.validate().is_err());

        let bad_segment = JobRequest::HeadTail(HeadTailRequest {
            first: "1.mp4".into(),
            second: "2.mp4".into(),
            segment_secs: -1.0,
            music: None,
        });
        assert!(bad_segment.validate().is_err());
    }

    #[test]
    fn test_output_filename_uses_job_id() {
        let job = RenderJob::new(
            JobRequest::HeadTail(HeadTailRequest {
                first: "1.mp4".into(),
                second: "2.mp4".into(),
                segment_secs: 10.0,
                music: None,
            }),
            "/srv/out",
        );
        let name = job.output_filename();
        assert!(name.starts_with("merged_"));
        assert!(name.ends_with(".mp4"));
        assert!(name.contains(&job.id.to_string()));
        assert_eq!(job.output_path(), PathBuf::from("/srv/out").join(name));
    }
}
