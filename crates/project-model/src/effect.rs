//! The fixed effect set.
//!
//! Effects carry parameters only. The math that applies them lives in
//! `beatcut-processing-core`.

use serde::{Deserialize, Serialize};

use crate::geometry::{Anchor, Position};

/// One visual effect attached to a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Sinusoidal magnify + centre crop.
    Zoom {
        /// Peak extra magnification (0.05 = 105%).
        amplitude: f64,

        /// Oscillation period in seconds; `None` uses the clip duration.
        #[serde(default)]
        period_secs: Option<f64>,
    },

    /// Linear fade from black at the clip start.
    FadeIn { duration_secs: f64 },

    /// Linear fade to black at the clip end.
    FadeOut { duration_secs: f64 },

    /// Burned-in text.
    TextOverlay(TextOverlay),

    /// Marks a clip as a picture-in-picture layer over its slot's main clip.
    PictureInPicture(PipLayout),
}

impl Effect {
    /// Short name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zoom { .. } => "zoom",
            Self::FadeIn { .. } => "fade_in",
            Self::FadeOut { .. } => "fade_out",
            Self::TextOverlay(_) => "text_overlay",
            Self::PictureInPicture(_) => "picture_in_picture",
        }
    }
}

/// What a text overlay shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextContent {
    /// Fixed text.
    Static(String),

    /// Clip-relative elapsed time as `mm:ss`, updated every second.
    RunningClock,
}

/// Semi-transparent box drawn behind text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBackground {
    /// Box colour (ffmpeg colour syntax).
    pub color: String,

    /// Box opacity in [0, 1].
    pub opacity: f64,

    /// Padding around the text bounding box in pixels.
    pub padding: u32,
}

impl Default for TextBackground {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            opacity: 0.5,
            padding: 5,
        }
    }
}

/// Text overlay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub content: TextContent,

    /// Font size in pixels.
    pub font_size: u32,

    /// Text colour (ffmpeg colour syntax).
    #[serde(default = "default_text_color")]
    pub color: String,

    /// Optional box behind the text.
    #[serde(default)]
    pub background: Option<TextBackground>,

    #[serde(default)]
    pub position: Position,

    /// Distance from the touching canvas edges for anchored positions.
    #[serde(default)]
    pub margin: u32,

    /// Visible duration from the clip start; `None` matches the host clip.
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

fn default_text_color() -> String {
    "white".to_string()
}

impl TextOverlay {
    /// Plain white text with no box at the given position.
    pub fn new(content: TextContent, font_size: u32, position: Position) -> Self {
        Self {
            content,
            font_size,
            color: default_text_color(),
            background: None,
            position,
            margin: 0,
            duration_secs: None,
        }
    }

    /// The running `mm:ss` timer placed top-right.
    pub fn running_clock(font_size: u32) -> Self {
        Self {
            margin: 10,
            ..Self::new(
                TextContent::RunningClock,
                font_size,
                Position::Anchored(Anchor::TopRight),
            )
        }
    }

    pub fn with_background(mut self, background: TextBackground) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }
}

/// Picture-in-picture layout relative to the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipLayout {
    /// Overlay size as a fraction of the canvas (clamped to [0.1, 1.0]).
    pub scale: f64,

    pub position: Position,

    /// Uniform overlay opacity in [0, 1].
    pub opacity: f64,

    /// Distance from the touching canvas edges for anchored positions.
    pub margin: u32,
}

impl Default for PipLayout {
    fn default() -> Self {
        Self {
            scale: 0.25,
            position: Position::Anchored(Anchor::TopRight),
            opacity: 1.0,
            margin: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_serde_tagging() {
        let json = r#"{"type": "zoom", "amplitude": 0.05}"#;
        let effect: Effect = serde_json::from_str(json).unwrap();
        assert_eq!(
            effect,
            Effect::Zoom {
                amplitude: 0.05,
                period_secs: None
            }
        );
        assert_eq!(effect.name(), "zoom");
    }

    #[test]
    fn test_text_overlay_defaults() {
        let json = r#"{"type": "text_overlay", "content": "running_clock", "font_size": 48}"#;
        let effect: Effect = serde_json::from_str(json).unwrap();
        match effect {
            Effect::TextOverlay(text) => {
                assert_eq!(text.content, TextContent::RunningClock);
                assert_eq!(text.color, "white");
                assert_eq!(text.position, Position::Anchored(Anchor::TopLeft));
                assert!(text.background.is_none());
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn test_static_text_content_serde() {
        let content: TextContent = serde_json::from_str(r#"{"static": "3 : 2"}"#).unwrap();
        assert_eq!(content, TextContent::Static("3 : 2".to_string()));
    }

    #[test]
    fn test_running_clock_preset() {
        let clock = TextOverlay::running_clock(60);
        assert_eq!(clock.position, Position::Anchored(Anchor::TopRight));
        assert_eq!(clock.font_size, 60);
        assert_eq!(clock.margin, 10);
    }

    #[test]
    fn test_pip_layout_default() {
        let layout: PipLayout = serde_json::from_str("{}").unwrap();
        assert_eq!(layout, PipLayout::default());
        assert_eq!(layout.scale, 0.25);
    }
}
