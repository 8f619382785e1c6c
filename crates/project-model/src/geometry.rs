//! Canvas sizes, pixel rectangles and placement anchors.
//!
//! All coordinates are output pixels with `(0, 0)` at the top-left of the
//! canvas. Every placement helper keeps its result inside the canvas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output frame size. Dimensions are kept even so yuv420p encoding works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas, rounding each dimension down to an even value (min 2).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: even_floor(width),
            height: even_floor(height),
        }
    }

    /// Scale both dimensions by `factor`, rounding to even values (min 2).
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        Self::new(
            (self.width as f64 * factor).round() as u32,
            (self.height as f64 * factor).round() as u32,
        )
    }

    /// Width / height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// The full-canvas rectangle.
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }
}

impl fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn even_floor(v: u32) -> u32 {
    (v - v % 2).max(2)
}

/// An axis-aligned rectangle in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Whether this rectangle lies entirely inside `canvas`.
    pub fn contained_in(&self, canvas: CanvasSize) -> bool {
        self.right() <= canvas.width as u64 && self.bottom() <= canvas.height as u64
    }
}

/// Named placement on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
        Anchor::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            "center" | "centre" => Ok(Self::Center),
            other => Err(format!(
                "unknown anchor '{other}' (expected top-left, top-right, bottom-left, bottom-right, center)"
            )),
        }
    }
}

/// Where a layer sits on the canvas: a named anchor or explicit pixels.
///
/// Serialized untagged, so `"top-right"` and `{"x": 20, "y": 40}` both parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Anchored(Anchor),
    At { x: i64, y: i64 },
}

impl Default for Position {
    fn default() -> Self {
        Self::Anchored(Anchor::TopLeft)
    }
}

impl Position {
    /// Place a `width x height` box on `canvas`.
    ///
    /// Anchors keep `margin` pixels from the touching edges (the centre
    /// anchor ignores it). The box is shrunk to the canvas if larger, and the
    /// origin is clamped so the result is always contained in the canvas.
    pub fn resolve(&self, canvas: CanvasSize, width: u32, height: u32, margin: u32) -> PixelRect {
        let width = width.min(canvas.width);
        let height = height.min(canvas.height);
        let max_x = (canvas.width - width) as i64;
        let max_y = (canvas.height - height) as i64;
        let margin = margin as i64;

        let (x, y) = match self {
            Self::Anchored(Anchor::TopLeft) => (margin, margin),
            Self::Anchored(Anchor::TopRight) => (max_x - margin, margin),
            Self::Anchored(Anchor::BottomLeft) => (margin, max_y - margin),
            Self::Anchored(Anchor::BottomRight) => (max_x - margin, max_y - margin),
            Self::Anchored(Anchor::Center) => (max_x / 2, max_y / 2),
            Self::At { x, y } => (*x, *y),
        };

        PixelRect::new(
            x.clamp(0, max_x) as u32,
            y.clamp(0, max_y) as u32,
            width,
            height,
        )
    }
}

impl FromStr for Position {
    type Err = String;

    /// Parses an anchor name or `x,y` pixel coordinates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((x, y)) = s.split_once(',') {
            let x = x
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid x coordinate '{x}': {e}"))?;
            let y = y
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid y coordinate '{y}': {e}"))?;
            return Ok(Self::At { x, y });
        }
        s.parse::<Anchor>().map(Self::Anchored)
    }
}
