//! Pulsing zoom: magnify by a sinusoidal factor, then centre-crop back.
//!
//! # Math
//!
//! For progress `p = (t mod period) / period`:
//!
//! ```text
//! scale(p) = clamp(1 + amplitude * sin(2π p), 1, 1 + amplitude)
//! ```
//!
//! The lower half of the sine wave is flattened to 1, so a clip never
//! shrinks below its original framing.

use std::f64::consts::PI;

use beatcut_project_model::CanvasSize;

use crate::error::{EffectError, EffectResult};
use crate::frame::Frame;

/// Zoom parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConfig {
    /// Peak extra magnification (0.05 = 105%).
    pub amplitude: f64,

    /// Oscillation period in seconds.
    pub period_secs: f64,
}

impl ZoomConfig {
    pub fn new(amplitude: f64, period_secs: f64) -> Self {
        Self {
            amplitude,
            period_secs,
        }
    }

    /// Reject parameters the effect cannot use.
    pub fn validate(&self) -> EffectResult<()> {
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(EffectError::invalid(
                "zoom",
                format!("amplitude must be a non-negative number, got {}", self.amplitude),
            ));
        }
        if !(self.period_secs.is_finite() && self.period_secs > 0.0) {
            return Err(EffectError::invalid(
                "zoom",
                format!("period must be positive, got {}", self.period_secs),
            ));
        }
        Ok(())
    }

    /// Progress through the current period at clip time `t`, in `[0, 1)`.
    pub fn progress_at(&self, t: f64) -> f64 {
        if !(t.is_finite() && self.period_secs > 0.0) {
            return 0.0;
        }
        let p = t.rem_euclid(self.period_secs) / self.period_secs;
        if p >= 1.0 {
            0.0
        } else {
            p
        }
    }

    /// Magnification at clip time `t`.
    pub fn scale_at(&self, t: f64) -> f64 {
        zoom_scale(self.progress_at(t), self.amplitude)
    }
}

/// Magnification for progress `p`, always within `[1, 1 + amplitude]`.
pub fn zoom_scale(progress: f64, amplitude: f64) -> f64 {
    let amplitude = if amplitude.is_finite() {
        amplitude.max(0.0)
    } else {
        0.0
    };
    if !progress.is_finite() {
        return 1.0;
    }
    (1.0 + amplitude * (2.0 * PI * progress).sin()).clamp(1.0, 1.0 + amplitude)
}

/// Where to crop a magnified frame to get back to the input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Magnified frame width.
    pub scaled_width: u32,

    /// Magnified frame height.
    pub scaled_height: u32,

    pub x: u32,
    pub y: u32,

    /// Output width (equals the input width).
    pub width: u32,

    /// Output height (equals the input height).
    pub height: u32,
}

/// Centre crop of a `width x height` frame magnified by `scale`.
///
/// Returns `None` when the magnified frame would be empty. Crop coordinates
/// are clamped so the window never leaves the magnified frame.
pub fn crop_window(width: u32, height: u32, scale: f64) -> Option<CropWindow> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let scaled_width = (width as f64 * scale).round();
    let scaled_height = (height as f64 * scale).round();
    if scaled_width < 1.0 || scaled_height < 1.0 {
        return None;
    }
    let scaled_width = (scaled_width as u32).max(width);
    let scaled_height = (scaled_height as u32).max(height);

    let x = ((scaled_width - width) / 2).min(scaled_width - width);
    let y = ((scaled_height - height) / 2).min(scaled_height - height);

    Some(CropWindow {
        scaled_width,
        scaled_height,
        x,
        y,
        width,
        height,
    })
}

/// Apply the zoom to one frame at clip time `t`.
///
/// On any problem the input frame is returned unchanged alongside the
/// reason, so callers can report a skip without losing the frame.
pub fn apply_zoom(frame: &Frame, t: f64, config: &ZoomConfig) -> Result<Frame, (Frame, EffectError)> {
    if let Err(e) = config.validate() {
        return Err((frame.clone(), e));
    }
    if frame.is_empty() {
        return Err((
            frame.clone(),
            EffectError::DegenerateFrame {
                effect: "zoom",
                width: frame.width(),
                height: frame.height(),
            },
        ));
    }

    let scale = config.scale_at(t);
    let Some(window) = crop_window(frame.width(), frame.height(), scale) else {
        return Err((
            frame.clone(),
            EffectError::DegenerateFrame {
                effect: "zoom",
                width: frame.width(),
                height: frame.height(),
            },
        ));
    };
    if window.scaled_width == frame.width() && window.scaled_height == frame.height() {
        return Ok(frame.clone());
    }

    frame
        .resize(window.scaled_width, window.scaled_height)
        .and_then(|big| big.crop(window.x, window.y, window.width, window.height))
        .map_err(|e| (frame.clone(), e))
}

/// ffmpeg fragment that zooms a stream already sized to `canvas`.
///
/// Uses `scale` with per-frame evaluation driven by the stream time `t`,
/// then a fixed-size centre `crop`, so output dimensions never change.
pub fn zoom_filter(config: &ZoomConfig, canvas: CanvasSize) -> EffectResult<String> {
    config.validate()?;
    let a = config.amplitude;
    let p = config.period_secs;
    let s = format!("max(1,min({max},1+{a}*sin(2*PI*mod(t,{p})/{p})))", max = 1.0 + a);
    Ok(format!(
        "scale=w='2*trunc(iw*{s}/2)':h='2*trunc(ih*{s}/2)':eval=frame,crop=w={w}:h={h}:x='(iw-ow)/2':y='(ih-oh)/2'",
        w = canvas.width,
        h = canvas.height,
    ))
}
