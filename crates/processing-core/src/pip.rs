//! Picture-in-picture placement.

use beatcut_project_model::{CanvasSize, PipLayout, PixelRect, TimeWindow};

use crate::error::{EffectError, EffectResult};

pub const MIN_PIP_SCALE: f64 = 0.1;
pub const MAX_PIP_SCALE: f64 = 1.0;

/// Resolved overlay placement for one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipPlacement {
    /// Overlay rectangle on the canvas.
    pub rect: PixelRect,

    /// Uniform alpha in [0, 1].
    pub opacity: f64,

    /// Visible interval within the slot; `None` means the whole slot.
    pub window: Option<TimeWindow>,
}

/// Clamp a PIP scale into `[0.1, 1.0]`.
pub fn clamp_scale(scale: f64) -> EffectResult<f64> {
    if !scale.is_finite() {
        return Err(EffectError::invalid(
            "picture_in_picture",
            format!("scale must be a number, got {scale}"),
        ));
    }
    Ok(scale.clamp(MIN_PIP_SCALE, MAX_PIP_SCALE))
}

/// Overlay rectangle for `layout` on `canvas`. Always contained in the canvas.
pub fn compute_pip_rect(canvas: CanvasSize, layout: &PipLayout) -> EffectResult<PixelRect> {
    let scale = clamp_scale(layout.scale)?;
    let size = canvas.scaled(scale);
    Ok(layout
        .position
        .resolve(canvas, size.width, size.height, layout.margin))
}

/// Clamp an overlay window to the main clip.
///
/// A window starting at or after the end of the main clip hides the overlay
/// entirely, which is reported as an error so the caller can skip it.
pub fn clamp_window(window: TimeWindow, main_secs: f64) -> EffectResult<TimeWindow> {
    window.clamp_to(main_secs).ok_or_else(|| {
        EffectError::invalid(
            "picture_in_picture",
            format!(
                "window starting at {:.3}s is outside the {:.3}s main clip",
                window.start_secs, main_secs
            ),
        )
    })
}

/// Full placement: rectangle, opacity and clamped window.
pub fn place_overlay(
    canvas: CanvasSize,
    layout: &PipLayout,
    window: Option<TimeWindow>,
    main_secs: f64,
) -> EffectResult<PipPlacement> {
    let rect = compute_pip_rect(canvas, layout)?;
    let opacity = if layout.opacity.is_finite() {
        layout.opacity.clamp(0.0, 1.0)
    } else {
        return Err(EffectError::invalid(
            "picture_in_picture",
            format!("opacity must be a number, got {}", layout.opacity),
        ));
    };
    let window = window.map(|w| clamp_window(w, main_secs)).transpose()?;
    Ok(PipPlacement {
        rect,
        opacity,
        window,
    })
}

/// Fragment that turns a decoded overlay stream into a translucent layer.
pub fn layer_filter(width: u32, height: u32, opacity: f64) -> String {
    let mut filter = format!("scale={width}:{height},format=yuva420p");
    if opacity < 1.0 {
        filter.push_str(&format!(",colorchannelmixer=aa={opacity:.3}"));
    }
    filter
}

/// `overlay` fragment placing a layer at `rect`, optionally time-gated.
pub fn overlay_filter(rect: &PixelRect, window: Option<&TimeWindow>) -> String {
    let mut filter = format!("overlay=x={}:y={}", rect.x, rect.y);
    if let Some(w) = window {
        filter.push_str(&format!(
            ":enable='between(t,{:.6},{:.6})'",
            w.start_secs,
            w.end_secs()
        ));
    }
    filter
}
