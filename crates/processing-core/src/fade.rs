//! Linear fades.

use crate::error::{EffectError, EffectResult};

/// Direction of a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeKind {
    In,
    Out,
}

impl FadeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// Clamp a fade length to at most a third of the clip.
pub fn clamp_fade(fade_secs: f64, clip_secs: f64) -> f64 {
    if !(fade_secs.is_finite() && clip_secs.is_finite()) {
        return 0.0;
    }
    fade_secs.max(0.0).min(clip_secs.max(0.0) / 3.0)
}

/// Opacity at clip time `t` given the clip length and both fade lengths.
///
/// Fade lengths are clamped with [`clamp_fade`] first. Outside the two ramps
/// the opacity is 1.
pub fn opacity_at(t: f64, clip_secs: f64, fade_in_secs: f64, fade_out_secs: f64) -> f64 {
    let fade_in = clamp_fade(fade_in_secs, clip_secs);
    let fade_out = clamp_fade(fade_out_secs, clip_secs);
    let mut opacity: f64 = 1.0;
    if fade_in > 0.0 && t < fade_in {
        opacity = opacity.min(t.max(0.0) / fade_in);
    }
    let out_start = clip_secs - fade_out;
    if fade_out > 0.0 && t > out_start {
        opacity = opacity.min(((clip_secs - t) / fade_out).max(0.0));
    }
    opacity.clamp(0.0, 1.0)
}

/// ffmpeg `fade` fragment for a clip of `clip_secs`.
///
/// `alpha` fades the alpha channel instead of fading to black, for layers
/// composited over something else.
pub fn fade_filter(kind: FadeKind, fade_secs: f64, clip_secs: f64, alpha: bool) -> EffectResult<String> {
    if !(clip_secs.is_finite() && clip_secs > 0.0) {
        return Err(EffectError::invalid(
            "fade",
            format!("clip duration must be positive, got {clip_secs}"),
        ));
    }
    let d = clamp_fade(fade_secs, clip_secs);
    if d <= 0.0 {
        return Err(EffectError::invalid(
            "fade",
            format!("fade duration must be positive, got {fade_secs}"),
        ));
    }
    let st = match kind {
        FadeKind::In => 0.0,
        FadeKind::Out => clip_secs - d,
    };
    let mut filter = format!("fade=t={}:st={st:.6}:d={d:.6}", kind.as_str());
    if alpha {
        filter.push_str(":alpha=1");
    }
    Ok(filter)
}
