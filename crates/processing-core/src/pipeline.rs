//! The effect pipeline.
//!
//! Turns a clip's attributes and effects into a [`LayerPlan`]: resolved
//! size, placement, opacity, visible window and an ordered list of filter
//! fragments. Stages always run in this order:
//!
//! 1. **resize** to the target size (the canvas for main clips)
//! 2. **position** on the canvas
//! 3. **opacity**
//! 4. **time-window** inside the slot
//! 5. **visual transforms**: zoom, then text, then fades
//!
//! Every effect is best-effort. A bad parameter produces
//! [`EffectOutcome::Skipped`] and a `warn` log line; the layer renders
//! without that effect.

use beatcut_project_model::{CanvasSize, Clip, Effect, PixelRect, TimeWindow};

use crate::error::EffectError;
use crate::fade::{self, FadeKind};
use crate::frame::Frame;
use crate::pip;
use crate::text;
use crate::zoom::{self, ZoomConfig};

/// What happened to one effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Applied { effect: &'static str },
    Skipped { effect: &'static str, reason: String },
}

impl EffectOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Whether a clip is the slot's main clip or a layer over it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerRole {
    Main,
    /// Overlay on a main clip of the given duration.
    Overlay { main_secs: f64 },
}

/// Everything the assembler needs to place one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPlan {
    /// Size after the resize stage.
    pub size: CanvasSize,

    /// Placement on the canvas.
    pub rect: PixelRect,

    /// Uniform alpha in [0, 1].
    pub opacity: f64,

    /// Visible interval inside the slot; `None` means always visible.
    pub window: Option<TimeWindow>,

    /// False when the window clamps to nothing; the layer is dropped.
    pub visible: bool,

    /// Visual filter fragments in application order.
    pub visual: Vec<String>,

    pub outcomes: Vec<EffectOutcome>,
}

impl LayerPlan {
    pub fn skipped(&self) -> impl Iterator<Item = &EffectOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }
}

fn visual_rank(effect: &Effect) -> Option<u8> {
    match effect {
        Effect::Zoom { .. } => Some(0),
        Effect::TextOverlay(_) => Some(1),
        Effect::FadeIn { .. } | Effect::FadeOut { .. } => Some(2),
        Effect::PictureInPicture(_) => None,
    }
}

/// Plans and applies effects against one canonical canvas.
#[derive(Debug, Clone, Copy)]
pub struct EffectPipeline {
    canvas: CanvasSize,
}

impl EffectPipeline {
    pub fn new(canvas: CanvasSize) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Plan a clip in the given role.
    pub fn plan(&self, clip: &Clip, role: LayerRole) -> LayerPlan {
        let mut outcomes = Vec::new();
        let mut plan = match role {
            LayerRole::Main => self.plan_main_geometry(clip, &mut outcomes),
            LayerRole::Overlay { main_secs } => {
                self.plan_overlay_geometry(clip, main_secs, &mut outcomes)
            }
        };

        let visible_secs = plan
            .window
            .map(|w| w.duration_secs)
            .unwrap_or(clip.duration_secs);
        let alpha_fades = matches!(role, LayerRole::Overlay { .. });

        let mut visual: Vec<&Effect> = clip
            .effects
            .iter()
            .filter(|e| visual_rank(e).is_some())
            .collect();
        visual.sort_by_key(|e| visual_rank(e));

        for effect in visual {
            let fragment = match effect {
                Effect::Zoom {
                    amplitude,
                    period_secs,
                } => {
                    let config =
                        ZoomConfig::new(*amplitude, period_secs.unwrap_or(clip.duration_secs));
                    zoom::zoom_filter(&config, plan.size)
                }
                Effect::TextOverlay(overlay) => text::drawtext_filter(overlay, visible_secs),
                Effect::FadeIn { duration_secs } => {
                    fade::fade_filter(FadeKind::In, *duration_secs, visible_secs, alpha_fades)
                }
                Effect::FadeOut { duration_secs } => {
                    fade::fade_filter(FadeKind::Out, *duration_secs, visible_secs, alpha_fades)
                }
                Effect::PictureInPicture(_) => continue,
            };
            match fragment {
                Ok(f) => {
                    plan.visual.push(f);
                    outcomes.push(applied(effect.name()));
                }
                Err(e) => outcomes.push(skipped(effect.name(), &e)),
            }
        }

        plan.outcomes = outcomes;
        plan
    }

    fn plan_main_geometry(&self, clip: &Clip, outcomes: &mut Vec<EffectOutcome>) -> LayerPlan {
        for effect in &clip.effects {
            if let Effect::PictureInPicture(_) = effect {
                outcomes.push(skipped(
                    effect.name(),
                    &EffectError::invalid(
                        "picture_in_picture",
                        "only applies to overlay layers",
                    ),
                ));
            }
        }
        LayerPlan {
            size: self.canvas,
            rect: self.canvas.rect(),
            opacity: 1.0,
            window: None,
            visible: true,
            visual: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    fn plan_overlay_geometry(
        &self,
        clip: &Clip,
        main_secs: f64,
        outcomes: &mut Vec<EffectOutcome>,
    ) -> LayerPlan {
        let mut layouts = clip.effects.iter().filter_map(|e| match e {
            Effect::PictureInPicture(layout) => Some(layout),
            _ => None,
        });

        if let Some(layout) = layouts.next() {
            for _ in layouts {
                outcomes.push(skipped(
                    "picture_in_picture",
                    &EffectError::invalid(
                        "picture_in_picture",
                        "a layer takes a single layout",
                    ),
                ));
            }
            match pip::place_overlay(self.canvas, layout, clip.window, main_secs) {
                Ok(placement) => {
                    outcomes.push(applied("picture_in_picture"));
                    return LayerPlan {
                        size: CanvasSize {
                            width: placement.rect.width,
                            height: placement.rect.height,
                        },
                        rect: placement.rect,
                        opacity: placement.opacity,
                        window: placement.window,
                        visible: true,
                        visual: Vec::new(),
                        outcomes: Vec::new(),
                    };
                }
                Err(e) => outcomes.push(skipped("picture_in_picture", &e)),
            }
        }

        // No usable layout: fall back to the clip's own attributes.
        let size = clip.size.unwrap_or(self.canvas);
        let rect = clip
            .position
            .resolve(self.canvas, size.width, size.height, 0);
        let (window, visible) = match clip.window {
            Some(w) => match w.clamp_to(main_secs) {
                Some(clamped) => (Some(clamped), true),
                None => {
                    outcomes.push(EffectOutcome::Skipped {
                        effect: "time_window",
                        reason: format!("window starts after the {main_secs:.3}s main clip"),
                    });
                    (None, false)
                }
            },
            None => (None, true),
        };
        LayerPlan {
            size: CanvasSize {
                width: rect.width,
                height: rect.height,
            },
            rect,
            opacity: clip.opacity,
            window,
            visible,
            visual: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// Apply the per-frame effects of `clip` to a decoded frame at clip time `t`.
    ///
    /// Covers resize, opacity, zoom and fades. Text and picture-in-picture
    /// are composited by the media engine and are not part of this path.
    pub fn apply_frame(
        &self,
        clip: &Clip,
        role: LayerRole,
        frame: &Frame,
        t: f64,
    ) -> (Frame, Vec<EffectOutcome>) {
        let plan = self.plan(clip, role);
        let mut outcomes = Vec::new();

        let mut out = match frame.resize(plan.size.width, plan.size.height) {
            Ok(f) => f,
            Err(e) => {
                outcomes.push(skipped("resize", &e));
                frame.clone()
            }
        };
        if plan.opacity < 1.0 {
            out.scale_alpha(plan.opacity);
        }

        let mut fade_in = 0.0;
        let mut fade_out = 0.0;
        for effect in &clip.effects {
            match effect {
                Effect::Zoom {
                    amplitude,
                    period_secs,
                } => {
                    let config =
                        ZoomConfig::new(*amplitude, period_secs.unwrap_or(clip.duration_secs));
                    match zoom::apply_zoom(&out, t, &config) {
                        Ok(zoomed) => {
                            out = zoomed;
                            outcomes.push(applied(effect.name()));
                        }
                        Err((unchanged, e)) => {
                            out = unchanged;
                            outcomes.push(skipped(effect.name(), &e));
                        }
                    }
                }
                Effect::FadeIn { duration_secs } => fade_in = *duration_secs,
                Effect::FadeOut { duration_secs } => fade_out = *duration_secs,
                Effect::TextOverlay(_) | Effect::PictureInPicture(_) => {}
            }
        }

        if fade_in > 0.0 || fade_out > 0.0 {
            let level = fade::opacity_at(t, clip.duration_secs, fade_in, fade_out);
            match role {
                LayerRole::Main => out.scale_brightness(level),
                LayerRole::Overlay { .. } => out.scale_alpha(level),
            }
        }

        (out, outcomes)
    }
}

fn applied(effect: &'static str) -> EffectOutcome {
    tracing::debug!(effect, "Effect applied");
    EffectOutcome::Applied { effect }
}

fn skipped(effect: &'static str, err: &EffectError) -> EffectOutcome {
    tracing::warn!(effect, reason = %err, "Effect skipped");
    EffectOutcome::Skipped {
        effect,
        reason: err.to_string(),
    }
}
