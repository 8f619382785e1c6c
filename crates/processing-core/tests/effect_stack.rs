//! A beat slot pushed through the effect pipeline frame by frame.

use beatcut_processing_core::{EffectOutcome, EffectPipeline, Frame, LayerRole};
use beatcut_project_model::{
    Anchor, CanvasSize, Clip, Effect, PipLayout, Position, TextOverlay,
};
use proptest::prelude::*;

fn canvas() -> CanvasSize {
    CanvasSize::new(64, 36)
}

fn beat_clip(duration_secs: f64) -> Clip {
    Clip::color("black", duration_secs)
        .with_effect(Effect::FadeOut { duration_secs: 0.3 })
        .with_effect(Effect::TextOverlay(TextOverlay::running_clock(60)))
        .with_effect(Effect::Zoom {
            amplitude: 0.05,
            period_secs: None,
        })
        .with_effect(Effect::FadeIn { duration_secs: 0.3 })
}

#[test]
fn main_slot_fades_through_black_at_both_ends() {
    let pipeline = EffectPipeline::new(canvas());
    let clip = beat_clip(1.5);
    let frame = Frame::filled(32, 18, [200, 100, 50, 255]);

    let (first, _) = pipeline.apply_frame(&clip, LayerRole::Main, &frame, 0.0);
    let (middle, _) = pipeline.apply_frame(&clip, LayerRole::Main, &frame, 0.75);
    let (last, _) = pipeline.apply_frame(&clip, LayerRole::Main, &frame, 1.5);

    assert_eq!(first.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(middle.pixel(0, 0), Some([200, 100, 50, 255]));
    assert_eq!(last.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn every_frame_of_a_slot_keeps_the_canvas_size() {
    let pipeline = EffectPipeline::new(canvas());
    let clip = beat_clip(1.5);
    let frame = Frame::filled(48, 48, [10, 20, 30, 255]);

    for step in 0..=45 {
        let t = step as f64 / 30.0;
        let (out, outcomes) = pipeline.apply_frame(&clip, LayerRole::Main, &frame, t);
        assert_eq!((out.width(), out.height()), (64, 36), "frame at {t}s");
        assert!(outcomes.iter().all(|o| !o.is_skipped()), "frame at {t}s");
    }
}

#[test]
fn filter_stages_follow_zoom_text_fade_order() {
    let plan = EffectPipeline::new(canvas()).plan(&beat_clip(1.5), LayerRole::Main);

    let names: Vec<_> = plan
        .outcomes
        .iter()
        .map(|o| match o {
            EffectOutcome::Applied { effect } => *effect,
            EffectOutcome::Skipped { effect, .. } => *effect,
        })
        .collect();
    assert_eq!(names, vec!["zoom", "text_overlay", "fade_out", "fade_in"]);
    assert_eq!(plan.visual.len(), 4);
    assert!(plan.visual[0].contains("scale"));
    assert!(plan.visual[1].starts_with("drawtext"));
}

#[test]
fn overlay_fades_its_alpha_instead_of_its_colour() {
    let pipeline = EffectPipeline::new(canvas());
    let overlay = Clip::color("white", 2.0)
        .with_effect(Effect::PictureInPicture(PipLayout::default()))
        .with_effect(Effect::FadeIn { duration_secs: 0.5 });
    let role = LayerRole::Overlay { main_secs: 2.0 };
    let frame = Frame::filled(16, 16, [255, 255, 255, 255]);

    let plan = pipeline.plan(&overlay, role);
    let (out, _) = pipeline.apply_frame(&overlay, role, &frame, 0.0);

    assert_eq!((out.width(), out.height()), (plan.size.width, plan.size.height));
    assert_eq!(out.pixel(0, 0), Some([255, 255, 255, 0]));
}

#[test]
fn broken_zoom_leaves_the_rest_of_the_slot_intact() {
    let pipeline = EffectPipeline::new(canvas());
    let clip = Clip::color("black", 1.0)
        .with_effect(Effect::Zoom {
            amplitude: f64::NAN,
            period_secs: None,
        })
        .with_effect(Effect::FadeIn { duration_secs: 0.3 });

    let plan = pipeline.plan(&clip, LayerRole::Main);
    assert_eq!(plan.skipped().count(), 1);
    assert_eq!(plan.visual.len(), 1);
    assert!(plan.visual[0].starts_with("fade"));
}

proptest! {
    #[test]
    fn overlay_always_lands_inside_the_canvas(
        scale in -1.0f64..3.0,
        margin in 0u32..200,
        anchor in prop::sample::select(Anchor::ALL.to_vec()),
        width in 16u32..4000,
        height in 16u32..4000,
    ) {
        let canvas = CanvasSize::new(width, height);
        let overlay = Clip::color("white", 1.0).with_effect(Effect::PictureInPicture(PipLayout {
            scale,
            position: Position::Anchored(anchor),
            opacity: 0.8,
            margin,
        }));
        let plan = EffectPipeline::new(canvas).plan(&overlay, LayerRole::Overlay { main_secs: 1.0 });
        prop_assert!(plan.rect.contained_in(canvas));
        prop_assert!(plan.visible);
    }
}
