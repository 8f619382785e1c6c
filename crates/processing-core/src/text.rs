//! Burned-in text via `drawtext`.
//!
//! Placement is expressed with drawtext's own `text_w`/`text_h` so the box
//! stays inside the frame whatever font the engine picks.

use beatcut_project_model::{Anchor, Position, TextContent, TextOverlay};

use crate::error::{EffectError, EffectResult};

/// drawtext expansion that prints stream time as `mm:ss`.
const RUNNING_CLOCK_TEXT: &str = r"%{pts\:gmtime\:0\:%M\\\:%S}";

/// Escape a value for one level of `key=value:key=value` option parsing.
pub fn escape_option_value(value: &str) -> String {
    escape_chars(value, &['\\', '\'', ':'])
}

/// Escape a filter's argument string for the filtergraph parser.
pub fn escape_graph_text(value: &str) -> String {
    escape_chars(value, &['\\', '\'', '[', ']', ',', ';'])
}

/// Escape a value for a filter option inside a `-filter_complex` graph.
///
/// The graph parser and then the option parser each strip one level of
/// escaping, so the value is escaped for both.
pub fn escape_filter_value(value: &str) -> String {
    escape_graph_text(&escape_option_value(value))
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if special.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `x`/`y` expressions for a text block, clamped to `[inset, frame - text - inset]`.
pub fn text_position_exprs(position: &Position, margin: u32, inset: u32) -> (String, String) {
    let m = margin + inset;
    let (x, y) = match position {
        Position::Anchored(Anchor::TopLeft) => (format!("{m}"), format!("{m}")),
        Position::Anchored(Anchor::TopRight) => (format!("w-tw-{m}"), format!("{m}")),
        Position::Anchored(Anchor::BottomLeft) => (format!("{m}"), format!("h-th-{m}")),
        Position::Anchored(Anchor::BottomRight) => (format!("w-tw-{m}"), format!("h-th-{m}")),
        Position::Anchored(Anchor::Center) => ("(w-tw)/2".to_string(), "(h-th)/2".to_string()),
        Position::At { x, y } => (x.to_string(), y.to_string()),
    };
    (
        format!("'max({inset},min({x},w-tw-{inset}))'"),
        format!("'max({inset},min({y},h-th-{inset}))'"),
    )
}

/// Build a `drawtext` fragment for a clip of `clip_secs`.
pub fn drawtext_filter(overlay: &TextOverlay, clip_secs: f64) -> EffectResult<String> {
    if overlay.font_size == 0 {
        return Err(EffectError::invalid("text_overlay", "font size must be positive"));
    }
    if overlay.color.trim().is_empty() {
        return Err(EffectError::invalid("text_overlay", "text colour must not be empty"));
    }

    let text = match &overlay.content {
        TextContent::Static(s) if s.trim().is_empty() => {
            return Err(EffectError::invalid("text_overlay", "text must not be empty"));
        }
        TextContent::Static(s) => format!("text={}:expansion=none", escape_filter_value(s)),
        TextContent::RunningClock => format!("text='{RUNNING_CLOCK_TEXT}'"),
    };

    let inset = overlay.background.as_ref().map_or(0, |b| b.padding);
    let (x, y) = text_position_exprs(&overlay.position, overlay.margin, inset);

    let mut filter = format!(
        "drawtext={text}:fontsize={}:fontcolor={}:x={x}:y={y}",
        overlay.font_size,
        escape_filter_value(overlay.color.trim()),
    );

    if let Some(bg) = &overlay.background {
        let opacity = if bg.opacity.is_finite() {
            bg.opacity.clamp(0.0, 1.0)
        } else {
            0.5
        };
        filter.push_str(&format!(
            ":box=1:boxcolor={}@{opacity}:boxborderw={}",
            escape_filter_value(bg.color.trim()),
            bg.padding
        ));
    }

    if let Some(d) = overlay.duration_secs {
        if !(d.is_finite() && d > 0.0) {
            return Err(EffectError::invalid(
                "text_overlay",
                format!("duration must be positive, got {d}"),
            ));
        }
        if d < clip_secs {
            filter.push_str(&format!(":enable='between(t,0,{d:.6})'"));
        }
    }

    Ok(filter)
}
