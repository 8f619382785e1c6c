//! Composition → ffmpeg `-filter_complex` graph.
//!
//! ```text
//! [0:v] speed,resize,visual,trim ─┐
//! [1:v] pip layer ────────────────┼─ overlay ──[e0]─┐
//! color filler ──────────────────────────────[e1]───┼─ concat | xfade chain ─[vout]
//! [2:v] speed,resize,visual,trim ────────────[e2]───┘
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use beatcut_processing_core::pip::{layer_filter, overlay_filter};
use beatcut_processing_core::text::escape_filter_value;

use crate::compositor::{ComposedLayer, ComposedSlot, Composition, CompositionEntry, LayerSource};

/// Final video label of every graph.
pub const OUTPUT_LABEL: &str = "vout";

/// One `-i` input of the encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeInput {
    pub path: PathBuf,

    /// Seconds to read (`-t` before `-i`).
    pub read_secs: f64,
}

/// A complete filter graph and the inputs its labels refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub inputs: Vec<EncodeInput>,
    pub graph: String,
}

/// Build the filter graph for `composition`.
pub fn build_filter_graph(composition: &Composition) -> FilterGraph {
    let mut builder = GraphBuilder {
        composition,
        inputs: Vec::new(),
        chains: Vec::new(),
    };

    let labels: Vec<String> = composition
        .entries
        .iter()
        .enumerate()
        .map(|(k, entry)| match entry {
            CompositionEntry::Slot(slot) => builder.slot(k, slot),
            CompositionEntry::Filler {
                color,
                duration_secs,
            } => builder.filler(k, color, *duration_secs),
        })
        .collect();

    builder.join(&labels);

    FilterGraph {
        inputs: builder.inputs,
        graph: builder.chains.join(";"),
    }
}

struct GraphBuilder<'a> {
    composition: &'a Composition,
    inputs: Vec<EncodeInput>,
    chains: Vec<String>,
}

impl GraphBuilder<'_> {
    fn input(&mut self, path: &Path, read_secs: f64) -> usize {
        self.inputs.push(EncodeInput {
            path: path.to_path_buf(),
            read_secs,
        });
        self.inputs.len() - 1
    }

    fn slot(&mut self, k: usize, slot: &ComposedSlot) -> String {
        let fps = self.composition.fps;
        let main = &slot.main;
        let size = main.plan.size;
        let duration = slot.duration_secs();

        let head = match &main.source {
            LayerSource::File(path) => {
                let i = self.input(path, main.source_secs);
                format!(
                    "[{i}:v]{pts},scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps},format=yuv420p",
                    pts = setpts(main.speed, 0.0),
                    w = size.width,
                    h = size.height,
                )
            }
            LayerSource::Color(color) => format!(
                "color=c={}:s={}x{}:r={fps}:d={duration:.6},format=yuv420p,setsar=1",
                escape_filter_value(color),
                size.width,
                size.height,
            ),
        };

        let base_label = if slot.overlays.is_empty() {
            format!("e{k}")
        } else {
            format!("s{k}m")
        };
        self.chains.push(format!(
            "{head}{visual},trim=duration={duration:.6},setpts=PTS-STARTPTS[{base_label}]",
            visual = visual_suffix(main),
        ));

        let mut below = base_label;
        for (n, layer) in slot.overlays.iter().enumerate() {
            let layer_label = format!("s{k}o{n}");
            self.overlay_layer(layer, &layer_label);
            let out_label = if n + 1 == slot.overlays.len() {
                format!("e{k}")
            } else {
                format!("s{k}l{n}")
            };
            self.chains.push(format!(
                "[{below}][{layer_label}]{}:eof_action=pass[{out_label}]",
                overlay_filter(&layer.plan.rect, layer.plan.window.as_ref())
            ));
            below = out_label;
        }
        below
    }

    fn overlay_layer(&mut self, layer: &ComposedLayer, label: &str) {
        let fps = self.composition.fps;
        let rect = layer.plan.rect;
        let delay = layer.plan.window.map(|w| w.start_secs).unwrap_or(0.0);
        let mut chain = match &layer.source {
            LayerSource::File(path) => {
                let i = self.input(path, layer.source_secs);
                format!("[{i}:v]{},fps={fps}", setpts(layer.speed, 0.0))
            }
            LayerSource::Color(color) => format!(
                "color=c={}:s={}x{}:r={fps}:d={:.6}",
                escape_filter_value(color),
                rect.width,
                rect.height,
                layer.duration_secs
            ),
        };
        let _ = write!(
            chain,
            ",{}{},trim=duration={:.6}",
            layer_filter(rect.width, rect.height, layer.plan.opacity),
            visual_suffix(layer),
            layer.duration_secs
        );
        // Shift the layer to its window start after trimming.
        let _ = write!(chain, ",{}[{label}]", setpts(1.0, delay));
        self.chains.push(chain);
    }

    fn filler(&mut self, k: usize, color: &str, duration_secs: f64) -> String {
        let canvas = self.composition.canvas;
        self.chains.push(format!(
            "color=c={}:s={}x{}:r={}:d={duration_secs:.6},format=yuv420p,setsar=1[e{k}]",
            escape_filter_value(color),
            canvas.width,
            canvas.height,
            self.composition.fps,
        ));
        format!("e{k}")
    }

    fn join(&mut self, labels: &[String]) {
        let overlap = self.composition.overlap_secs;
        match labels {
            [] => {}
            [only] => self.chains.push(format!("[{only}]null[{OUTPUT_LABEL}]")),
            _ if overlap <= 0.0 => {
                let inputs: String = labels.iter().map(|l| format!("[{l}]")).collect();
                self.chains.push(format!(
                    "{inputs}concat=n={}:v=1:a=0[{OUTPUT_LABEL}]",
                    labels.len()
                ));
            }
            _ => {
                let durations = self.composition.entry_durations();
                let mut current = labels[0].clone();
                let mut length = durations[0];
                for (k, label) in labels.iter().enumerate().skip(1) {
                    let offset = (length - overlap).max(0.0);
                    let out = if k + 1 == labels.len() {
                        OUTPUT_LABEL.to_string()
                    } else {
                        format!("x{k}")
                    };
                    self.chains.push(format!(
                        "[{current}][{label}]xfade=transition=fade:duration={overlap:.6}:offset={offset:.6}[{out}]"
                    ));
                    length += durations[k] - overlap;
                    current = out;
                }
            }
        }
    }
}

fn setpts(speed: f64, delay_secs: f64) -> String {
    let base = if (speed - 1.0).abs() < 1e-12 {
        "PTS-STARTPTS".to_string()
    } else {
        format!("(PTS-STARTPTS)/{speed}")
    };
    if delay_secs > 0.0 {
        format!("setpts={base}+{delay_secs:.6}/TB")
    } else {
        format!("setpts={base}")
    }
}

fn visual_suffix(layer: &ComposedLayer) -> String {
    layer
        .plan
        .visual
        .iter()
        .map(|f| format!(",{f}"))
        .collect()
}
