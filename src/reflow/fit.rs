//! Font-size search and line wrapping.

use serde::{Deserialize, Serialize};

use super::measure::TextMeasurer;
use super::split::is_spaceless_script_char;
use crate::model::BBox;
use crate::options::FitOptions;

const FIT_EPSILON: f64 = 1e-6;

/// Upper bound on sizes tried above the floor; the step widens to stay under it.
const MAX_FIT_STEPS: f64 = 1024.0;

/// Result of searching for a font size that fits a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    /// The text fits at `size`
    Fits {
        /// Largest tested size that fits
        size: f64,
        /// Wrapped lines at that size
        lines: Vec<String>,
    },

    /// Nothing down to the floor fits
    Exhausted {
        /// Smallest size tried
        floor: f64,
        /// Wrapped lines at the floor
        lines: Vec<String>,
        /// How far the widest line sticks out of the box
        overflow_width: f64,
        /// How far the stacked lines stick out of the box
        overflow_height: f64,
    },
}

impl FitOutcome {
    /// Size to render at: the fitting size, or the floor.
    pub fn size(&self) -> f64 {
        match self {
            FitOutcome::Fits { size, .. } => *size,
            FitOutcome::Exhausted { floor, .. } => *floor,
        }
    }

    /// Wrapped lines at [`FitOutcome::size`].
    pub fn lines(&self) -> &[String] {
        match self {
            FitOutcome::Fits { lines, .. } | FitOutcome::Exhausted { lines, .. } => lines,
        }
    }

    /// Check if the search ran out of sizes.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FitOutcome::Exhausted { .. })
    }
}

/// A unit of text the wrapper will not break inside.
struct Unit<'a> {
    text: &'a str,
    space_before: bool,
}

/// Words, with every ideograph/kana standing alone so such runs can wrap anywhere.
fn units(paragraph: &str) -> Vec<Unit<'_>> {
    let mut out = Vec::new();
    for (wi, word) in paragraph.split_whitespace().enumerate() {
        let mut space_before = wi > 0;
        let mut run_start = 0;
        for (i, c) in word.char_indices() {
            if !is_spaceless_script_char(c) {
                continue;
            }
            if run_start < i {
                out.push(Unit {
                    text: &word[run_start..i],
                    space_before,
                });
                space_before = false;
            }
            let end = i + c.len_utf8();
            out.push(Unit {
                text: &word[i..end],
                space_before,
            });
            space_before = false;
            run_start = end;
        }
        if run_start < word.len() {
            out.push(Unit {
                text: &word[run_start..],
                space_before,
            });
        }
    }
    out
}

/// Break text into lines no wider than `max_width`, honoring explicit newlines.
///
/// Greedy: each unit goes on the current line if it still fits, otherwise it
/// starts a new line. A unit wider than `max_width` gets a line of its own and
/// overflows it.
pub fn wrap_text(
    measurer: &dyn TextMeasurer,
    font: &str,
    size: f64,
    text: &str,
    max_width: f64,
) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for unit in units(paragraph) {
            if current.is_empty() {
                current.push_str(unit.text);
                continue;
            }
            let mut candidate = current.clone();
            if unit.space_before {
                candidate.push(' ');
            }
            candidate.push_str(unit.text);

            if measurer.measure(font, size, &candidate).width <= max_width + FIT_EPSILON {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(unit.text);
            }
        }
        lines.push(current);
    }

    lines
}

/// Lines of text laid out at one size, with their extent.
pub(crate) struct Layout {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn fits(&self, bbox: &BBox) -> bool {
        self.width <= bbox.width() + FIT_EPSILON && self.height <= bbox.height() + FIT_EPSILON
    }
}

pub(crate) fn layout_at(
    measurer: &dyn TextMeasurer,
    font: &str,
    size: f64,
    text: &str,
    bbox: &BBox,
    options: &FitOptions,
) -> Layout {
    let lines = if options.wrap {
        wrap_text(measurer, font, size, text, bbox.width())
    } else {
        text.split('\n').map(str::to_string).collect()
    };

    let mut width = 0.0_f64;
    let mut height = 0.0_f64;
    for line in &lines {
        let extent = measurer.measure(font, size, line);
        width = width.max(extent.width);
        height += extent.height * options.line_spacing;
    }

    Layout {
        lines,
        width,
        height,
    }
}

/// Sizes to try, from the original size down to the floor inclusive.
///
/// `original` must be finite.
fn candidate_sizes(original: f64, options: &FitOptions) -> Vec<f64> {
    let floor = options.min_font_size;
    if !floor.is_finite() || original <= floor {
        return vec![original];
    }
    if !(options.step.is_finite() && options.step > 0.0) {
        return vec![original, floor];
    }

    let span = original - floor;
    let step = options.step.max(span / MAX_FIT_STEPS);
    let count = (span / step - FIT_EPSILON).ceil().max(1.0) as usize;

    let mut sizes = Vec::with_capacity(count + 1);
    for k in 0..count {
        let size = original - k as f64 * step;
        if size <= floor + FIT_EPSILON {
            break;
        }
        sizes.push(size);
    }
    sizes.push(floor);
    sizes
}

/// Find the largest size, stepping down from `original_size`, at which the
/// text fits inside `bbox`.
///
/// Returns [`FitOutcome::Exhausted`] when even the floor overflows; the caller
/// decides what to do with it.
pub fn fit_font_size(
    measurer: &dyn TextMeasurer,
    font: &str,
    text: &str,
    bbox: &BBox,
    original_size: f64,
    options: &FitOptions,
) -> FitOutcome {
    if !original_size.is_finite() {
        let floor = options.min_font_size;
        log::warn!("Source size {} is not finite, using {:.1}pt", original_size, floor);
        let layout = layout_at(measurer, font, floor, text, bbox, options);
        return FitOutcome::Exhausted {
            floor,
            overflow_width: (layout.width - bbox.width()).max(0.0),
            overflow_height: (layout.height - bbox.height()).max(0.0),
            lines: layout.lines,
        };
    }
    if text.trim().is_empty() {
        return FitOutcome::Fits {
            size: original_size,
            lines: Vec::new(),
        };
    }

    let sizes = candidate_sizes(original_size, options);
    let mut last = None;
    for &size in &sizes {
        let layout = layout_at(measurer, font, size, text, bbox, options);
        if layout.fits(bbox) {
            if size < original_size {
                log::debug!("Shrunk text from {:.1}pt to {:.1}pt to fit", original_size, size);
            }
            return FitOutcome::Fits {
                size,
                lines: layout.lines,
            };
        }
        last = Some((size, layout));
    }

    let (floor, layout) = match last {
        Some(found) => found,
        None => (
            original_size,
            layout_at(measurer, font, original_size, text, bbox, options),
        ),
    };
    log::warn!(
        "Text does not fit {:.1}x{:.1} box even at {:.1}pt",
        bbox.width(),
        bbox.height(),
        floor
    );
    FitOutcome::Exhausted {
        floor,
        overflow_width: (layout.width - bbox.width()).max(0.0),
        overflow_height: (layout.height - bbox.height()).max(0.0),
        lines: layout.lines,
    }
}
