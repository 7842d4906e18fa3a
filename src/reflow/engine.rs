//! Block-level reflow: split, fit, and settle on one size.

use serde::{Deserialize, Serialize};

use super::fit::{fit_font_size, layout_at, FitOutcome};
use super::measure::{ApproxMeasurer, TextMeasurer};
use super::split::{split_translation_with, SpanFragment};
use crate::model::BBox;
use crate::options::{FitOptions, SplitOptions};

/// Translated text for one block plus its source geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflowRequest {
    /// Box of the whole block
    pub block_bbox: BBox,

    /// Font used when a fragment does not name one
    pub font: String,

    /// Size used when a fragment does not carry one
    pub font_size: f64,

    /// Original fragments, in reading order
    #[serde(default)]
    pub fragments: Vec<SpanFragment>,

    /// Translated text for the whole block
    pub text: String,
}

impl ReflowRequest {
    /// Create a request without fragment information.
    pub fn new(block_bbox: BBox, font: impl Into<String>, font_size: f64, text: impl Into<String>) -> Self {
        Self {
            block_bbox,
            font: font.into(),
            font_size,
            fragments: Vec::new(),
            text: text.into(),
        }
    }

    /// Set the original fragments.
    pub fn with_fragments(mut self, fragments: Vec<SpanFragment>) -> Self {
        self.fragments = fragments;
        self
    }
}

/// One translated part, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentLayout {
    /// Part of the translation assigned to this fragment
    pub text: String,
    /// Box to draw into
    pub bbox: BBox,
    /// Font to draw with
    pub font: String,
    /// Final size in points
    pub font_size: f64,
    /// Wrapped lines at `font_size`
    pub lines: Vec<String>,
    /// Whether the lines stay inside `bbox`
    pub fits: bool,
}

/// Result of reflowing one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockReflow {
    /// One entry per original fragment (one entry when there were none)
    pub fragments: Vec<FragmentLayout>,
    /// Common scale applied to every fragment's source size
    pub scale: f64,
}

impl BlockReflow {
    /// Indices of fragments that overflow even at the smallest size.
    pub fn exhausted(&self) -> Vec<usize> {
        self.fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.fits)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check if every fragment fits.
    pub fn is_fit(&self) -> bool {
        self.fragments.iter().all(|f| f.fits)
    }

    /// Translated text, reassembled.
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Fits translated text back into a block's original fragments.
///
/// # Example
///
/// ```
/// use relayout::model::BBox;
/// use relayout::reflow::{ApproxMeasurer, ReflowEngine, ReflowRequest, SpanFragment};
///
/// let block = BBox::new(0.0, 0.0, 200.0, 14.0).unwrap();
/// let request = ReflowRequest::new(block, "Helvetica", 10.0, "AGREEMENT OF TERMINATION")
///     .with_fragments(vec![
///         SpanFragment::new("СОГЛАШЕНИЕ О "),
///         SpanFragment::new("РАСТОРЖЕНИИ "),
///     ]);
///
/// let reflow = ReflowEngine::new(ApproxMeasurer::default()).reflow(&request);
/// assert_eq!(reflow.fragments.len(), 2);
/// assert_eq!(reflow.text(), "AGREEMENT OF TERMINATION");
/// ```
#[derive(Debug, Clone)]
pub struct ReflowEngine<M = ApproxMeasurer> {
    measurer: M,
    split: SplitOptions,
    fit: FitOptions,
}

impl Default for ReflowEngine<ApproxMeasurer> {
    fn default() -> Self {
        Self::new(ApproxMeasurer::default())
    }
}

impl<M: TextMeasurer> ReflowEngine<M> {
    /// Create an engine around a measurer, with default options.
    pub fn new(measurer: M) -> Self {
        Self {
            measurer,
            split: SplitOptions::default(),
            fit: FitOptions::default(),
        }
    }

    /// Set the split options.
    pub fn with_split_options(mut self, split: SplitOptions) -> Self {
        self.split = split;
        self
    }

    /// Set the fit options.
    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// The measurer in use.
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Split the text across the fragments and fit every part.
    ///
    /// Each part is first fitted on its own. The block then takes the
    /// smallest resulting ratio to the source size and applies it to every
    /// fragment, so fragments keep their relative sizes. No fragment goes
    /// below the floor.
    pub fn reflow(&self, request: &ReflowRequest) -> BlockReflow {
        let parts = split_translation_with(&request.fragments, &request.text, &self.split);
        let single = request.fragments.len() <= 1;

        let slots: Vec<(String, BBox, String, f64)> = parts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let fragment = if single { None } else { request.fragments.get(i) };
                let bbox = fragment.and_then(|f| f.bbox).unwrap_or(request.block_bbox);
                let font = fragment
                    .and_then(|f| f.font.clone())
                    .unwrap_or_else(|| request.font.clone());
                let size = fragment.and_then(|f| f.font_size).unwrap_or(request.font_size);
                (text, bbox, font, size)
            })
            .collect();

        let measurer: &dyn TextMeasurer = &self.measurer;
        let mut scale = 1.0_f64;
        for (text, bbox, font, size) in &slots {
            if !size.is_finite() || *size <= 0.0 {
                continue;
            }
            let outcome = fit_font_size(measurer, font, text, bbox, *size, &self.fit);
            scale = scale.min(outcome.size() / size);
        }

        let fragments: Vec<FragmentLayout> = slots
            .into_iter()
            .map(|(text, bbox, font, size)| {
                let font_size = if size.is_finite() {
                    (size * scale).max(self.fit.min_font_size.min(size))
                } else {
                    self.fit.min_font_size
                };
                let (lines, fits) = if text.trim().is_empty() {
                    (Vec::new(), true)
                } else {
                    let layout = layout_at(measurer, &font, font_size, &text, &bbox, &self.fit);
                    let fits = layout.fits(&bbox);
                    (layout.lines, fits)
                };
                FragmentLayout {
                    text,
                    bbox,
                    font,
                    font_size,
                    lines,
                    fits,
                }
            })
            .collect();

        let reflow = BlockReflow { fragments, scale };
        let exhausted = reflow.exhausted();
        if !exhausted.is_empty() {
            log::warn!(
                "{} of {} fragment(s) overflow at the minimum size",
                exhausted.len(),
                reflow.fragments.len()
            );
        }
        reflow
    }

    /// Fit a single piece of text into a box.
    pub fn fit(&self, font: &str, text: &str, bbox: &BBox, original_size: f64) -> FitOutcome {
        fit_font_size(&self.measurer, font, text, bbox, original_size, &self.fit)
    }
}
