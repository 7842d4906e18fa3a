//! Splitting translated text across a block's original fragments.

use serde::{Deserialize, Serialize};

use crate::model::BBox;
use crate::options::SplitOptions;

/// One originally separate run of text inside a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanFragment {
    /// Source text of the fragment
    pub text: String,

    /// Where the fragment was drawn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    /// Source font size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    /// Source font name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

impl SpanFragment {
    /// Create a fragment from its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the fragment box.
    pub fn with_bbox(mut self, bbox: BBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the fragment font and size.
    pub fn with_font(mut self, font: impl Into<String>, size: f64) -> Self {
        self.font = Some(font.into());
        self.font_size = Some(size);
        self
    }
}

impl From<&str> for SpanFragment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese may break between any two such characters; Korean
/// uses word spaces and is not included.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs
    (0x4E00..=0x9FFF).contains(&code)
    // Extension A
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

fn is_break_after(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '\u{2010}' | '\u{00AD}')
}

/// Whether a cut before `chars[pos]` falls on a word boundary.
fn is_boundary(chars: &[char], pos: usize) -> bool {
    if pos == 0 || pos >= chars.len() {
        return false;
    }
    let (before, after) = (chars[pos - 1], chars[pos]);
    is_break_after(before) || (is_spaceless_script_char(before) && is_spaceless_script_char(after))
}

/// Closest boundary to `ideal` within `window` characters, strictly after `lower`.
///
/// At equal distance the left candidate wins.
fn nearest_boundary(chars: &[char], ideal: usize, lower: usize, window: usize) -> Option<usize> {
    (0..=window).find_map(|d| {
        let left = ideal.checked_sub(d).filter(|&p| p > lower && is_boundary(chars, p));
        let right = Some(ideal + d).filter(|&p| d > 0 && p > lower && is_boundary(chars, p));
        left.or(right)
    })
}

/// Split translated text into one part per original fragment.
///
/// Uses the default boundary window; see [`split_translation_with`].
pub fn split_translation_by_spans(spans: &[SpanFragment], translated: &str) -> Vec<String> {
    split_translation_with(spans, translated, &SplitOptions::default())
}

/// Split translated text into one part per original fragment.
///
/// Each part receives roughly the share of characters its fragment had in the
/// source. Cuts snap to the nearest whitespace, hyphen or ideograph boundary
/// within `boundary_window` characters of the proportional position, and fall
/// back to a hard cut (possibly mid-word) when there is none. The parts always
/// concatenate back to `translated`, and there is exactly one part per
/// fragment (a single part when there are no fragments).
pub fn split_translation_with(
    spans: &[SpanFragment],
    translated: &str,
    options: &SplitOptions,
) -> Vec<String> {
    if spans.len() <= 1 {
        return vec![translated.to_string()];
    }

    let chars: Vec<char> = translated.chars().collect();
    let total = chars.len();

    let mut weights: Vec<usize> = spans.iter().map(|s| s.text.chars().count()).collect();
    if weights.iter().all(|&w| w == 0) {
        weights = vec![1; spans.len()];
    }
    let weight_sum: usize = weights.iter().sum();

    let mut cuts = Vec::with_capacity(spans.len() - 1);
    let mut prev = 0usize;
    let mut cumulative = 0usize;
    for weight in &weights[..weights.len() - 1] {
        cumulative += weight;
        // round(total * cumulative / weight_sum), halves rounding up
        let ideal = (2 * total * cumulative + weight_sum) / (2 * weight_sum);
        let ideal = ideal.clamp(prev, total);
        let cut = match nearest_boundary(&chars, ideal, prev, options.boundary_window) {
            Some(cut) => cut,
            None => {
                log::debug!("No word boundary near char {}, cutting mid-word", ideal);
                ideal
            }
        };
        cuts.push(cut);
        prev = cut;
    }

    let mut parts = Vec::with_capacity(spans.len());
    let mut start = 0usize;
    for cut in cuts.into_iter().chain(std::iter::once(total)) {
        parts.push(chars[start..cut].iter().collect());
        start = cut;
    }
    parts
}
