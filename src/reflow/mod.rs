//! Fitting translated text into the original footprint.
//!
//! Translated text rarely has the source length. This module splits it across
//! the block's original fragments on word boundaries and searches for a font
//! size at which every part fits its box.

mod engine;
mod fit;
mod measure;
mod split;

pub use engine::{BlockReflow, FragmentLayout, ReflowEngine, ReflowRequest};
pub use fit::{fit_font_size, wrap_text, FitOutcome};
pub use measure::{ApproxMeasurer, TextExtent, TextMeasurer};
pub use split::{split_translation_by_spans, split_translation_with, SpanFragment};
