//! # relayout
//!
//! Spatial reconstruction of translated documents.
//!
//! Translation changes text length; this library keeps images, drawings and
//! tables attached to the right text blocks and fits the translated text back
//! into the original footprint.
//!
//! ## Quick Start
//!
//! ```
//! use relayout::model::{Asset, AssetLedger, AssetType, BBox, BlockType, ContentBlock, Document, Section};
//! use relayout::Relayout;
//!
//! fn main() -> relayout::Result<()> {
//!     let mut doc = Document::new();
//!     doc.add_section(Section::new(vec![ContentBlock::new(
//!         "p1",
//!         BlockType::Paragraph,
//!         BBox::new(50.0, 100.0, 300.0, 200.0)?,
//!         1,
//!         0,
//!         "Body text",
//!     )]));
//!
//!     let ledger = AssetLedger::from_assets(vec![Asset::new(
//!         "fig1",
//!         AssetType::Image,
//!         BBox::new(60.0, 120.0, 160.0, 180.0)?,
//!         1,
//!     )]);
//!
//!     let result = Relayout::new().process(&doc, &ledger)?;
//!     assert_eq!(result.report.anchored_assets, 1);
//!     assert!(result.document.get_block("p1").unwrap().content.starts_with("[[ASSET:fig1]]"));
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - **Anchoring** ([`anchor`]): attach each asset to its owning block
//! - **Columns and normalization** ([`layout`]): column-relative asset boxes
//! - **Markers** ([`markers`]): inline `[[ASSET:<id>]]` references, fail-closed
//! - **Reflow** ([`reflow`]): word-boundary splitting and font-size search
//! - **Geometry QA** ([`qa`]): placed vs expected boxes, systematic offsets

pub mod anchor;
pub mod error;
pub mod export;
pub mod layout;
pub mod markers;
pub mod model;
pub mod options;
pub mod qa;
pub mod reflow;

// Re-export commonly used types
pub use anchor::{anchor_assets_to_blocks, AnchorDecision, AnchorRule, AnchoringReport};
pub use error::{Error, Result};
pub use export::{to_json, JsonFormat};
pub use layout::{compute_normalized_bbox, denormalize, detect_columns, Column, ColumnLayout};
pub use markers::{inject_markers, validate_markers, MarkerInjectionError, MarkerViolation};
pub use model::{
    AnchoredLedger, Asset, AssetLedger, AssetPlacement, AssetType, BBox, BlockType, ContentBlock,
    Document, NormalizedBBox, Section,
};
pub use options::{
    AnchorOptions, ColumnOptions, FitOptions, LayoutOptions, QaOptions, SplitOptions,
};
pub use qa::{validate_geometry, GeometryReport, PageWarning, PlacedBox};
pub use reflow::{
    fit_font_size, split_translation_by_spans, ApproxMeasurer, FitOutcome, ReflowEngine,
    SpanFragment, TextMeasurer,
};

use serde::Serialize;

/// Builder running anchoring and marker injection over documents.
///
/// # Example
///
/// ```
/// use relayout::{AnchorOptions, LayoutOptions, Relayout};
///
/// let relayout = Relayout::new()
///     .with_options(LayoutOptions::new().with_anchor(AnchorOptions::new().with_max_distance(120.0)))
///     .sequential();
/// assert!(!relayout.options().parallel);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Relayout {
    options: LayoutOptions,
}

impl Relayout {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options.
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    /// Set anchoring options.
    pub fn with_anchor_options(mut self, anchor: AnchorOptions) -> Self {
        self.options = self.options.with_anchor(anchor);
        self
    }

    /// Set QA options.
    pub fn with_qa_options(mut self, qa: QaOptions) -> Self {
        self.options = self.options.with_qa(qa);
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Current options.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Anchor every asset and inject reference markers.
    ///
    /// Anchoring problems are soft and end up in the report; a broken marker
    /// reference fails the whole document.
    pub fn process(&self, document: &Document, ledger: &AssetLedger) -> Result<RelayoutResult> {
        self.options.validate()?;

        let (anchored, report) = anchor_assets_to_blocks(ledger, document, &self.options.anchor);
        log::debug!(
            "Anchored {}/{} assets across {} page(s)",
            report.anchored_assets,
            report.total_assets,
            document.pages().len()
        );

        let annotated = inject_markers(document, &anchored.ledger)?;

        Ok(RelayoutResult {
            document: annotated,
            ledger: anchored,
            report,
        })
    }

    /// Process independent documents, keeping input order.
    pub fn process_batch(&self, jobs: &[(Document, AssetLedger)]) -> Vec<Result<RelayoutResult>> {
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            use rayon::prelude::*;
            return jobs
                .par_iter()
                .map(|(document, ledger)| self.process(document, ledger))
                .collect();
        }

        jobs.iter()
            .map(|(document, ledger)| self.process(document, ledger))
            .collect()
    }

    /// Reflow engine configured with these options.
    pub fn reflow_engine<M: TextMeasurer>(&self, measurer: M) -> ReflowEngine<M> {
        ReflowEngine::new(measurer)
            .with_split_options(self.options.split.clone())
            .with_fit_options(self.options.fit.clone())
    }

    /// Compare placed boxes with expected boxes using these options.
    pub fn validate_geometry(&self, expected: &[PlacedBox], actual: &[PlacedBox]) -> GeometryReport {
        validate_geometry(expected, actual, &self.options.qa)
    }
}

/// Annotated document with its anchored ledger and report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayoutResult {
    /// Copy of the input with reference markers injected
    pub document: Document,
    /// Ledger with anchors and column placements
    pub ledger: AnchoredLedger,
    /// Anchoring outcome
    pub report: AnchoringReport,
}

impl RelayoutResult {
    /// Check if every asset was anchored.
    pub fn is_complete(&self) -> bool {
        self.report.is_complete()
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        export::to_json(self, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relayout_builder() {
        let relayout = Relayout::new()
            .with_anchor_options(AnchorOptions::new().with_max_distance(50.0))
            .with_qa_options(QaOptions::new().with_tolerance(1.0, 0.01))
            .sequential();

        assert_eq!(relayout.options().anchor.max_distance, 50.0);
        assert_eq!(relayout.options().qa.tolerance_pt, 1.0);
        assert!(!relayout.options().parallel);
    }

    #[test]
    fn test_relayout_default_parallel() {
        let relayout = Relayout::new();
        assert!(relayout.options().parallel);
    }

    #[test]
    fn test_process_rejects_invalid_options() {
        let relayout = Relayout::new().with_anchor_options(AnchorOptions::new().with_max_distance(-1.0));
        let result = relayout.process(&Document::new(), &AssetLedger::new());
        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_process_empty() {
        let result = Relayout::new()
            .process(&Document::new(), &AssetLedger::new())
            .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.report.success_rate, 1.0);
    }
}
