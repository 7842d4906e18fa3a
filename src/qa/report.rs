//! Geometry QA report types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::BBox;

/// An asset box on a rendered (or to-be-rendered) page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBox {
    /// Asset id
    pub asset_id: String,

    /// 1-based page number
    pub page: u32,

    /// Box on the page
    pub bbox: BBox,
}

impl PlacedBox {
    /// Create a placed box.
    pub fn new(asset_id: impl Into<String>, page: u32, bbox: BBox) -> Self {
        Self {
            asset_id: asset_id.into(),
            page,
            bbox,
        }
    }
}

/// How far one asset landed from where it should be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDeviation {
    /// Asset id
    pub asset_id: String,

    /// Page of the expected box
    pub page: u32,

    /// Page the asset was actually placed on
    pub actual_page: u32,

    /// Largest corner displacement in points
    pub absolute: f64,

    /// `absolute` relative to the larger side of the expected box
    pub relative: f64,

    /// Allowed displacement for this asset
    pub threshold: f64,

    /// Horizontal center displacement (actual minus expected)
    pub dx: f64,

    /// Vertical center displacement (actual minus expected)
    pub dy: f64,

    /// Whether the asset is within tolerance
    pub passed: bool,

    /// Whether the displacement is part of a page-wide shift
    #[serde(default)]
    pub systematic: bool,
}

/// A page-level finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageWarning {
    /// Most assets on the page moved the same way.
    SystematicOffset {
        page: u32,
        /// Mean horizontal shift of the group
        dx: f64,
        /// Mean vertical shift of the group
        dy: f64,
        /// Assets in the group
        affected: usize,
        /// Assets compared on the page
        total: usize,
        /// `affected / total`
        share: f64,
    },
}

impl PageWarning {
    /// Page the warning is about.
    pub fn page(&self) -> u32 {
        match self {
            PageWarning::SystematicOffset { page, .. } => *page,
        }
    }
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageWarning::SystematicOffset {
                page,
                dx,
                dy,
                affected,
                total,
                ..
            } => write!(
                f,
                "Page {}: {} of {} assets shifted by ({:.1}, {:.1})pt",
                page, affected, total, dx, dy
            ),
        }
    }
}

/// Outcome of comparing placed assets with their expected boxes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryReport {
    /// Assets compared
    pub total: usize,

    /// Assets within tolerance
    pub passed: usize,

    /// Assets outside tolerance
    pub failed: usize,

    /// One entry per compared asset, in expected order
    pub deviations: Vec<AssetDeviation>,

    /// Page-level findings
    pub page_warnings: Vec<PageWarning>,

    /// Suggested follow-ups
    pub recommendations: Vec<String>,

    /// `passed / total`, 1.0 when nothing was compared
    pub pass_rate: f64,
}

impl GeometryReport {
    /// Check if every compared asset is within tolerance.
    pub fn is_pass(&self) -> bool {
        self.failed == 0
    }

    /// Deviations that failed.
    pub fn failures(&self) -> impl Iterator<Item = &AssetDeviation> {
        self.deviations.iter().filter(|d| !d.passed)
    }

    /// Look up the deviation of an asset.
    pub fn deviation(&self, asset_id: &str) -> Option<&AssetDeviation> {
        self.deviations.iter().find(|d| d.asset_id == asset_id)
    }
}
