//! Tunable options for every layout stage.
//!
//! Each stage takes its options by reference. `LayoutOptions` bundles them and
//! can be loaded from a partial JSON document, with unspecified fields keeping
//! their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for column detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    /// Largest horizontal gap (points) between x-ranges that still merges them
    pub merge_gap: f64,
}

impl ColumnOptions {
    /// Create column options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the merge gap.
    pub fn with_merge_gap(mut self, gap: f64) -> Self {
        self.merge_gap = gap;
        self
    }
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self { merge_gap: 12.0 }
    }
}

/// Options for asset anchoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    /// Largest vertical gap (points) between an asset and its anchor block
    pub max_distance: f64,

    /// Restrict candidates to the asset's column when it has blocks
    pub prefer_same_column: bool,

    /// Tolerance (points) for the normalize/denormalize round trip check
    pub roundtrip_tolerance: f64,

    /// Column detection used to build per-page frames
    pub columns: ColumnOptions,
}

impl AnchorOptions {
    /// Create anchoring options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum anchoring distance.
    pub fn with_max_distance(mut self, distance: f64) -> Self {
        self.max_distance = distance;
        self
    }

    /// Enable or disable same-column preference.
    pub fn with_same_column(mut self, prefer: bool) -> Self {
        self.prefer_same_column = prefer;
        self
    }

    /// Set column detection options.
    pub fn with_columns(mut self, columns: ColumnOptions) -> Self {
        self.columns = columns;
        self
    }
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            max_distance: 200.0,
            prefer_same_column: true,
            roundtrip_tolerance: 1e-6,
            columns: ColumnOptions::default(),
        }
    }
}

/// Options for splitting translated text across fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Characters searched on each side of a proportional cut for a word boundary
    pub boundary_window: usize,
}

impl SplitOptions {
    /// Create split options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the boundary search window.
    pub fn with_boundary_window(mut self, window: usize) -> Self {
        self.boundary_window = window;
        self
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            boundary_window: 12,
        }
    }
}

/// Options for font-size search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Legibility floor in points
    pub min_font_size: f64,

    /// Decrement between tested sizes
    pub step: f64,

    /// Multiplier applied to measured line heights
    pub line_spacing: f64,

    /// Wrap text at the box width; when false the text must fit on one line per paragraph
    pub wrap: bool,
}

impl FitOptions {
    /// Create fit options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the legibility floor.
    pub fn with_min_font_size(mut self, size: f64) -> Self {
        self.min_font_size = size;
        self
    }

    /// Set the size step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Set the line spacing multiplier.
    pub fn with_line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Disable wrapping.
    pub fn no_wrap(mut self) -> Self {
        self.wrap = false;
        self
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_font_size: 6.0,
            step: 0.5,
            line_spacing: 1.0,
            wrap: true,
        }
    }
}

/// Options for geometry QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaOptions {
    /// Absolute deviation floor in points
    pub tolerance_pt: f64,

    /// Relative deviation threshold as a fraction of the asset size
    pub tolerance_pct: f64,

    /// Share of a page's assets that must agree to report a systematic offset
    pub systematic_share: f64,

    /// Fewest compared assets on a page before systematic detection runs
    pub systematic_min_assets: usize,

    /// Largest angle (degrees) between deviation vectors in one group
    pub angle_band_deg: f64,

    /// Absolute magnitude band (points) for deviation vectors in one group
    pub magnitude_band_pt: f64,

    /// Relative magnitude band for deviation vectors in one group
    pub magnitude_band_pct: f64,
}

impl QaOptions {
    /// Create QA options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both deviation tolerances.
    pub fn with_tolerance(mut self, tolerance_pt: f64, tolerance_pct: f64) -> Self {
        self.tolerance_pt = tolerance_pt;
        self.tolerance_pct = tolerance_pct;
        self
    }

    /// Set the systematic-offset share threshold.
    pub fn with_systematic_share(mut self, share: f64) -> Self {
        self.systematic_share = share;
        self
    }

    /// Set the minimum asset count for systematic detection.
    pub fn with_systematic_min_assets(mut self, count: usize) -> Self {
        self.systematic_min_assets = count;
        self
    }
}

impl Default for QaOptions {
    fn default() -> Self {
        Self {
            tolerance_pt: 2.0,
            tolerance_pct: 0.02,
            systematic_share: 0.8,
            systematic_min_assets: 3,
            angle_band_deg: 5.0,
            magnitude_band_pt: 1.0,
            magnitude_band_pct: 0.1,
        }
    }
}

/// All layout options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Anchoring (includes column detection)
    pub anchor: AnchorOptions,

    /// Fragment splitting
    pub split: SplitOptions,

    /// Font-size search
    pub fit: FitOptions,

    /// Geometry QA
    pub qa: QaOptions,

    /// Process batches of documents in parallel
    pub parallel: bool,
}

impl LayoutOptions {
    /// Create layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Set anchoring options.
    pub fn with_anchor(mut self, anchor: AnchorOptions) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set split options.
    pub fn with_split(mut self, split: SplitOptions) -> Self {
        self.split = split;
        self
    }

    /// Set fit options.
    pub fn with_fit(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// Set QA options.
    pub fn with_qa(mut self, qa: QaOptions) -> Self {
        self.qa = qa;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Reject option values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidOptions(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )))
            }
        };

        non_negative("anchor.columns.merge_gap", self.anchor.columns.merge_gap)?;
        non_negative("anchor.max_distance", self.anchor.max_distance)?;
        non_negative("anchor.roundtrip_tolerance", self.anchor.roundtrip_tolerance)?;
        non_negative("qa.tolerance_pt", self.qa.tolerance_pt)?;
        non_negative("qa.tolerance_pct", self.qa.tolerance_pct)?;
        non_negative("qa.angle_band_deg", self.qa.angle_band_deg)?;
        non_negative("qa.magnitude_band_pt", self.qa.magnitude_band_pt)?;
        non_negative("qa.magnitude_band_pct", self.qa.magnitude_band_pct)?;

        if !(self.fit.step.is_finite() && self.fit.step > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "fit.step must be positive, got {}",
                self.fit.step
            )));
        }
        if !(self.fit.min_font_size.is_finite() && self.fit.min_font_size > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "fit.min_font_size must be positive, got {}",
                self.fit.min_font_size
            )));
        }
        if !(self.fit.line_spacing.is_finite() && self.fit.line_spacing > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "fit.line_spacing must be positive, got {}",
                self.fit.line_spacing
            )));
        }
        if !(0.0..=1.0).contains(&self.qa.systematic_share) {
            return Err(Error::InvalidOptions(format!(
                "qa.systematic_share must be within [0, 1], got {}",
                self.qa.systematic_share
            )));
        }
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            anchor: AnchorOptions::default(),
            split: SplitOptions::default(),
            fit: FitOptions::default(),
            qa: QaOptions::default(),
            parallel: true,
        }
    }
}
