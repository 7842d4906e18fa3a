//! Anchoring statistics and per-asset decisions.

use serde::{Deserialize, Serialize};

/// Rule that selected an asset's anchor block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRule {
    /// The block contains the asset's center
    Containment,
    /// Nearest block by vertical gap, then horizontal offset, then reading order
    Proximity,
}

/// How one asset was anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorDecision {
    /// Asset ID
    pub asset_id: String,
    /// Chosen block ID
    pub block_id: String,
    /// Selection rule
    pub rule: AnchorRule,
    /// Vertical gap between asset and block (0 for containment)
    pub distance: f64,
    /// Whether candidates were restricted to the asset's column
    pub same_column: bool,
}

/// Result summary of one anchoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchoringReport {
    /// Number of assets in the ledger
    pub total_assets: usize,

    /// Number of assets attached to a block
    pub anchored_assets: usize,

    /// IDs of assets left without a block, in ledger order
    pub unanchored_assets: Vec<String>,

    /// Human-readable notes on soft failures
    pub warnings: Vec<String>,

    /// anchored / total (1.0 for an empty ledger)
    pub success_rate: f64,

    /// Share of anchored assets whose column-relative placement round-trips
    pub geometry_pass_rate: f64,

    /// Per-asset decisions, in ledger order
    pub decisions: Vec<AnchorDecision>,
}

impl AnchoringReport {
    /// Create an empty report for a ledger of the given size.
    pub fn new(total_assets: usize) -> Self {
        Self {
            total_assets,
            ..Default::default()
        }
    }

    /// Record an anchored asset.
    pub fn add_anchored(&mut self, decision: AnchorDecision) {
        self.anchored_assets += 1;
        self.decisions.push(decision);
    }

    /// Record an unanchored asset with the reason.
    pub fn add_unanchored(&mut self, asset_id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Asset {} left unanchored: {}", asset_id, reason);
        self.unanchored_assets.push(asset_id.to_string());
        self.warnings.push(format!("{}: {}", asset_id, reason));
    }

    /// Add a warning that does not affect anchoring.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Compute the rates from the counters.
    pub fn finish(&mut self, geometry_passed: usize) {
        self.success_rate = ratio(self.anchored_assets, self.total_assets);
        self.geometry_pass_rate = ratio(geometry_passed, self.anchored_assets);
    }

    /// Check if every asset was anchored.
    pub fn is_complete(&self) -> bool {
        self.unanchored_assets.is_empty()
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let mut report = AnchoringReport::new(4);
        for id in ["a", "b", "c"] {
            report.add_anchored(AnchorDecision {
                asset_id: id.to_string(),
                block_id: "b1".to_string(),
                rule: AnchorRule::Proximity,
                distance: 4.0,
                same_column: true,
            });
        }
        report.add_unanchored("d", "no blocks on page 3");
        report.finish(2);

        assert_eq!(report.success_rate, 0.75);
        assert!((report.geometry_pass_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.unanchored_assets, vec!["d"]);
        assert_eq!(report.warnings, vec!["d: no blocks on page 3"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_empty_report_rates() {
        let mut report = AnchoringReport::new(0);
        report.finish(0);
        assert_eq!(report.success_rate, 1.0);
        assert_eq!(report.geometry_pass_rate, 1.0);
        assert!(report.is_complete());
    }
}
