//! Integrity checks over asset reference tokens.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::{is_valid_asset_id, scan, Construct};
use crate::model::{AssetLedger, Document};

/// A single broken asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerViolation {
    /// An anchored asset has no token anywhere in the document
    Missing { asset_id: String, block_id: String },

    /// An anchored asset's token occurs more than once
    Duplicated { asset_id: String, count: usize },

    /// The same token occurs in more than one block
    SplitAcrossBlocks {
        asset_id: String,
        block_ids: Vec<String>,
    },

    /// A `[[` construct does not follow the token grammar
    Malformed { block_id: String, snippet: String },

    /// An anchored asset's ID cannot be written as a token
    InvalidAssetId { asset_id: String },

    /// A token names an asset absent from the ledger
    Orphan { asset_id: String, block_id: String },

    /// A token sits in a block its asset is not anchored to
    Misplaced {
        asset_id: String,
        block_id: String,
        expected: Option<String>,
    },

    /// An asset is anchored to a block that does not exist
    DanglingAnchor { asset_id: String, block_id: String },
}

impl MarkerViolation {
    /// ID of the asset involved, when there is one.
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            MarkerViolation::Missing { asset_id, .. }
            | MarkerViolation::Duplicated { asset_id, .. }
            | MarkerViolation::SplitAcrossBlocks { asset_id, .. }
            | MarkerViolation::InvalidAssetId { asset_id }
            | MarkerViolation::Orphan { asset_id, .. }
            | MarkerViolation::Misplaced { asset_id, .. }
            | MarkerViolation::DanglingAnchor { asset_id, .. } => Some(asset_id),
            MarkerViolation::Malformed { .. } => None,
        }
    }
}

impl fmt::Display for MarkerViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerViolation::Missing { asset_id, block_id } => {
                write!(f, "missing token for asset {} (anchored to {})", asset_id, block_id)
            }
            MarkerViolation::Duplicated { asset_id, count } => {
                write!(f, "token for asset {} occurs {} times", asset_id, count)
            }
            MarkerViolation::SplitAcrossBlocks { asset_id, block_ids } => write!(
                f,
                "token for asset {} occurs in blocks {}",
                asset_id,
                block_ids.join(", ")
            ),
            MarkerViolation::Malformed { block_id, snippet } => {
                write!(f, "malformed reference {:?} in block {}", snippet, block_id)
            }
            MarkerViolation::InvalidAssetId { asset_id } => {
                write!(f, "asset id {:?} cannot be written as a token", asset_id)
            }
            MarkerViolation::Orphan { asset_id, block_id } => write!(
                f,
                "token for unknown asset {} in block {}",
                asset_id, block_id
            ),
            MarkerViolation::Misplaced {
                asset_id,
                block_id,
                expected: Some(expected),
            } => write!(
                f,
                "token for asset {} in block {} (anchored to {})",
                asset_id, block_id, expected
            ),
            MarkerViolation::Misplaced {
                asset_id,
                block_id,
                expected: None,
            } => write!(
                f,
                "token for unanchored asset {} in block {}",
                asset_id, block_id
            ),
            MarkerViolation::DanglingAnchor { asset_id, block_id } => write!(
                f,
                "asset {} is anchored to missing block {}",
                asset_id, block_id
            ),
        }
    }
}

/// Every violation found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerInjectionError {
    /// Violations in ledger order, followed by orphans and malformed constructs
    pub violations: Vec<MarkerViolation>,
}

impl MarkerInjectionError {
    /// Deduplicated IDs of every asset involved in a violation.
    pub fn offending_asset_ids(&self) -> Vec<&str> {
        let ids: BTreeSet<&str> = self
            .violations
            .iter()
            .filter_map(MarkerViolation::asset_id)
            .collect();
        ids.into_iter().collect()
    }
}

impl fmt::Display for MarkerInjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Marker injection failed with {} violation(s)",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for MarkerInjectionError {}

/// Check every token in the document against the ledger.
///
/// Returns all violations; an empty list means the reference graph is intact.
pub fn collect_violations(document: &Document, ledger: &AssetLedger) -> Vec<MarkerViolation> {
    let mut violations = Vec::new();
    let mut malformed = Vec::new();
    // asset id -> block id of every occurrence, in document order
    let mut occurrences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let block_ids: BTreeSet<&str> = document.blocks().map(|b| b.id.as_str()).collect();

    for block in document.blocks() {
        for construct in scan(&block.content) {
            match construct {
                Construct::Token(marker) => occurrences
                    .entry(marker.asset_id)
                    .or_default()
                    .push(block.id.clone()),
                Construct::Malformed(snippet) => malformed.push(MarkerViolation::Malformed {
                    block_id: block.id.clone(),
                    snippet,
                }),
            }
        }
    }

    for asset in ledger.iter() {
        let found = occurrences.get(&asset.id).map(Vec::as_slice).unwrap_or(&[]);

        let Some(anchor) = asset.anchor() else {
            for block_id in distinct(found) {
                violations.push(MarkerViolation::Misplaced {
                    asset_id: asset.id.clone(),
                    block_id,
                    expected: None,
                });
            }
            continue;
        };

        if !is_valid_asset_id(&asset.id) {
            violations.push(MarkerViolation::InvalidAssetId {
                asset_id: asset.id.clone(),
            });
            continue;
        }
        if !block_ids.contains(anchor) {
            violations.push(MarkerViolation::DanglingAnchor {
                asset_id: asset.id.clone(),
                block_id: anchor.to_string(),
            });
        }

        match found.len() {
            0 => violations.push(MarkerViolation::Missing {
                asset_id: asset.id.clone(),
                block_id: anchor.to_string(),
            }),
            1 => {}
            count => violations.push(MarkerViolation::Duplicated {
                asset_id: asset.id.clone(),
                count,
            }),
        }

        let blocks = distinct(found);
        if blocks.len() > 1 {
            violations.push(MarkerViolation::SplitAcrossBlocks {
                asset_id: asset.id.clone(),
                block_ids: blocks.clone(),
            });
        }
        for block_id in blocks.into_iter().filter(|b| b != anchor) {
            violations.push(MarkerViolation::Misplaced {
                asset_id: asset.id.clone(),
                block_id,
                expected: Some(anchor.to_string()),
            });
        }
    }

    for (asset_id, found) in &occurrences {
        if !ledger.contains(asset_id) {
            for block_id in distinct(found) {
                violations.push(MarkerViolation::Orphan {
                    asset_id: asset_id.clone(),
                    block_id,
                });
            }
        }
    }

    violations.extend(malformed);
    violations
}

/// Fail with every violation when the document's references are broken.
pub fn validate_markers(
    document: &Document,
    ledger: &AssetLedger,
) -> std::result::Result<(), MarkerInjectionError> {
    let violations = collect_violations(document, ledger);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(MarkerInjectionError { violations })
    }
}

/// Block IDs in first-seen order without repeats.
fn distinct(block_ids: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    block_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
