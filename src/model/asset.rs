//! Non-text assets (images, vector drawings, tables) and their ledger.

use serde::{Deserialize, Serialize};

use super::{BBox, NormalizedBBox};

/// Kind of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Raster image
    Image,
    /// Vector drawing
    Vector,
    /// Table rendered as an asset
    Table,
}

/// An extracted asset with its source position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset ID
    pub id: String,

    /// Asset kind
    #[serde(rename = "type")]
    pub asset_type: AssetType,

    /// Position on the page
    pub bbox: BBox,

    /// Page number (1-indexed)
    pub page: u32,

    /// Occurrence index when the same resource appears several times
    #[serde(default)]
    pub occurrence: u32,

    /// ID of the block the asset is anchored to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_to: Option<String>,
}

impl Asset {
    /// Create a new, unanchored asset.
    pub fn new(id: impl Into<String>, asset_type: AssetType, bbox: BBox, page: u32) -> Self {
        Self {
            id: id.into(),
            asset_type,
            bbox,
            page,
            occurrence: 0,
            anchor_to: None,
        }
    }

    /// Set the occurrence index.
    pub fn with_occurrence(mut self, occurrence: u32) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// Set the anchor block.
    pub fn with_anchor(mut self, block_id: impl Into<String>) -> Self {
        self.anchor_to = Some(block_id.into());
        self
    }

    /// Check if the asset is anchored to a block.
    pub fn is_anchored(&self) -> bool {
        self.anchor_to.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Anchor block ID, treating an empty string as no anchor.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor_to.as_deref().filter(|id| !id.is_empty())
    }
}

/// All assets extracted from one document, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetLedger {
    /// Assets in extraction order
    pub assets: Vec<Asset>,
}

impl AssetLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger from a list of assets.
    pub fn from_assets(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// Add an asset.
    pub fn add(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Get an asset by ID.
    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Check whether an asset ID is present.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over assets.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Assets anchored to a block, in ledger order.
    pub fn anchored_to<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a Asset> + 'a {
        self.assets.iter().filter(move |a| a.anchor() == Some(block_id))
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the ledger has no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Column-relative position of an anchored asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPlacement {
    /// Asset ID
    pub asset_id: String,

    /// Page number
    pub page: u32,

    /// ID of the owning column on that page
    pub column_id: usize,

    /// Asset box as fractions of the column
    pub normalized: NormalizedBBox,
}

/// Ledger produced by the anchoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchoredLedger {
    /// Assets with `anchor_to` resolved
    pub ledger: AssetLedger,

    /// Column-relative placements of anchored assets that lie inside a column
    pub placements: Vec<AssetPlacement>,
}

impl AnchoredLedger {
    /// Get the placement for an asset.
    pub fn placement(&self, asset_id: &str) -> Option<&AssetPlacement> {
        self.placements.iter().find(|p| p.asset_id == asset_id)
    }
}
