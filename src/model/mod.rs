//! Document model types for spatial reconstruction.
//!
//! This module defines the fixed schema shared by every stage: positioned
//! content blocks grouped into sections, the asset ledger, and the geometry
//! primitives both are expressed in. Extraction collaborators produce these
//! values; the layout stages read them and return new ones.

mod asset;
mod document;
mod geometry;

pub use asset::{AnchoredLedger, Asset, AssetLedger, AssetPlacement, AssetType};
pub use document::{BlockType, ContentBlock, Document, Section};
pub use geometry::{BBox, NormalizedBBox, NORMALIZED_EPSILON};
