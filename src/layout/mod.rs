//! Page layout frames.
//!
//! Columns are the local coordinate frames used to carry asset positions
//! through translation: a box is stored as fractions of its column, so it
//! follows the column when the output column is narrower or wider.

mod columns;
mod normalize;

pub use columns::{detect_columns, Column, ColumnLayout};
pub use normalize::{compute_normalized_bbox, denormalize, normalize_asset};
