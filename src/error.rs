//! Error types for relayout.

use thiserror::Error;

use crate::markers::MarkerInjectionError;

/// Result type alias for relayout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during spatial reconstruction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A bounding box violates `x0 <= x1`, `y0 <= y1` or has non-finite coordinates.
    #[error("Invalid bounding box: {0}")]
    InvalidBBox(String),

    /// A normalized bounding box falls outside the unit square.
    #[error("Invalid normalized bounding box: {0}")]
    InvalidNormalizedBBox(String),

    /// A column with zero (or non-finite) width or height cannot act as a frame.
    #[error("Degenerate column {id} on page {page} ({width} x {height})")]
    DegenerateColumn {
        /// Column id
        id: usize,
        /// Page number
        page: u32,
        /// Column width
        width: f64,
        /// Column height
        height: f64,
    },

    /// A bounding box does not lie inside the column it is normalized against.
    #[error("Bounding box {bbox} lies outside column {column} on page {page}")]
    OutsideColumn {
        /// Offending box, formatted
        bbox: String,
        /// Column id
        column: usize,
        /// Page number
        page: u32,
    },

    /// Marker injection produced a document with broken asset references.
    #[error(transparent)]
    MarkerInjection(#[from] MarkerInjectionError),

    /// Option values that cannot be used.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Error serializing or deserializing reports, documents or options.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
