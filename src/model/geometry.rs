//! Geometry primitives: absolute and column-relative bounding boxes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Slack allowed when checking the unit-square invariant of normalized boxes.
pub const NORMALIZED_EPSILON: f64 = 1e-9;

/// An axis-aligned bounding box in page points, top-left origin.
///
/// Serialized as `[x0, y0, x1, y1]`. Deserialization runs the same checks as
/// [`BBox::new`], so malformed geometry never reaches the layout code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl BBox {
    /// Create a bounding box, rejecting inverted or non-finite corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBBox(format!(
                "non-finite coordinates ({}, {}, {}, {})",
                x0, y0, x1, y1
            )));
        }
        if x0 > x1 || y0 > y1 {
            return Err(Error::InvalidBBox(format!(
                "inverted corners ({}, {}, {}, {})",
                x0, y0, x1, y1
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Create a bounding box from two arbitrary corners, ordering them.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Result<Self> {
        Self::new(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by))
    }

    /// Create a bounding box from its origin and size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        Self::new(x, y, x + width, y + height)
    }

    /// Left edge.
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// Top edge.
    pub fn y0(&self) -> f64 {
        self.y0
    }

    /// Right edge.
    pub fn x1(&self) -> f64 {
        self.x1
    }

    /// Bottom edge.
    pub fn y1(&self) -> f64 {
        self.y1
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Width times height; zero for degenerate boxes.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point as `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Check whether a point lies inside the box (edges included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Check whether another box lies entirely inside this one.
    pub fn contains(&self, other: &BBox) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    /// Check whether the two boxes share any area or edge.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Overlapping region of two boxes, if any.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        })
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Vertical gap between the two boxes; zero when they overlap vertically.
    pub fn vertical_gap(&self, other: &BBox) -> f64 {
        if other.y0 > self.y1 {
            other.y0 - self.y1
        } else if self.y0 > other.y1 {
            self.y0 - other.y1
        } else {
            0.0
        }
    }

    /// Absolute difference between the horizontal centers of the two boxes.
    pub fn horizontal_center_offset(&self, other: &BBox) -> f64 {
        (self.center().0 - other.center().0).abs()
    }

    /// Box translated by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> BBox {
        BBox {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Corners as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl TryFrom<[f64; 4]> for BBox {
    type Error = Error;

    fn try_from(value: [f64; 4]) -> Result<Self> {
        BBox::new(value[0], value[1], value[2], value[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        bbox.to_array()
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2}, {:.2})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// A bounding box expressed as fractions of its owning column.
///
/// Invariant: every component lies in `[0, 1]`, `x + w <= 1` and `y + h <= 1`
/// (within [`NORMALIZED_EPSILON`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NormalizedBBoxRepr", into = "NormalizedBBoxRepr")]
pub struct NormalizedBBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl NormalizedBBox {
    /// Create a normalized box, rejecting values outside the unit square.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Result<Self> {
        let in_unit = |v: f64| v.is_finite() && (-NORMALIZED_EPSILON..=1.0 + NORMALIZED_EPSILON).contains(&v);
        if !(in_unit(x) && in_unit(y) && in_unit(w) && in_unit(h)) {
            return Err(Error::InvalidNormalizedBBox(format!(
                "component outside [0, 1]: ({}, {}, {}, {})",
                x, y, w, h
            )));
        }
        if x + w > 1.0 + NORMALIZED_EPSILON || y + h > 1.0 + NORMALIZED_EPSILON {
            return Err(Error::InvalidNormalizedBBox(format!(
                "extends past the column: ({}, {}, {}, {})",
                x, y, w, h
            )));
        }
        Ok(Self { x, y, w, h })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn w(&self) -> f64 {
        self.w
    }

    pub fn h(&self) -> f64 {
        self.h
    }
}

#[derive(Serialize, Deserialize)]
struct NormalizedBBoxRepr {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl TryFrom<NormalizedBBoxRepr> for NormalizedBBox {
    type Error = Error;

    fn try_from(repr: NormalizedBBoxRepr) -> Result<Self> {
        NormalizedBBox::new(repr.x, repr.y, repr.w, repr.h)
    }
}

impl From<NormalizedBBox> for NormalizedBBoxRepr {
    fn from(n: NormalizedBBox) -> Self {
        Self {
            x: n.x,
            y: n.y,
            w: n.w,
            h: n.h,
        }
    }
}
