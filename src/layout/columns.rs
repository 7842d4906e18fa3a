//! Column detection by horizontal extent clustering.

use serde::{Deserialize, Serialize};

use crate::model::{BBox, ContentBlock};
use crate::options::ColumnOptions;

/// A vertical reading column on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column index (0 = leftmost)
    pub id: usize,
    /// Page number
    pub page: u32,
    /// Left boundary X coordinate
    pub x_min: f64,
    /// Right boundary X coordinate
    pub x_max: f64,
    /// Top boundary Y coordinate
    pub y_min: f64,
    /// Bottom boundary Y coordinate
    pub y_max: f64,
}

impl Column {
    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Check if an X coordinate falls within this column.
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x_min && x <= self.x_max
    }

    /// Check if a box's horizontal center falls within this column.
    pub fn contains_center_of(&self, bbox: &BBox) -> bool {
        self.contains_x(bbox.center().0)
    }

    /// Column extent as a bounding box, if it is well formed.
    pub fn bbox(&self) -> Option<BBox> {
        BBox::new(self.x_min, self.y_min, self.x_max, self.y_max).ok()
    }
}

/// Columns of one page together with the column owning each input block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    /// Columns, left to right
    pub columns: Vec<Column>,
    /// For each input block (by input position), the id of its column
    pub assignments: Vec<usize>,
}

impl ColumnLayout {
    /// Cluster the blocks of one page into columns.
    ///
    /// Blocks are visited by ascending `x0`; equal edges keep their input
    /// order. A block joins the open cluster when its left edge is no more
    /// than `merge_gap` past the cluster's right edge.
    pub fn detect(blocks: &[&ContentBlock], options: &ColumnOptions) -> Self {
        if blocks.is_empty() {
            return Self::default();
        }

        let page = blocks[0].page;
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by(|&a, &b| blocks[a].bbox.x0().total_cmp(&blocks[b].bbox.x0()));

        let mut columns: Vec<Column> = Vec::new();
        let mut assignments = vec![0usize; blocks.len()];

        for idx in order {
            let bbox = &blocks[idx].bbox;
            match columns.last_mut() {
                Some(col) if bbox.x0() <= col.x_max + options.merge_gap => {
                    col.x_max = col.x_max.max(bbox.x1());
                    col.y_min = col.y_min.min(bbox.y0());
                    col.y_max = col.y_max.max(bbox.y1());
                }
                _ => columns.push(Column {
                    id: columns.len(),
                    page,
                    x_min: bbox.x0(),
                    x_max: bbox.x1(),
                    y_min: bbox.y0(),
                    y_max: bbox.y1(),
                }),
            }
            assignments[idx] = columns.len() - 1;
        }

        log::debug!(
            "Page {}: {} blocks clustered into {} column(s)",
            page,
            blocks.len(),
            columns.len()
        );

        Self {
            columns,
            assignments,
        }
    }

    /// Column whose x-range contains the horizontal center of a box.
    pub fn column_for(&self, bbox: &BBox) -> Option<&Column> {
        self.columns.iter().find(|c| c.contains_center_of(bbox))
    }

    /// Input positions of the blocks owned by a column.
    pub fn members(&self, column_id: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == column_id)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Group the blocks of one page into vertical reading columns, left to right.
pub fn detect_columns(blocks: &[&ContentBlock], options: &ColumnOptions) -> Vec<Column> {
    ColumnLayout::detect(blocks, options).columns
}
