//! Conversion between absolute and column-relative bounding boxes.

use crate::error::{Error, Result};
use crate::model::{Asset, BBox, NormalizedBBox};

use super::Column;

fn check_frame(column: &Column) -> Result<()> {
    let (width, height) = (column.width(), column.height());
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(Error::DegenerateColumn {
            id: column.id,
            page: column.page,
            width,
            height,
        });
    }
    Ok(())
}

/// Express a box as fractions of a column's width and height.
///
/// Fails on zero-size columns and on boxes that stick out of the column.
pub fn compute_normalized_bbox(bbox: &BBox, column: &Column) -> Result<NormalizedBBox> {
    check_frame(column)?;
    let (width, height) = (column.width(), column.height());

    let nx = (bbox.x0() - column.x_min) / width;
    let ny = (bbox.y0() - column.y_min) / height;
    let nw = bbox.width() / width;
    let nh = bbox.height() / height;

    NormalizedBBox::new(nx, ny, nw, nh).map_err(|_| Error::OutsideColumn {
        bbox: bbox.to_string(),
        column: column.id,
        page: column.page,
    })
}

/// Normalize an asset's box against a column.
pub fn normalize_asset(asset: &Asset, column: &Column) -> Result<NormalizedBBox> {
    compute_normalized_bbox(&asset.bbox, column)
}

/// Map a normalized box back into absolute coordinates of a column.
///
/// Exact inverse of [`compute_normalized_bbox`] for the same column; with a
/// different column it rescales the box into the new frame.
pub fn denormalize(normalized: &NormalizedBBox, column: &Column) -> Result<BBox> {
    check_frame(column)?;
    let (width, height) = (column.width(), column.height());

    let x0 = column.x_min + normalized.x() * width;
    let y0 = column.y_min + normalized.y() * height;
    BBox::new(
        x0,
        y0,
        x0 + normalized.w() * width,
        y0 + normalized.h() * height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Column {
        Column {
            id: 0,
            page: 1,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    #[test]
    fn test_normalize_values() {
        let col = column(100.0, 300.0, 50.0, 450.0);
        let bbox = BBox::new(150.0, 150.0, 250.0, 250.0).unwrap();

        let n = compute_normalized_bbox(&bbox, &col).unwrap();
        assert!((n.x() - 0.25).abs() < 1e-12);
        assert!((n.y() - 0.25).abs() < 1e-12);
        assert!((n.w() - 0.5).abs() < 1e-12);
        assert!((n.h() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_asset() {
        use crate::model::AssetType;

        let col = column(0.0, 200.0, 0.0, 100.0);
        let asset = Asset::new("img", AssetType::Image, BBox::new(50.0, 25.0, 150.0, 75.0).unwrap(), 1);
        let n = normalize_asset(&asset, &col).unwrap();
        assert_eq!(n, NormalizedBBox::new(0.25, 0.25, 0.5, 0.5).unwrap());
    }

    #[test]
    fn test_round_trip() {
        let col = column(72.3, 297.7, 61.1, 780.9);
        let bbox = BBox::new(80.123, 100.456, 290.789, 333.333).unwrap();

        let back = denormalize(&compute_normalized_bbox(&bbox, &col).unwrap(), &col).unwrap();
        for (a, b) in bbox.to_array().iter().zip(back.to_array().iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rescale_into_wider_column() {
        let source = column(0.0, 100.0, 0.0, 100.0);
        let target = column(0.0, 200.0, 0.0, 100.0);
        let bbox = BBox::new(10.0, 10.0, 60.0, 20.0).unwrap();

        let normalized = compute_normalized_bbox(&bbox, &source).unwrap();
        let moved = denormalize(&normalized, &target).unwrap();
        for (a, b) in moved.to_array().iter().zip([20.0, 10.0, 120.0, 20.0].iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_column() {
        let col = column(100.0, 100.0, 0.0, 50.0);
        let bbox = BBox::new(100.0, 0.0, 100.0, 10.0).unwrap();
        assert!(matches!(
            compute_normalized_bbox(&bbox, &col),
            Err(Error::DegenerateColumn { .. })
        ));

        let n = NormalizedBBox::new(0.0, 0.0, 0.5, 0.5).unwrap();
        assert!(denormalize(&n, &col).is_err());
    }

    #[test]
    fn test_outside_column() {
        let col = column(0.0, 100.0, 0.0, 100.0);
        let bbox = BBox::new(50.0, 50.0, 150.0, 80.0).unwrap();
        assert!(matches!(
            compute_normalized_bbox(&bbox, &col),
            Err(Error::OutsideColumn { .. })
        ));
    }
}
