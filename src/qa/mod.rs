//! Post-placement geometry checks.
//!
//! Compares where assets ended up on the rendered pages with where they were
//! expected, and tells a page-wide transform error apart from independent
//! placement noise.

mod report;

pub use report::{AssetDeviation, GeometryReport, PageWarning, PlacedBox};

use std::collections::BTreeMap;

use crate::error::Result;
use crate::layout::{denormalize, Column};
use crate::model::{AnchoredLedger, BBox};
use crate::options::QaOptions;

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

fn compare(expected: &PlacedBox, actual: &PlacedBox, options: &QaOptions) -> AssetDeviation {
    let (e, a) = (&expected.bbox, &actual.bbox);
    let absolute = distance(e.x0(), e.y0(), a.x0(), a.y0()).max(distance(e.x1(), e.y1(), a.x1(), a.y1()));
    let size = e.width().max(e.height());
    let relative = if size > 0.0 { absolute / size } else { 0.0 };
    let threshold = options.tolerance_pt.max(options.tolerance_pct * size);

    let (ecx, ecy) = e.center();
    let (acx, acy) = a.center();

    AssetDeviation {
        asset_id: expected.asset_id.clone(),
        page: expected.page,
        actual_page: actual.page,
        absolute,
        relative,
        threshold,
        dx: acx - ecx,
        dy: acy - ecy,
        passed: expected.page == actual.page && absolute <= threshold,
        systematic: false,
    }
}

/// Smallest angle between two directions, in degrees.
fn angle_between(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Largest set of deviations that point the same way by a similar amount.
///
/// Every vector is tried as the seed; the first largest group wins.
fn largest_agreeing_group(deviations: &[&AssetDeviation], options: &QaOptions) -> Vec<usize> {
    let vectors: Vec<(f64, f64)> = deviations
        .iter()
        .map(|d| (d.dx.hypot(d.dy), d.dy.atan2(d.dx).to_degrees()))
        .collect();

    let mut best: Vec<usize> = Vec::new();
    for &(seed_mag, seed_angle) in &vectors {
        let band = options.magnitude_band_pt.max(options.magnitude_band_pct * seed_mag);
        let group: Vec<usize> = vectors
            .iter()
            .enumerate()
            .filter(|(_, (mag, angle))| {
                (*mag - seed_mag).abs() <= band && angle_between(*angle, seed_angle) <= options.angle_band_deg
            })
            .map(|(i, _)| i)
            .collect();
        if group.len() > best.len() {
            best = group;
        }
    }
    best
}

/// Compare placed boxes against expected boxes.
///
/// Assets are matched by id; an expected asset with no placed counterpart is
/// skipped. An asset fails when its largest corner displacement exceeds
/// `max(tolerance_pt, tolerance_pct × max(width, height))` of the expected
/// box, or when it was placed on another page.
pub fn validate_geometry(expected: &[PlacedBox], actual: &[PlacedBox], options: &QaOptions) -> GeometryReport {
    let mut placed: BTreeMap<&str, &PlacedBox> = BTreeMap::new();
    for placed_box in actual {
        placed.entry(placed_box.asset_id.as_str()).or_insert(placed_box);
    }

    let mut report = GeometryReport::default();
    for wanted in expected {
        let Some(found) = placed.get(wanted.asset_id.as_str()) else {
            log::debug!("Asset {} was not placed, skipping", wanted.asset_id);
            continue;
        };
        let deviation = compare(wanted, found, options);
        if deviation.passed {
            report.passed += 1;
        } else {
            report.failed += 1;
        }
        report.deviations.push(deviation);
    }
    report.total = report.deviations.len();
    report.pass_rate = if report.total == 0 {
        1.0
    } else {
        report.passed as f64 / report.total as f64
    };

    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, deviation) in report.deviations.iter().enumerate() {
        by_page.entry(deviation.page).or_default().push(i);
    }

    for (page, indices) in by_page {
        let failures = indices.iter().filter(|&&i| !report.deviations[i].passed).count();

        if indices.len() >= options.systematic_min_assets {
            // Vectors between different pages say nothing about this page's transform.
            let comparable: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| report.deviations[i].actual_page == page)
                .collect();
            let on_page: Vec<&AssetDeviation> = comparable.iter().map(|&i| &report.deviations[i]).collect();
            let group = largest_agreeing_group(&on_page, options);
            let share = group.len() as f64 / indices.len() as f64;

            let count = group.len().max(1) as f64;
            let dx = group.iter().map(|&g| on_page[g].dx).sum::<f64>() / count;
            let dy = group.iter().map(|&g| on_page[g].dy).sum::<f64>() / count;
            let magnitude = group.iter().map(|&g| on_page[g].dx.hypot(on_page[g].dy)).sum::<f64>() / count;

            if share >= options.systematic_share && magnitude > options.tolerance_pt {
                let warning = PageWarning::SystematicOffset {
                    page,
                    dx,
                    dy,
                    affected: group.len(),
                    total: indices.len(),
                    share,
                };
                log::warn!("{}", warning);
                report.recommendations.push(format!(
                    "{}; check the page offset/rotation transform",
                    warning
                ));
                report.page_warnings.push(warning);
                for g in group {
                    report.deviations[comparable[g]].systematic = true;
                }
                continue;
            }
        }

        if failures > 0 {
            report.recommendations.push(format!(
                "Page {}: {} asset(s) out of tolerance with no common shift; review their placements individually",
                page, failures
            ));
        }
    }

    report
}

/// Expected boxes for every stored placement, mapped into the given columns.
///
/// Each placement is denormalized into the column with the same page and id.
/// Placements whose column is missing are skipped with a warning.
pub fn expected_from_placements(anchored: &AnchoredLedger, columns: &[Column]) -> Result<Vec<PlacedBox>> {
    let mut expected = Vec::with_capacity(anchored.placements.len());
    for placement in &anchored.placements {
        let Some(column) = columns
            .iter()
            .find(|c| c.page == placement.page && c.id == placement.column_id)
        else {
            log::warn!(
                "No column {} on page {} for asset {}",
                placement.column_id,
                placement.page,
                placement.asset_id
            );
            continue;
        };
        let bbox: BBox = denormalize(&placement.normalized, column)?;
        expected.push(PlacedBox::new(placement.asset_id.clone(), placement.page, bbox));
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetLedger, AssetPlacement, NormalizedBBox};

    fn placed(id: &str, page: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> PlacedBox {
        PlacedBox::new(id, page, BBox::new(x0, y0, x1, y1).unwrap())
    }

    fn shifted(b: &PlacedBox, dx: f64, dy: f64) -> PlacedBox {
        PlacedBox::new(b.asset_id.clone(), b.page, b.bbox.translate(dx, dy))
    }

    #[test]
    fn test_tolerance_threshold() {
        // 100pt wide: tolerance is max(2, 0.02 * 100) = 2pt.
        let expected = vec![
            placed("a", 1, 0.0, 0.0, 100.0, 50.0),
            placed("b", 1, 0.0, 100.0, 100.0, 150.0),
        ];
        let actual = vec![shifted(&expected[0], 1.5, 0.0), shifted(&expected[1], 2.5, 0.0)];

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pass_rate, 0.5);
        assert!(report.deviation("a").unwrap().passed);
        assert!(!report.deviation("b").unwrap().passed);
        assert!((report.deviation("b").unwrap().relative - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_tolerance_for_large_boxes() {
        // 400pt tall: tolerance is 0.02 * 400 = 8pt.
        let expected = vec![placed("big", 1, 0.0, 0.0, 200.0, 400.0)];
        let actual = vec![shifted(&expected[0], 0.0, 6.0)];

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert!(report.is_pass());
    }

    #[test]
    fn test_missing_placements_ignored() {
        let expected = vec![placed("a", 1, 0.0, 0.0, 10.0, 10.0), placed("gone", 1, 0.0, 0.0, 10.0, 10.0)];
        let actual = vec![expected[0].clone()];

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.total, 1);
        assert_eq!(report.pass_rate, 1.0);
    }

    #[test]
    fn test_empty_input_passes() {
        let report = validate_geometry(&[], &[], &QaOptions::default());
        assert_eq!(report.total, 0);
        assert_eq!(report.pass_rate, 1.0);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_wrong_page_fails() {
        let expected = vec![placed("a", 1, 0.0, 0.0, 10.0, 10.0)];
        let actual = vec![placed("a", 2, 0.0, 0.0, 10.0, 10.0)];

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_systematic_offset_detected() {
        let expected: Vec<PlacedBox> = (0..5)
            .map(|i| placed(&format!("img{}", i), 1, 0.0, i as f64 * 100.0, 50.0, i as f64 * 100.0 + 50.0))
            .collect();
        let actual: Vec<PlacedBox> = expected.iter().map(|b| shifted(b, 10.0, 5.0)).collect();

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.failed, 5);
        assert_eq!(report.page_warnings.len(), 1);
        match &report.page_warnings[0] {
            PageWarning::SystematicOffset {
                page,
                dx,
                dy,
                affected,
                share,
                ..
            } => {
                assert_eq!(*page, 1);
                assert!((dx - 10.0).abs() < 1e-9);
                assert!((dy - 5.0).abs() < 1e-9);
                assert_eq!(*affected, 5);
                assert_eq!(*share, 1.0);
            }
        }
        assert!(report.deviations.iter().all(|d| d.systematic));
        assert!(report.recommendations[0].contains("offset/rotation"));
    }

    fn five_on_page() -> Vec<PlacedBox> {
        (0..5)
            .map(|i| placed(&format!("img{}", i), 1, 0.0, i as f64 * 100.0, 50.0, i as f64 * 100.0 + 50.0))
            .collect()
    }

    #[test]
    fn test_systematic_share_boundary_inclusive() {
        // Four of five agree: share is exactly 0.8.
        let expected = five_on_page();
        let mut actual: Vec<PlacedBox> = expected.iter().map(|b| shifted(b, 10.0, 5.0)).collect();
        actual[4] = shifted(&expected[4], -20.0, 0.0);

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        match report.page_warnings.as_slice() {
            [PageWarning::SystematicOffset { affected, total, share, .. }] => {
                assert_eq!(*affected, 4);
                assert_eq!(*total, 5);
                assert!((share - 0.8).abs() < 1e-12);
            }
            other => panic!("expected one systematic warning, got {:?}", other),
        }
        assert!(!report.deviation("img4").unwrap().systematic);
        assert!(report.deviation("img0").unwrap().systematic);
    }

    #[test]
    fn test_systematic_share_below_threshold() {
        // Three of five agree: share 0.6.
        let expected = five_on_page();
        let mut actual: Vec<PlacedBox> = expected.iter().map(|b| shifted(b, 10.0, 5.0)).collect();
        actual[3] = shifted(&expected[3], -20.0, 0.0);
        actual[4] = shifted(&expected[4], 0.0, -20.0);

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.failed, 5);
        assert!(report.page_warnings.is_empty());
        assert!(report.deviations.iter().all(|d| !d.systematic));
    }

    #[test]
    fn test_cross_page_placement_not_grouped() {
        // Two shifted assets plus two that landed on another page with the
        // same box; only the two same-page vectors are comparable.
        let expected: Vec<PlacedBox> = five_on_page().into_iter().take(4).collect();
        let actual = vec![
            shifted(&expected[0], 10.0, 0.0),
            shifted(&expected[1], 10.0, 0.0),
            PlacedBox::new("img2", 2, expected[2].bbox.translate(10.0, 0.0)),
            PlacedBox::new("img3", 2, expected[3].bbox.translate(10.0, 0.0)),
        ];

        let report = validate_geometry(&expected, &actual, &QaOptions::default().with_systematic_share(0.75));
        assert_eq!(report.failed, 4);
        assert!(report.page_warnings.is_empty());
        assert_eq!(report.deviation("img2").unwrap().actual_page, 2);
        assert!(report.deviations.iter().all(|d| !d.systematic));
    }

    #[test]
    fn test_scattered_failures_are_noise() {
        let expected: Vec<PlacedBox> = (0..4)
            .map(|i| placed(&format!("img{}", i), 1, 0.0, i as f64 * 100.0, 50.0, i as f64 * 100.0 + 50.0))
            .collect();
        let actual = vec![
            shifted(&expected[0], 10.0, 0.0),
            shifted(&expected[1], -10.0, 0.0),
            shifted(&expected[2], 0.0, 10.0),
            shifted(&expected[3], 0.0, -10.0),
        ];

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert_eq!(report.failed, 4);
        assert!(report.page_warnings.is_empty());
        assert!(report.deviations.iter().all(|d| !d.systematic));
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].contains("no common shift"));
    }

    #[test]
    fn test_systematic_needs_enough_assets() {
        let expected = vec![placed("a", 1, 0.0, 0.0, 50.0, 50.0), placed("b", 1, 0.0, 100.0, 50.0, 150.0)];
        let actual: Vec<PlacedBox> = expected.iter().map(|b| shifted(b, 10.0, 0.0)).collect();

        let report = validate_geometry(&expected, &actual, &QaOptions::default());
        assert!(report.page_warnings.is_empty());
    }

    #[test]
    fn test_expected_from_placements() {
        let column = Column {
            id: 0,
            page: 1,
            x_min: 100.0,
            x_max: 300.0,
            y_min: 0.0,
            y_max: 400.0,
        };
        let anchored = AnchoredLedger {
            ledger: AssetLedger::new(),
            placements: vec![
                AssetPlacement {
                    asset_id: "img".to_string(),
                    page: 1,
                    column_id: 0,
                    normalized: NormalizedBBox::new(0.25, 0.5, 0.5, 0.25).unwrap(),
                },
                AssetPlacement {
                    asset_id: "orphan".to_string(),
                    page: 2,
                    column_id: 0,
                    normalized: NormalizedBBox::new(0.0, 0.0, 1.0, 1.0).unwrap(),
                },
            ],
        };

        let expected = expected_from_placements(&anchored, &[column]).unwrap();
        assert_eq!(expected.len(), 1);
        assert_eq!(expected[0].bbox, BBox::new(150.0, 200.0, 250.0, 300.0).unwrap());
    }
}
