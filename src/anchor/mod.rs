//! Asset anchoring.
//!
//! Attaches every asset to the text block that owns it on the page, and
//! records the asset's position relative to its column so it can be placed
//! again after translation reshapes the page.

mod report;

pub use report::{AnchorDecision, AnchorRule, AnchoringReport};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::layout::{compute_normalized_bbox, denormalize, Column, ColumnLayout};
use crate::model::{AnchoredLedger, Asset, AssetLedger, AssetPlacement, ContentBlock, Document};
use crate::options::{AnchorOptions, ColumnOptions};

/// Blocks of one page with their column layout.
struct PageFrame<'a> {
    /// (document position, block), in document order
    blocks: Vec<(usize, &'a ContentBlock)>,
    layout: ColumnLayout,
}

impl<'a> PageFrame<'a> {
    fn build(blocks: Vec<(usize, &'a ContentBlock)>, options: &ColumnOptions) -> Self {
        let refs: Vec<&ContentBlock> = blocks.iter().map(|(_, b)| *b).collect();
        let layout = ColumnLayout::detect(&refs, options);
        Self { blocks, layout }
    }
}

fn build_frames<'a>(document: &'a Document, options: &ColumnOptions) -> BTreeMap<u32, PageFrame<'a>> {
    let mut by_page: BTreeMap<u32, Vec<(usize, &ContentBlock)>> = BTreeMap::new();
    for (order, block) in document.blocks().enumerate() {
        by_page.entry(block.page).or_default().push((order, block));
    }
    by_page
        .into_iter()
        .map(|(page, blocks)| (page, PageFrame::build(blocks, options)))
        .collect()
}

/// Why an asset could not be anchored.
#[derive(Debug, Clone, PartialEq)]
enum Unanchored {
    NoBlocksOnPage(u32),
    TooFar { distance: f64, max: f64 },
}

impl fmt::Display for Unanchored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unanchored::NoBlocksOnPage(page) => write!(f, "no blocks on page {}", page),
            Unanchored::TooFar { distance, max } => write!(
                f,
                "nearest block is {:.1}pt away (maximum {:.1}pt)",
                distance, max
            ),
        }
    }
}

struct Selection<'a> {
    block: &'a ContentBlock,
    rule: AnchorRule,
    distance: f64,
    same_column: bool,
}

/// Containment first, then the nearest block within `max_distance`.
fn select_among<'a>(
    asset: &Asset,
    candidates: &[(usize, &'a ContentBlock)],
    same_column: bool,
    options: &AnchorOptions,
) -> std::result::Result<Selection<'a>, Unanchored> {
    let (cx, cy) = asset.bbox.center();
    let containing = candidates
        .iter()
        .filter(|(_, b)| b.bbox.contains_point(cx, cy))
        .min_by(|(oa, a), (ob, b)| {
            a.bbox
                .area()
                .total_cmp(&b.bbox.area())
                .then(a.reading_order.cmp(&b.reading_order))
                .then(oa.cmp(ob))
        });
    if let Some((_, block)) = containing {
        return Ok(Selection {
            block: *block,
            rule: AnchorRule::Containment,
            distance: 0.0,
            same_column,
        });
    }

    let nearest = candidates.iter().min_by(|(oa, a), (ob, b)| {
        proximity_key(asset, a)
            .cmp_total(&proximity_key(asset, b))
            .then(a.reading_order.cmp(&b.reading_order))
            .then(oa.cmp(ob))
    });
    let (_, block) = match nearest {
        Some(found) => *found,
        None => return Err(Unanchored::NoBlocksOnPage(asset.page)),
    };

    let distance = asset.bbox.vertical_gap(&block.bbox);
    if distance > options.max_distance {
        return Err(Unanchored::TooFar {
            distance,
            max: options.max_distance,
        });
    }

    Ok(Selection {
        block,
        rule: AnchorRule::Proximity,
        distance,
        same_column,
    })
}

/// Pick the owning block, trying the asset's own column before the whole page.
fn select_anchor<'a>(
    asset: &Asset,
    frame: Option<&PageFrame<'a>>,
    options: &AnchorOptions,
) -> std::result::Result<Selection<'a>, Unanchored> {
    let frame = match frame {
        Some(frame) if !frame.blocks.is_empty() => frame,
        _ => return Err(Unanchored::NoBlocksOnPage(asset.page)),
    };

    if options.prefer_same_column {
        if let Some(column) = frame.layout.column_for(&asset.bbox) {
            let members: Vec<(usize, &ContentBlock)> = frame
                .layout
                .members(column.id)
                .into_iter()
                .map(|i| frame.blocks[i])
                .collect();
            if !members.is_empty() {
                match select_among(asset, &members, true, options) {
                    Ok(selection) => return Ok(selection),
                    Err(reason) => log::debug!(
                        "Asset {}: {} in its column, trying the whole page",
                        asset.id,
                        reason
                    ),
                }
            }
        }
    }

    select_among(asset, &frame.blocks, false, options)
}

/// (vertical gap, horizontal center offset) between an asset and a block.
struct ProximityKey(f64, f64);

impl ProximityKey {
    fn cmp_total(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.total_cmp(&other.1))
    }
}

fn proximity_key(asset: &Asset, block: &ContentBlock) -> ProximityKey {
    ProximityKey(
        asset.bbox.vertical_gap(&block.bbox),
        asset.bbox.horizontal_center_offset(&block.bbox),
    )
}

/// Normalize an asset into its column and verify the placement maps back.
fn place(asset: &Asset, column: &Column, tolerance: f64) -> Result<Option<AssetPlacement>> {
    let normalized = compute_normalized_bbox(&asset.bbox, column)?;
    let back = denormalize(&normalized, column)?;
    let drift = asset
        .bbox
        .to_array()
        .iter()
        .zip(back.to_array().iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    if drift > tolerance {
        return Ok(None);
    }
    Ok(Some(AssetPlacement {
        asset_id: asset.id.clone(),
        page: asset.page,
        column_id: column.id,
        normalized,
    }))
}

/// Attach every asset in the ledger to its owning block.
///
/// Inputs are left untouched; the returned ledger is a copy with `anchor_to`
/// filled in (or cleared for assets that could not be anchored) and the
/// column-relative placement of each anchored asset.
pub fn anchor_assets_to_blocks(
    ledger: &AssetLedger,
    document: &Document,
    options: &AnchorOptions,
) -> (AnchoredLedger, AnchoringReport) {
    let frames = build_frames(document, &options.columns);
    let mut report = AnchoringReport::new(ledger.len());
    let mut assets = Vec::with_capacity(ledger.len());
    let mut placements = Vec::new();
    let mut geometry_passed = 0;

    for asset in ledger.iter() {
        let mut anchored = asset.clone();
        anchored.anchor_to = None;
        let frame = frames.get(&asset.page);

        match select_anchor(asset, frame, options) {
            Ok(selection) => {
                log::debug!(
                    "Asset {} -> block {} ({:?}, gap {:.1}pt)",
                    asset.id,
                    selection.block.id,
                    selection.rule,
                    selection.distance
                );
                anchored.anchor_to = Some(selection.block.id.clone());
                report.add_anchored(AnchorDecision {
                    asset_id: asset.id.clone(),
                    block_id: selection.block.id.clone(),
                    rule: selection.rule,
                    distance: selection.distance,
                    same_column: selection.same_column,
                });

                let column = frame.and_then(|f| f.layout.column_for(&asset.bbox));
                match column.map(|c| place(asset, c, options.roundtrip_tolerance)) {
                    Some(Ok(Some(placement))) => {
                        geometry_passed += 1;
                        placements.push(placement);
                    }
                    Some(Ok(None)) => report.add_warning(format!(
                        "{}: column-relative placement does not round-trip",
                        asset.id
                    )),
                    Some(Err(err)) => report.add_warning(format!("{}: {}", asset.id, err)),
                    None => report.add_warning(format!(
                        "{}: center lies outside every column on page {}",
                        asset.id, asset.page
                    )),
                }
            }
            Err(reason) => report.add_unanchored(&asset.id, reason.to_string()),
        }

        assets.push(anchored);
    }

    report.finish(geometry_passed);
    log::debug!(
        "Anchored {}/{} assets, geometry pass rate {:.2}",
        report.anchored_assets,
        report.total_assets,
        report.geometry_pass_rate
    );

    (
        AnchoredLedger {
            ledger: AssetLedger::from_assets(assets),
            placements,
        },
        report,
    )
}
