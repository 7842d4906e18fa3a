//! Integration tests for anchoring, marker injection and the pipeline builder.

use relayout::markers::{find_markers, strip_markers, token_for};
use relayout::{
    anchor_assets_to_blocks, detect_columns, inject_markers, AnchorOptions, Asset, AssetLedger,
    AssetType, BBox, BlockType, ColumnOptions, ContentBlock, Document, Error, JsonFormat,
    MarkerViolation, Relayout, Section,
};

fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BBox {
    BBox::new(x0, y0, x1, y1).unwrap()
}

fn block(id: &str, block_type: BlockType, b: BBox, page: u32, order: u32, content: &str) -> ContentBlock {
    ContentBlock::new(id, block_type, b, page, order, content)
}

/// Two-column page with a heading, two body paragraphs and a caption.
fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.add_section(
        Section::new(vec![
            block("h1", BlockType::Heading, bbox(50.0, 40.0, 550.0, 70.0), 1, 0, "Annual Report"),
            block("left", BlockType::Paragraph, bbox(50.0, 100.0, 280.0, 420.0), 1, 1, "Left body"),
            block("right", BlockType::Paragraph, bbox(320.0, 100.0, 550.0, 400.0), 1, 2, "Right body"),
            block("cap", BlockType::Caption, bbox(320.0, 620.0, 550.0, 640.0), 1, 3, "Figure 2. Sales"),
        ])
        .with_title("Overview"),
    );
    doc.add_section(Section::new(vec![block(
        "p2",
        BlockType::Paragraph,
        bbox(50.0, 100.0, 550.0, 300.0),
        2,
        0,
        "Second page",
    )]));
    doc
}

fn sample_ledger() -> AssetLedger {
    AssetLedger::from_assets(vec![
        Asset::new("chart", AssetType::Image, bbox(60.0, 200.0, 200.0, 300.0), 1),
        Asset::new("sales", AssetType::Vector, bbox(330.0, 450.0, 540.0, 600.0), 1),
        Asset::new("grid", AssetType::Table, bbox(60.0, 320.0, 500.0, 380.0), 2),
        Asset::new("lost", AssetType::Image, bbox(10.0, 10.0, 20.0, 20.0), 7),
    ])
}

#[test]
fn test_anchoring_leaves_inputs_untouched() {
    let doc = sample_document();
    let ledger = sample_ledger();
    let (doc_before, ledger_before) = (doc.clone(), ledger.clone());

    let (anchored, report) = anchor_assets_to_blocks(&ledger, &doc, &AnchorOptions::default());

    assert_eq!(doc, doc_before);
    assert_eq!(ledger, ledger_before);
    assert_ne!(anchored.ledger, ledger);
    assert_eq!(report.total_assets, 4);
}

#[test]
fn test_anchoring_rules() {
    let (anchored, report) = anchor_assets_to_blocks(&sample_ledger(), &sample_document(), &AnchorOptions::default());
    let anchor_of = |id: &str| anchored.ledger.get(id).and_then(|a| a.anchor().map(str::to_string));

    // Center inside the left paragraph.
    assert_eq!(anchor_of("chart").as_deref(), Some("left"));
    // Nearest block edge is the caption below it.
    assert_eq!(anchor_of("sales").as_deref(), Some("cap"));
    // Below the only block on page 2.
    assert_eq!(anchor_of("grid").as_deref(), Some("p2"));
    // Page 7 has no blocks.
    assert_eq!(anchor_of("lost"), None);

    assert_eq!(report.anchored_assets, 3);
    assert_eq!(report.unanchored_assets, vec!["lost".to_string()]);
    assert!((report.success_rate - 0.75).abs() < 1e-9);
    assert!(report.warnings.iter().any(|w| w.starts_with("lost")));
}

#[test]
fn test_anchoring_is_deterministic() {
    let doc = sample_document();
    let ledger = sample_ledger();
    let options = AnchorOptions::default();

    let first = anchor_assets_to_blocks(&ledger, &doc, &options);
    let second = anchor_assets_to_blocks(&ledger, &doc, &options);
    assert_eq!(first, second);
}

#[test]
fn test_far_asset_is_reported_not_dropped() {
    let mut doc = Document::new();
    doc.add_section(Section::new(vec![block(
        "top",
        BlockType::Paragraph,
        bbox(50.0, 50.0, 500.0, 100.0),
        1,
        0,
        "Top",
    )]));
    let ledger = AssetLedger::from_assets(vec![Asset::new(
        "footer-logo",
        AssetType::Image,
        bbox(60.0, 700.0, 120.0, 740.0),
        1,
    )
    .with_anchor("stale")]);

    let options = AnchorOptions::default().with_max_distance(100.0);
    let (anchored, report) = anchor_assets_to_blocks(&ledger, &doc, &options);

    let asset = anchored.ledger.get("footer-logo").unwrap();
    assert!(!asset.is_anchored());
    assert_eq!(anchored.ledger.len(), 1);
    assert_eq!(report.unanchored_assets, vec!["footer-logo".to_string()]);
}

#[test]
fn test_three_columns_left_to_right() {
    let xs = [10.0, 10.0, 200.0, 200.0, 400.0, 400.0];
    let blocks: Vec<ContentBlock> = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            block(
                &format!("b{}", i),
                BlockType::Paragraph,
                bbox(x, i as f64 * 50.0, x + 150.0, i as f64 * 50.0 + 40.0),
                1,
                i as u32,
                "",
            )
        })
        .collect();
    let refs: Vec<&ContentBlock> = blocks.iter().collect();

    let columns = detect_columns(&refs, &ColumnOptions::new().with_merge_gap(20.0));
    assert_eq!(columns.len(), 3);
    assert_eq!(
        columns.iter().map(|c| c.x_min).collect::<Vec<_>>(),
        vec![10.0, 200.0, 400.0]
    );
    assert_eq!(columns.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn test_process_injects_one_marker_per_asset() {
    let result = Relayout::new().process(&sample_document(), &sample_ledger()).unwrap();

    let left = result.document.get_block("left").unwrap();
    assert_eq!(left.content, "[[ASSET:chart]]\nLeft body");

    let cap = result.document.get_block("cap").unwrap();
    assert_eq!(cap.content, "[[ASSET:sales]] Figure 2. Sales");

    let all_markers: Vec<String> = result
        .document
        .blocks()
        .flat_map(|b| find_markers(&b.content))
        .map(|m| m.asset_id)
        .collect();
    assert_eq!(all_markers.len(), 3);
    assert!(!all_markers.contains(&"lost".to_string()));
}

#[test]
fn test_injection_idempotent_via_pipeline() {
    let relayout = Relayout::new();
    let first = relayout.process(&sample_document(), &sample_ledger()).unwrap();
    let second = inject_markers(&first.document, &first.ledger.ledger).unwrap();

    assert_eq!(first.document, second);
    for asset in first.ledger.ledger.iter().filter(|a| a.is_anchored()) {
        let token = token_for(&asset.id);
        let count = |doc: &Document| doc.blocks().map(|b| b.content.matches(token.as_str()).count()).sum::<usize>();
        assert_eq!(count(&first.document), 1);
        assert_eq!(count(&second), 1);
    }
}

#[test]
fn test_strip_markers_restores_content() {
    let result = Relayout::new().process(&sample_document(), &sample_ledger()).unwrap();
    let original = sample_document();

    for (annotated, source) in result.document.blocks().zip(original.blocks()) {
        assert_eq!(strip_markers(&annotated.content), source.content);
    }
}

#[test]
fn test_injection_error_lists_every_offender() {
    let mut doc = Document::new();
    doc.add_section(Section::new(vec![
        block("p", BlockType::Paragraph, bbox(0.0, 0.0, 100.0, 100.0), 1, 0, "Body"),
        block("q", BlockType::Paragraph, bbox(0.0, 200.0, 100.0, 300.0), 1, 1, "See [[ASSET:dup]]"),
    ]));
    let ledger = AssetLedger::from_assets(vec![
        Asset::new("ok", AssetType::Image, bbox(0.0, 0.0, 10.0, 10.0), 1).with_anchor("p"),
        Asset::new("ghost", AssetType::Image, bbox(0.0, 0.0, 10.0, 10.0), 1).with_anchor("missing-block"),
        Asset::new("dup", AssetType::Image, bbox(0.0, 20.0, 10.0, 30.0), 1).with_anchor("p"),
    ]);

    let err = inject_markers(&doc, &ledger).unwrap_err();
    let Error::MarkerInjection(err) = err else {
        panic!("expected a marker injection error");
    };

    assert_eq!(err.offending_asset_ids(), vec!["dup", "ghost"]);
    assert!(err.violations.contains(&MarkerViolation::Missing {
        asset_id: "ghost".to_string(),
        block_id: "missing-block".to_string(),
    }));
    assert!(err.violations.contains(&MarkerViolation::Duplicated {
        asset_id: "dup".to_string(),
        count: 2,
    }));
    assert!(err.to_string().contains("violation(s)"));
}

#[test]
fn test_process_batch_keeps_order() {
    let mut other = Document::new();
    other.add_section(Section::new(vec![block(
        "only",
        BlockType::Paragraph,
        bbox(0.0, 0.0, 100.0, 100.0),
        1,
        0,
        "Only",
    )]));
    let jobs = vec![
        (sample_document(), sample_ledger()),
        (other, AssetLedger::new()),
    ];

    let parallel = Relayout::new().process_batch(&jobs);
    let sequential = Relayout::new().sequential().process_batch(&jobs);

    assert_eq!(parallel.len(), 2);
    let parallel: Vec<_> = parallel.into_iter().map(Result::unwrap).collect();
    let sequential: Vec<_> = sequential.into_iter().map(Result::unwrap).collect();
    assert_eq!(parallel, sequential);
    assert_eq!(parallel[1].report.total_assets, 0);
    assert!(parallel[1].document.get_block("only").is_some());
}

#[test]
fn test_result_json() {
    let result = Relayout::new().process(&sample_document(), &sample_ledger()).unwrap();
    let json = result.to_json(JsonFormat::Compact).unwrap();

    assert!(json.contains("\"unanchored_assets\":[\"lost\"]"));
    assert!(json.contains("[[ASSET:chart]]"));
}

#[test]
fn test_document_deserialization_rejects_bad_bbox() {
    let json = r#"{"sections":[{"blocks":[{"id":"b","type":"paragraph","bbox":[10,0,5,10],"page":1,"reading_order":0,"content":""}]}]}"#;
    let parsed: Result<Document, _> = serde_json::from_str(json);
    assert!(parsed.is_err());

    let json = r#"{"sections":[{"blocks":[{"id":"b","type":"paragraph","bbox":[0,0,5,10],"page":1,"reading_order":0,"content":"x"}]}]}"#;
    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.block_count(), 1);
}
