//! Writing asset reference tokens into block content.

use std::collections::BTreeMap;

use super::token::{is_valid_asset_id, token_for};
use super::validate::validate_markers;
use crate::error::Result;
use crate::model::{Asset, AssetLedger, BlockType, Document};

/// Place a run of tokens into block content according to the block kind.
fn insert_tokens(block_type: BlockType, content: &str, tokens: &str) -> String {
    match block_type {
        BlockType::Paragraph | BlockType::List | BlockType::Table | BlockType::Figure => {
            if content.is_empty() {
                tokens.to_string()
            } else {
                format!("{}\n{}", tokens, content)
            }
        }
        BlockType::Heading => {
            if content.is_empty() {
                tokens.to_string()
            } else {
                format!("{}\n{}", content, tokens)
            }
        }
        BlockType::Caption => {
            let text = content.trim_start();
            let indent = &content[..content.len() - text.len()];
            if text.is_empty() {
                format!("{}{}", indent, tokens)
            } else {
                format!("{}{} {}", indent, tokens, text)
            }
        }
    }
}

/// Return a copy of the document with a token for every anchored asset.
///
/// Tokens for one block are ordered top of page first. An asset whose token
/// is already present in its block is skipped, so running the injector on its
/// own output changes nothing. The result is validated; any broken reference
/// fails the whole document with every violation listed.
pub fn inject_markers(document: &Document, ledger: &AssetLedger) -> Result<Document> {
    let mut by_block: BTreeMap<&str, Vec<&Asset>> = BTreeMap::new();
    for asset in ledger.iter() {
        if let Some(block_id) = asset.anchor() {
            by_block.entry(block_id).or_default().push(asset);
        }
    }

    let mut output = document.clone();
    let mut inserted = 0usize;

    for block in output.blocks_mut() {
        let Some(assets) = by_block.get(block.id.as_str()) else {
            continue;
        };

        let mut ordered = assets.clone();
        ordered.sort_by(|a, b| {
            a.bbox
                .y0()
                .total_cmp(&b.bbox.y0())
                .then(a.bbox.x0().total_cmp(&b.bbox.x0()))
                .then(a.id.cmp(&b.id))
        });

        let pending: Vec<String> = ordered
            .iter()
            .filter(|a| is_valid_asset_id(&a.id))
            .map(|a| token_for(&a.id))
            .filter(|token| !block.content.contains(token.as_str()))
            .collect();
        if pending.is_empty() {
            continue;
        }

        inserted += pending.len();
        block.content = insert_tokens(block.block_type, &block.content, &pending.concat());
    }

    log::debug!("Injected {} marker(s)", inserted);

    if let Err(err) = validate_markers(&output, ledger) {
        log::warn!("{}", err);
        return Err(err.into());
    }
    Ok(output)
}
