//! Document-level types: sections of positioned content blocks.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A document handed over by the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Sections in reading order
    pub sections: Vec<Section>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section to the document.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Iterate over every block in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// Iterate mutably over every block in document order.
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut ContentBlock> {
        self.sections.iter_mut().flat_map(|s| s.blocks.iter_mut())
    }

    /// Blocks on a page, in document order.
    pub fn blocks_on_page(&self, page: u32) -> Vec<&ContentBlock> {
        self.blocks().filter(|b| b.page == page).collect()
    }

    /// Get a block by ID.
    pub fn get_block(&self, id: &str) -> Option<&ContentBlock> {
        self.blocks().find(|b| b.id == id)
    }

    /// Sorted, deduplicated page numbers that carry at least one block.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.blocks().map(|b| b.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }

    /// Check if the document has any blocks.
    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }
}

/// An ordered group of blocks (chapter, article, page range).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section title, if the extractor found one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Blocks in reading order
    pub blocks: Vec<ContentBlock>,
}

impl Section {
    /// Create an untitled section.
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self {
            title: None,
            blocks,
        }
    }

    /// Set the section title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Body text
    Paragraph,
    /// Section heading
    Heading,
    /// List item or list
    List,
    /// Table
    Table,
    /// Figure container
    Figure,
    /// Caption under or above a figure/table
    Caption,
}

/// A positioned run of content on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Unique block ID within the document
    pub id: String,

    /// Block kind
    #[serde(rename = "type")]
    pub block_type: BlockType,

    /// Position on the page
    pub bbox: BBox,

    /// Page number (1-indexed)
    pub page: u32,

    /// Position in reading order (lower reads first)
    pub reading_order: u32,

    /// Text content
    #[serde(default)]
    pub content: String,
}

impl ContentBlock {
    /// Create a new content block.
    pub fn new(
        id: impl Into<String>,
        block_type: BlockType,
        bbox: BBox,
        page: u32,
        reading_order: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            block_type,
            bbox,
            page,
            reading_order,
            content: content.into(),
        }
    }
}
