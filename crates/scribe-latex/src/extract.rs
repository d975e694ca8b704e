//! Structural extraction
//!
//! Scans the direct children of the root for content the template places
//! itself: the abstract, acknowledgments, a teaser figure and a raw LaTeX
//! preamble. Extracted nodes are left out of the main content stream.

use std::collections::BTreeMap;
use std::fmt;

use scribe_ast::{Node, RefKind};

use crate::format::TexFormatter;
use crate::place::is_raw_tex;

/// Named blocks the template can place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockName {
    Abstract,
    Acknowledgments,
    Teaser,
    Preamble,
}

impl BlockName {
    /// Key used in render data and the vspace table
    pub fn as_str(self) -> &'static str {
        match self {
            BlockName::Abstract => "abstract",
            BlockName::Acknowledgments => "acknowledgments",
            BlockName::Teaser => "teaser",
            BlockName::Preamble => "preamble",
        }
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a top-level node
pub fn classify(node: &Node) -> Option<BlockName> {
    match node.name.as_str() {
        "abstract" => Some(BlockName::Abstract),
        "acknowledgments" => Some(BlockName::Acknowledgments),
        "figure" if node.has_class("teaser") => Some(BlockName::Teaser),
        "raw" if is_raw_tex(node) && node.has_class("preamble") => Some(BlockName::Preamble),
        _ => None,
    }
}

/// Whether a top-level node is taken out of the main content
pub fn is_extracted(node: &Node) -> bool {
    classify(node).is_some()
}

/// Extracted named blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks {
    blocks: BTreeMap<BlockName, String>,
}

impl Blocks {
    /// Content of a block
    pub fn get(&self, name: BlockName) -> Option<&str> {
        self.blocks.get(&name).map(|s| s.as_str())
    }

    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of distinct blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Remove a block, returning its content
    pub fn take(&mut self, name: BlockName) -> Option<String> {
        self.blocks.remove(&name)
    }

    fn append(&mut self, name: BlockName, content: String) {
        match self.blocks.get_mut(&name) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&content);
            }
            None => {
                self.blocks.insert(name, content);
            }
        }
    }
}

/// Extract named blocks from the root's direct children
pub fn extract_blocks(root: &Node, fmt: &TexFormatter<'_>) -> Blocks {
    let mut blocks = Blocks::default();
    for node in root.children() {
        let Some(name) = classify(node) else {
            continue;
        };
        let content = match name {
            BlockName::Preamble => node.value().unwrap_or_default().to_string(),
            _ => block_content(node, fmt),
        };
        tracing::debug!(block = %name, bytes = content.len(), "extracted block");
        blocks.append(name, content);
    }
    blocks
}

/// vspace command, trimmed inner fragment, then the node's figure label
fn block_content(node: &Node, fmt: &TexFormatter<'_>) -> String {
    let mut out = String::new();
    if let Some(vspace) = fmt.vspace(node) {
        out.push_str(vspace);
        out.push('\n');
    }
    out.push_str(fmt.fragment(node).trim());
    if let Some(label) = fmt.label(node, RefKind::Figure) {
        out.push('\n');
        out.push_str(&label);
    }
    out
}
