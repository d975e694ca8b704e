//! Document root
//!
//! Bundles the tree with the records that travel alongside it.

use serde::{Deserialize, Serialize};

use crate::citations::Citations;
use crate::metadata::Metadata;
use crate::node::Node;

/// A parsed document ready for compilation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Root of the tree
    pub root: Node,
    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Optional citation bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Citations>,
}

impl Document {
    /// Create a document from a root node
    pub fn new(root: Node) -> Self {
        Self {
            root,
            metadata: Metadata::default(),
            citations: None,
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach a citation bundle
    pub fn with_citations(mut self, citations: Citations) -> Self {
        self.citations = Some(citations);
        self
    }
}
