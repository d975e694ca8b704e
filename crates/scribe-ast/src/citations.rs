//! Citation bundle
//!
//! The reference list tells the formatter which category a cross-reference
//! target belongs to; the bibliography entries are raw BibTeX records that
//! end up in `<name>.bib`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a cross-referenceable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Figure,
    Table,
    Equation,
    Section,
}

impl RefKind {
    /// All categories
    pub fn all() -> &'static [RefKind] {
        &[
            RefKind::Figure,
            RefKind::Table,
            RefKind::Equation,
            RefKind::Section,
        ]
    }

    /// Parse a category name as used in node properties
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "figure" | "fig" => Some(RefKind::Figure),
            "table" | "tab" => Some(RefKind::Table),
            "equation" | "eq" => Some(RefKind::Equation),
            "section" | "sec" => Some(RefKind::Section),
            _ => None,
        }
    }

    /// Category implied by a node name, if any
    pub fn of_node(name: &str) -> Option<Self> {
        match name {
            "figure" => Some(RefKind::Figure),
            "table" => Some(RefKind::Table),
            "equation" => Some(RefKind::Equation),
            "section" | "heading" => Some(RefKind::Section),
            _ => None,
        }
    }

    /// Short label namespace (`fig`, `tab`, `eq`, `sec`)
    pub fn label_prefix(self) -> &'static str {
        match self {
            RefKind::Figure => "fig",
            RefKind::Table => "tab",
            RefKind::Equation => "eq",
            RefKind::Section => "sec",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefKind::Figure => "figure",
            RefKind::Table => "table",
            RefKind::Equation => "equation",
            RefKind::Section => "section",
        };
        f.write_str(name)
    }
}

/// A referenceable entity known to the citation processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Target identifier
    pub id: String,
    /// Category of the target
    pub kind: RefKind,
}

/// Citation data attached to a document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Citations {
    /// Cross-reference targets
    pub references: Vec<Reference>,
    /// Raw BibTeX entries
    pub bibliography: Vec<String>,
}

impl Citations {
    /// Whether a bibliography file should be written
    pub fn has_bibliography(&self) -> bool {
        self.bibliography.iter().any(|entry| !entry.trim().is_empty())
    }

    /// Category of a reference target
    pub fn kind_of(&self, id: &str) -> Option<RefKind> {
        self.references
            .iter()
            .find(|reference| reference.id == id)
            .map(|reference| reference.kind)
    }
}
