//! scribe-ast - Document tree definitions
//!
//! This crate provides the format-agnostic types scribe compiles from:
//! a generic node tree, the document metadata record and the optional
//! citation bundle. The parser that produces them lives elsewhere; the
//! types are serde-serialisable so a parsed document can be handed over
//! as JSON.

pub mod citations;
pub mod document;
pub mod metadata;
pub mod node;

pub use citations::{Citations, RefKind, Reference};
pub use document::Document;
pub use metadata::{Author, Metadata};
pub use node::{Content, Node, NodePath};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
