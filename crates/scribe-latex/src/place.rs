//! Place resolution
//!
//! A raw LaTeX node whose text starts with `\place{<id>}` claims the figure
//! with that id, so the figure is typeset at the directive instead of at its
//! natural position in the tree.
//!
//! Resolution is two full-tree passes: the first collects directive ids,
//! the second (skipped when there are none) binds figures to them. The tree
//! is never modified; which node carried which directive is recorded in a
//! side table keyed by node path.

use std::collections::BTreeMap;

use scribe_ast::{Node, NodePath};

/// `format` property value identifying raw LaTeX
pub const TEX_FORMAT: &str = "tex";

const PLACE_COMMAND: &str = r"\place{";

/// A place directive found in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDirective {
    /// Path of the raw node carrying the directive
    pub path: NodePath,
    /// Claimed figure id
    pub id: String,
}

/// Place id → claimed figure (`None` until a matching figure is found)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceMap<'a> {
    entries: BTreeMap<String, Option<&'a Node>>,
    directives: Vec<PlaceDirective>,
}

impl<'a> PlaceMap<'a> {
    /// An empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no directive was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct place ids
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether a directive references this id
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Figure bound to a place id
    pub fn get(&self, id: &str) -> Option<&'a Node> {
        self.entries.get(id).copied().flatten()
    }

    /// All place ids, sorted
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|id| id.as_str())
    }

    /// Directives in document order
    pub fn directives(&self) -> &[PlaceDirective] {
        &self.directives
    }

    /// Place id recorded for the raw node at `path`
    pub fn directive_at(&self, path: &[usize]) -> Option<&str> {
        self.directives
            .iter()
            .find(|directive| directive.path == path)
            .map(|directive| directive.id.as_str())
    }

    /// Whether this exact figure node has been claimed by a directive
    pub fn is_claimed(&self, figure: &Node) -> bool {
        figure
            .id()
            .and_then(|id| self.get(id))
            .is_some_and(|bound| std::ptr::eq(bound, figure))
    }

    fn register(&mut self, path: &[usize], id: &str) {
        self.directives.push(PlaceDirective {
            path: path.to_vec(),
            id: id.to_string(),
        });
        self.entries.entry(id.to_string()).or_insert(None);
    }

    fn bind(&mut self, id: &str, figure: &'a Node) {
        if let Some(slot) = self.entries.get_mut(id) {
            *slot = Some(figure);
        }
    }
}

/// Whether a node is raw LaTeX
pub fn is_raw_tex(node: &Node) -> bool {
    node.is("raw") && node.property("format") == Some(TEX_FORMAT)
}

/// Extract the id from `\place{<id>}`
///
/// Returns `None` when the text does not start with the command, has no
/// closing brace, or names an empty id.
pub fn parse_place_directive(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(PLACE_COMMAND)?;
    let end = rest.find('}')?;
    let id = rest[..end].trim();
    (!id.is_empty()).then_some(id)
}

/// Build the place map for a tree
pub fn resolve_places(root: &Node) -> PlaceMap<'_> {
    let mut places = PlaceMap::new();

    root.visit(&mut |path, node| {
        if !is_raw_tex(node) {
            return;
        }
        if let Some(id) = node.value().and_then(parse_place_directive) {
            places.register(path, id);
        }
    });

    if places.is_empty() {
        return places;
    }

    for node in root.walk() {
        if !node.is("figure") {
            continue;
        }
        if let Some(id) = node.id() {
            places.bind(id, node);
        }
    }

    tracing::debug!(
        places = places.len(),
        unbound = places.entries.values().filter(|f| f.is_none()).count(),
        "resolved place directives"
    );
    places
}
