//! Generic document tree nodes
//!
//! A node carries a semantic name (`"figure"`, `"abstract"`, `"raw"`, ...),
//! a property map, a set of style classes, and either an ordered list of
//! children or a single literal value.
//!
//! # JSON form
//!
//! ```json
//! { "name": "figure", "properties": { "id": "figA" }, "classes": ["teaser"],
//!   "children": [ { "name": "caption", "children": [ { "name": "text", "value": "A cat" } ] } ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Node content: nested children or a literal leaf value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Ordered child nodes
    Children(Vec<Node>),
    /// Literal text (text leaves, raw markup, math bodies)
    Value(String),
}

impl Default for Content {
    fn default() -> Self {
        Content::Children(Vec::new())
    }
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    /// Semantic role of the node
    pub name: String,
    /// Key-value properties (`id`, `format`, `href`, ...)
    pub properties: BTreeMap<String, String>,
    /// Style classes, in declaration order without duplicates
    pub classes: Vec<String>,
    /// Children or literal value
    pub content: Content,
}

/// Position of a node as the child-index path from the root.
///
/// The root itself has the empty path.
pub type NodePath = Vec<usize>;

impl Node {
    /// Create an empty node with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a `text` leaf
    pub fn text(value: impl Into<String>) -> Self {
        Self::new("text").with_value(value)
    }

    /// Create a `raw` leaf carrying markup in the given format
    pub fn raw(format: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new("raw")
            .with_property("format", format)
            .with_value(value)
    }

    /// Set a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the `id` property
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_property("id", id)
    }

    /// Add a style class (ignored if already present)
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Replace the content with the given children
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.content = Content::Children(children);
        self
    }

    /// Replace the content with a literal value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.content = Content::Value(value.into());
        self
    }

    /// Append a child, turning a leaf into a container if needed
    pub fn push(&mut self, child: Node) {
        match &mut self.content {
            Content::Children(children) => children.push(child),
            Content::Value(_) => self.content = Content::Children(vec![child]),
        }
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }

    /// The `id` property, if present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.property("id").filter(|id| !id.is_empty())
    }

    /// Check whether the node carries a style class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Check the node name
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Child nodes (empty for leaves)
    pub fn children(&self) -> &[Node] {
        match &self.content {
            Content::Children(children) => children,
            Content::Value(_) => &[],
        }
    }

    /// Literal value (`None` for containers)
    pub fn value(&self) -> Option<&str> {
        match &self.content {
            Content::Value(value) => Some(value),
            Content::Children(_) => None,
        }
    }

    /// Concatenated literal text of this subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in self.walk() {
            if let Some(value) = node.value() {
                out.push_str(value);
            }
        }
        out
    }

    /// Pre-order, depth-first iterator over this node and its descendants
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Visit every node in document order together with its path
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&[usize], &'a Node)) {
        let mut path = Vec::new();
        self.visit_inner(&mut path, f);
    }

    fn visit_inner<'a>(&'a self, path: &mut NodePath, f: &mut impl FnMut(&[usize], &'a Node)) {
        f(path.as_slice(), self);
        for (index, child) in self.children().iter().enumerate() {
            path.push(index);
            child.visit_inner(path, f);
            path.pop();
        }
    }

    /// Find the first node (in document order) with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.walk().find(|node| node.id() == Some(id))
    }

    /// Resolve a path produced by [`Node::visit`]
    pub fn at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.children().get(index)?;
        }
        Some(node)
    }
}

/// Iterator returned by [`Node::walk`]
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Wire representation: `children` and `value` as sibling optional keys
#[derive(Clone, Default, Serialize, Deserialize)]
struct RawNode {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let mut classes: Vec<String> = Vec::with_capacity(raw.classes.len());
        for class in raw.classes {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        let content = match raw.value {
            Some(value) => Content::Value(value),
            None => Content::Children(raw.children),
        };
        Self {
            name: raw.name,
            properties: raw.properties,
            classes,
            content,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let (children, value) = match node.content {
            Content::Children(children) => (children, None),
            Content::Value(value) => (Vec::new(), Some(value)),
        };
        Self {
            name: node.name,
            properties: node.properties,
            classes: node.classes,
            children,
            value,
        }
    }
}
