//! Document tree to LaTeX text
//!
//! [`TexFormatter`] is built once per document from static tables (style
//! classes, escapes) and per-document data (place map, reference list,
//! spacing and prefix options). It is immutable afterwards; every call takes
//! `&self`, so one formatter never leaks state into another document.
//!
//! # Example
//!
//! ```
//! use scribe_ast::Node;
//! use scribe_latex::{resolve_places, LatexOptions, TexFormatter};
//!
//! let root = Node::new("root").with_children(vec![
//!     Node::new("p").with_children(vec![
//!         Node::text("Costs rose 5% "),
//!         Node::new("span").with_class("italic").with_children(vec![Node::text("again")]),
//!     ]),
//! ]);
//! let options = LatexOptions::default();
//! let fmt = TexFormatter::new(&root, resolve_places(&root), &options, None);
//! assert_eq!(fmt.content(), r"Costs rose 5\% \emph{again}");
//! ```

use std::collections::{BTreeMap, HashMap};

use scribe_ast::{Citations, Node, RefKind};

use crate::config::LatexOptions;
use crate::escape::{escape, escape_bibtex};
use crate::extract::is_extracted;
use crate::place::{is_raw_tex, parse_place_directive, PlaceMap};

/// Style class → wrapping command
///
/// `strong` and `demi` are aliases of `bold`: LaTeX's default font set has
/// no distinct demi-bold weight.
const STYLE_COMMANDS: &[(&str, &str)] = &[
    ("italic", "emph"),
    ("emphasis", "emph"),
    ("bold", "textbf"),
    ("strong", "textbf"),
    ("demi", "textbf"),
    ("underline", "underline"),
    ("smallcaps", "textsc"),
    ("monospace", "texttt"),
];

/// Sectioning commands by heading level (1-based)
const SECTION_COMMANDS: &[&str] = &[
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Command for a style class; unknown classes have none
pub fn style_command(class: &str) -> Option<&'static str> {
    STYLE_COMMANDS
        .iter()
        .find(|(name, _)| *name == class)
        .map(|(_, command)| *command)
}

#[derive(Debug, Clone, Copy, Default)]
struct Ctx {
    /// Number of enclosing `section` nodes
    depth: usize,
}

impl Ctx {
    fn nested(self) -> Self {
        Self {
            depth: self.depth + 1,
        }
    }
}

/// Converts document tree fragments into LaTeX
pub struct TexFormatter<'a> {
    places: PlaceMap<'a>,
    /// Category of every id declared in the tree or the reference list
    targets: HashMap<String, RefKind>,
    prefixes: BTreeMap<RefKind, String>,
    vspace: BTreeMap<String, String>,
    root: &'a Node,
}

impl<'a> TexFormatter<'a> {
    /// Build a formatter for one document
    pub fn new(
        root: &'a Node,
        places: PlaceMap<'a>,
        options: &LatexOptions,
        citations: Option<&Citations>,
    ) -> Self {
        let mut targets = HashMap::new();
        for node in root.walk() {
            if let (Some(id), Some(kind)) = (node.id(), RefKind::of_node(&node.name)) {
                targets.entry(id.to_string()).or_insert(kind);
            }
        }
        // The citation processor knows better than the tree.
        if let Some(citations) = citations {
            for reference in &citations.references {
                targets.insert(reference.id.clone(), reference.kind);
            }
        }

        let prefixes = RefKind::all()
            .iter()
            .map(|kind| (*kind, options.prefix(*kind)))
            .collect();

        Self {
            places,
            targets,
            prefixes,
            vspace: options.vspace.clone(),
            root,
        }
    }

    /// Place map this formatter resolves directives against
    pub fn places(&self) -> &PlaceMap<'a> {
        &self.places
    }

    /// Render a tree fragment; `None` in, `None` out
    pub fn tex(&self, node: Option<&Node>) -> Option<String> {
        node.map(|node| tidy(&self.render(node, Ctx::default())))
    }

    /// Render a plain scalar; `None` in, `None` out
    pub fn tex_value(&self, value: Option<&str>) -> Option<String> {
        value.map(escape)
    }

    /// Escape text that is already BibTeX
    pub fn string(&self, raw: &str) -> String {
        escape_bibtex(raw)
    }

    /// Spacing command configured for the node's name
    pub fn vspace(&self, node: &Node) -> Option<&str> {
        self.vspace.get(&node.name).map(|s| s.as_str())
    }

    /// Render only a node's children
    pub fn fragment(&self, node: &Node) -> String {
        tidy(&self.render_children(node, Ctx::default()))
    }

    /// `\label{<category>:<id>}`, or `None` when the node has no id
    pub fn label(&self, node: &Node, kind: RefKind) -> Option<String> {
        node.id()
            .map(|id| format!(r"\label{{{}:{}}}", kind.label_prefix(), id))
    }

    /// Main content: the root's children minus extracted blocks
    pub fn content(&self) -> String {
        let mut out = String::new();
        for child in self.root.children() {
            if is_extracted(child) {
                continue;
            }
            out.push_str(&self.render(child, Ctx::default()));
        }
        tidy(&out)
    }

    /// Category of a cross-reference target
    ///
    /// A target claimed by a place directive is always a figure.
    pub fn ref_kind(&self, target: &str, hint: Option<&str>) -> Option<RefKind> {
        if self.places.get(target).is_some() {
            return Some(RefKind::Figure);
        }
        hint.and_then(RefKind::parse)
            .or_else(|| self.targets.get(target).copied())
    }

    fn render(&self, node: &Node, ctx: Ctx) -> String {
        let body = self.render_node(node, ctx);
        match self.vspace(node) {
            Some(vspace) if !body.is_empty() => format!("{vspace}\n{body}"),
            _ => body,
        }
    }

    fn render_children(&self, node: &Node, ctx: Ctx) -> String {
        let mut out = String::new();
        for child in node.children() {
            out.push_str(&self.render(child, ctx));
        }
        out
    }

    fn render_node(&self, node: &Node, ctx: Ctx) -> String {
        match node.name.as_str() {
            "text" => self.styled(node, self.text(node, ctx)),
            "raw" => self.render_raw(node),
            "section" => self.render_section(node, ctx),
            "heading" => {
                let level = heading_level(node).unwrap_or(ctx.depth.max(1));
                self.render_heading(node, level, None)
            }
            "p" | "paragraph" => block(self.render_children(node, ctx).trim()),
            "span" => self.styled(node, self.render_children(node, ctx)),
            "em" => self.styled(node, command("emph", &self.render_children(node, ctx))),
            "strong" | "b" => {
                self.styled(node, command("textbf", &self.render_children(node, ctx)))
            }
            "code" => self.styled(node, command("texttt", &escape(&node.text_content()))),
            "link" | "a" => self.render_link(node, ctx),
            "ref" => self.styled(node, self.render_ref(node)),
            "cite" => self.render_cite(node),
            "figure" => self.render_figure(node, ctx, false),
            "image" | "img" => render_image(node),
            "caption" => {
                let caption = self.render_children(node, ctx);
                format!("\\caption{{{}}}\n", caption.trim())
            }
            "table" => self.render_table(node, ctx),
            "math" => format!("${}$", node.text_content().trim()),
            "equation" => self.render_equation(node),
            "list" | "ul" | "ol" => self.render_list(node, ctx),
            "item" | "li" => format!("\\item {}\n", self.render_children(node, ctx).trim()),
            "quote" | "blockquote" => environment(
                "quote",
                None,
                self.render_children(node, ctx).trim(),
            ),
            "pre" | "codeblock" => environment(
                "verbatim",
                None,
                &verbatim(node.text_content().trim_end_matches('\n')),
            ),
            "break" | "br" => "\\newline\n".to_string(),
            _ => self.render_children(node, ctx),
        }
    }

    fn text(&self, node: &Node, ctx: Ctx) -> String {
        match node.value() {
            Some(value) => escape(value),
            None => self.render_children(node, ctx),
        }
    }

    /// Wrap content in the commands of the node's style classes
    fn styled(&self, node: &Node, content: String) -> String {
        node.classes
            .iter()
            .filter_map(|class| style_command(class))
            .fold(content, |inner, cmd| command(cmd, &inner))
    }

    fn render_raw(&self, node: &Node) -> String {
        if !is_raw_tex(node) {
            tracing::debug!(
                format = node.property("format").unwrap_or_default(),
                "dropping raw content in foreign format"
            );
            return String::new();
        }
        let value = node.value().unwrap_or_default();
        let Some(id) = parse_place_directive(value) else {
            return format!("{}\n", verbatim(value));
        };
        match self.places.get(id) {
            Some(figure) => self.render_figure(figure, Ctx::default(), true),
            None => {
                tracing::warn!(place = id, "place directive names no figure");
                String::new()
            }
        }
    }

    fn render_section(&self, node: &Node, ctx: Ctx) -> String {
        let inner = ctx.nested();
        let mut out = String::new();
        for child in node.children() {
            if child.is("heading") {
                let level = heading_level(child).unwrap_or(inner.depth);
                let heading = self.render_heading(child, level, node.id());
                match self.vspace(child) {
                    Some(vspace) => {
                        out.push_str(vspace);
                        out.push('\n');
                        out.push_str(&heading);
                    }
                    None => out.push_str(&heading),
                }
            } else {
                out.push_str(&self.render(child, inner));
            }
        }
        out
    }

    fn render_heading(&self, node: &Node, level: usize, section_id: Option<&str>) -> String {
        let index = level.clamp(1, SECTION_COMMANDS.len()) - 1;
        let star = if node.has_class("unnumbered") { "*" } else { "" };
        let title = self.render_children(node, Ctx::default());
        let mut out = format!("\\{}{}{{{}}}\n", SECTION_COMMANDS[index], star, title.trim());
        let label = self
            .label(node, RefKind::Section)
            .or_else(|| section_id.map(|id| format!(r"\label{{sec:{id}}}")));
        if let Some(label) = label {
            out.push_str(&label);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    fn render_link(&self, node: &Node, ctx: Ctx) -> String {
        let text = self.render_children(node, ctx);
        let link = match node.property("href") {
            Some(href) if text.trim().is_empty() => format!("\\url{{{}}}", escape_url(href)),
            Some(href) => format!("\\href{{{}}}{{{}}}", escape_url(href), text),
            None => text,
        };
        self.styled(node, link)
    }

    fn render_ref(&self, node: &Node) -> String {
        let Some(target) = node.property("target").filter(|t| !t.is_empty()) else {
            return String::new();
        };
        match self.ref_kind(target, node.property("kind")) {
            Some(kind) => format!(
                "{}~\\ref{{{}:{}}}",
                self.prefixes.get(&kind).map(|s| s.as_str()).unwrap_or_default(),
                kind.label_prefix(),
                target
            ),
            None => format!("\\ref{{{target}}}"),
        }
    }

    fn render_cite(&self, node: &Node) -> String {
        let keys: Vec<&str> = node
            .property("keys")
            .or_else(|| node.property("target"))
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|key| !key.is_empty())
            .collect();
        if keys.is_empty() {
            return String::new();
        }
        format!("\\cite{{{}}}", keys.join(","))
    }

    /// Render a figure environment
    ///
    /// A figure claimed by a place directive is rendered only at the
    /// directive (`placed == true`) and suppressed at its own position.
    fn render_figure(&self, node: &Node, ctx: Ctx, placed: bool) -> String {
        if !placed && self.places.is_claimed(node) {
            return String::new();
        }
        let name = if node.has_class("wide") {
            "figure*"
        } else {
            "figure"
        };
        let mut body = String::from("\\centering\n");
        body.push_str(self.render_children(node, ctx).trim());
        if let Some(label) = self.label(node, RefKind::Figure) {
            body.push('\n');
            body.push_str(&label);
        }
        environment(name, Some(node.property("placement").unwrap_or("htbp")), &body)
    }

    fn render_table(&self, node: &Node, ctx: Ctx) -> String {
        let mut body = String::from("\\centering\n");
        let rows: Vec<&Node> = node
            .children()
            .iter()
            .filter(|child| child.is("row") || child.is("tr"))
            .collect();
        for child in node.children() {
            if child.is("row") || child.is("tr") {
                continue;
            }
            body.push_str(&self.render(child, ctx));
        }
        if !rows.is_empty() {
            body.push_str(&self.render_tabular(&rows, ctx));
        }
        let mut body = body.trim_end().to_string();
        if let Some(label) = self.label(node, RefKind::Table) {
            body.push('\n');
            body.push_str(&label);
        }
        environment("table", Some(node.property("placement").unwrap_or("htbp")), &body)
    }

    fn render_tabular(&self, rows: &[&Node], ctx: Ctx) -> String {
        let columns = rows
            .iter()
            .map(|row| row.children().len())
            .max()
            .unwrap_or(0);
        let mut out = format!("\\begin{{tabular}}{{{}}}\n\\hline\n", "l".repeat(columns));
        for row in rows {
            let cells: Vec<String> = row
                .children()
                .iter()
                .map(|cell| self.render_children(cell, ctx).trim().to_string())
                .collect();
            out.push_str(&cells.join(" & "));
            out.push_str(" \\\\\n");
            let header = row.has_class("header")
                || row.children().iter().any(|cell| cell.is("th"));
            if header {
                out.push_str("\\hline\n");
            }
        }
        out.push_str("\\hline\n\\end{tabular}\n");
        out
    }

    fn render_equation(&self, node: &Node) -> String {
        let body = node.text_content();
        match self.label(node, RefKind::Equation) {
            Some(label) => environment("equation", None, &format!("{}\n{}", body.trim(), label)),
            None => environment("equation*", None, body.trim()),
        }
    }

    fn render_list(&self, node: &Node, ctx: Ctx) -> String {
        let ordered = node.is("ol")
            || node.has_class("ordered")
            || node.property("ordered") == Some("true");
        let name = if ordered { "enumerate" } else { "itemize" };
        environment(name, None, self.render_children(node, ctx).trim_end())
    }
}

fn heading_level(node: &Node) -> Option<usize> {
    node.property("level")?.parse().ok()
}

fn command(name: &str, content: &str) -> String {
    format!("\\{name}{{{content}}}")
}

fn block(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    format!("{content}\n\n")
}

fn environment(name: &str, placement: Option<&str>, body: &str) -> String {
    let placement = placement.map(|p| format!("[{p}]")).unwrap_or_default();
    format!("\\begin{{{name}}}{placement}\n{body}\n\\end{{{name}}}\n\n")
}

fn render_image(node: &Node) -> String {
    let Some(src) = node.property("src").or_else(|| node.property("href")) else {
        return String::new();
    };
    let width = node.property("width").unwrap_or(r"\linewidth");
    format!("\\includegraphics[width={width}]{{{src}}}\n")
}

/// Escape the characters `\href`/`\url` cannot take verbatim
fn escape_url(url: &str) -> String {
    url.replace('%', r"\%").replace('#', r"\#")
}

/// Brackets text that [`tidy`] must copy through unchanged
const VERBATIM_OPEN: char = '\u{E000}';
const VERBATIM_CLOSE: char = '\u{E001}';

fn verbatim(text: &str) -> String {
    format!("{VERBATIM_OPEN}{text}{VERBATIM_CLOSE}")
}

/// Collapse the blank-line runs the formatter produced and trim the ends
///
/// Spans marked by [`verbatim`] are copied as they are and the markers
/// dropped.
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut leading = true;
    loop {
        let start = rest.find(VERBATIM_OPEN);
        let mut segment = collapse_blank_lines(&rest[..start.unwrap_or(rest.len())]);
        if leading {
            segment = segment.trim_start().to_string();
            leading = false;
        }
        let Some(start) = start else {
            out.push_str(segment.trim_end());
            return out;
        };
        out.push_str(&segment);

        let span = &rest[start + VERBATIM_OPEN.len_utf8()..];
        let end = span.find(VERBATIM_CLOSE).unwrap_or(span.len());
        out.push_str(&span[..end]);
        rest = span.get(end + VERBATIM_CLOSE.len_utf8()..).unwrap_or_default();
    }
}

/// At most one blank line in a row, no trailing spaces before a newline
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    let mut lines = text.split('\n').peekable();
    let mut first = true;
    while let Some(line) = lines.next() {
        if !first {
            newlines += 1;
        }
        first = false;
        let line = if lines.peek().is_some() {
            line.trim_end()
        } else {
            line
        };
        if !line.is_empty() {
            out.extend(std::iter::repeat('\n').take(newlines.min(2)));
            newlines = 0;
            out.push_str(line);
        }
    }
    out.extend(std::iter::repeat('\n').take(newlines.min(2)));
    out
}
