//! LaTeX compilation options
//!
//! Options are read from the `[latex]` table of `scribe.toml`:
//!
//! ```toml
//! [latex]
//! template = "article"
//! tags = ["<<", ">>"]
//! pdf = true
//! latexDir = "build/tex"
//! compilers = ["latexmk", "pdflatex"]
//! timeoutSecs = 120
//!
//! [latex.vspace]
//! abstract = "\\vspace{-1em}"
//!
//! [latex.prefixes]
//! figure = "Fig."
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scribe_ast::RefKind;
use serde::{Deserialize, Serialize};

use crate::error::{LatexError, Result};

/// Default template identifier
pub const DEFAULT_TEMPLATE: &str = "article";

/// Settings file name looked up next to the input document
pub const SETTINGS_FILE: &str = "scribe.toml";

/// Template delimiter pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct Tags {
    /// Opening delimiter
    pub open: String,
    /// Closing delimiter
    pub close: String,
}

impl Tags {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self::new("<<", ">>")
    }
}

impl From<[String; 2]> for Tags {
    fn from([open, close]: [String; 2]) -> Self {
        Self { open, close }
    }
}

impl From<Tags> for [String; 2] {
    fn from(tags: Tags) -> Self {
        [tags.open, tags.close]
    }
}

/// Options controlling a single LaTeX compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LatexOptions {
    /// Template package identifier
    pub template: String,
    /// Template delimiters
    pub tags: Tags,
    /// Produce a PDF (otherwise stop after writing the sources)
    pub pdf: bool,
    /// Explicit working directory for the LaTeX sources
    pub latex_dir: Option<PathBuf>,
    /// Spacing command inserted before a named block
    pub vspace: BTreeMap<String, String>,
    /// Cross-reference prefixes keyed by category name
    pub prefixes: BTreeMap<String, String>,
    /// Typesetters to try, in priority order
    pub compilers: Vec<String>,
    /// Per-compiler timeout in seconds
    pub timeout_secs: u64,
    /// Override for the built-in template directory
    pub template_dir: Option<PathBuf>,
}

impl Default for LatexOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            tags: Tags::default(),
            pdf: true,
            latex_dir: None,
            vspace: BTreeMap::new(),
            prefixes: default_prefixes(),
            compilers: vec!["latexmk".to_string(), "pdflatex".to_string()],
            timeout_secs: 120,
            template_dir: None,
        }
    }
}

impl LatexOptions {
    /// Cross-reference prefix for a category, falling back to the default name
    pub fn prefix(&self, kind: RefKind) -> String {
        self.prefixes
            .get(&kind.to_string())
            .cloned()
            .unwrap_or_else(|| default_prefix(kind).to_string())
    }

    /// Typesetter timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default prefix for a reference category
pub fn default_prefix(kind: RefKind) -> &'static str {
    match kind {
        RefKind::Figure => "Figure",
        RefKind::Table => "Table",
        RefKind::Equation => "Equation",
        RefKind::Section => "Section",
    }
}

fn default_prefixes() -> BTreeMap<String, String> {
    RefKind::all()
        .iter()
        .map(|kind| (kind.to_string(), default_prefix(*kind).to_string()))
        .collect()
}

/// Top-level settings file structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// LaTeX options
    pub latex: LatexOptions,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|source| LatexError::Config {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(LatexError::io(path, e)),
        }
    }
}
