//! Render data and file emission
//!
//! Render data is everything the template can see. Every value in it is
//! already LaTeX (escaped or generated by the formatter), so the template
//! engine substitutes it verbatim.
//!
//! Missing metadata never blocks a compilation: each fallback lives in its
//! own `default_*` function.

use std::path::{Path, PathBuf};

use scribe_ast::{Author, Citations, Metadata};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::{LatexError, Result};
use crate::extract::{BlockName, Blocks};
use crate::format::TexFormatter;
use crate::template::TemplatePackage;

/// Title used when the metadata has none
pub const DEFAULT_TITLE: &str = "Untitled";

/// Author used when the metadata lists none
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// Date used when the metadata has none; LaTeX fills in the build date
pub const DEFAULT_DATE: &str = r"\today";

/// An author as the template sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderAuthor {
    pub name: String,
    pub affiliation: Option<String>,
}

/// Values available to the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderData {
    pub date: String,
    pub title: String,
    pub short_title: Option<String>,
    pub authors: Vec<RenderAuthor>,
    pub first_author: RenderAuthor,
    pub other_authors: Vec<RenderAuthor>,
    pub short_author: Option<String>,
    /// Bibliography file name, present only when entries exist
    pub bibliography: Option<String>,
    pub keywords: Vec<String>,
    pub graphics_path: Option<String>,
    pub content: String,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub acknowledgments: Option<String>,
    pub teaser: Option<String>,
    pub preamble: Option<String>,
}

/// Metadata title or [`DEFAULT_TITLE`]
pub fn default_title(title: Option<&str>) -> &str {
    title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE)
}

/// Metadata authors, or a single [`DEFAULT_AUTHOR`]
pub fn default_authors(authors: &[Author]) -> Vec<Author> {
    if authors.is_empty() {
        vec![Author::new(DEFAULT_AUTHOR)]
    } else {
        authors.to_vec()
    }
}

/// Metadata date or [`DEFAULT_DATE`]
pub fn default_date(date: Option<&str>) -> &str {
    date.filter(|d| !d.trim().is_empty()).unwrap_or(DEFAULT_DATE)
}

/// Running-head author line: `A`, `A and B`, or `A et al.`
///
/// `None` when the metadata lists no authors.
pub fn short_author(authors: &[Author]) -> Option<String> {
    match authors {
        [] => None,
        [only] => Some(only.name.clone()),
        [first, second] => Some(format!("{} and {}", first.name, second.name)),
        [first, ..] => Some(format!("{} et al.", first.name)),
    }
}

/// Bibliography file name for a document, when there is anything to cite
pub fn bibliography_file(name: &str, citations: Option<&Citations>) -> Option<String> {
    citations
        .filter(|c| c.has_bibliography())
        .map(|_| format!("{name}.bib"))
}

/// Contents of the `.bib` file
pub fn bibliography_contents(citations: &Citations, fmt: &TexFormatter<'_>) -> String {
    let entries: Vec<String> = citations
        .bibliography
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| fmt.string(entry))
        .collect();
    let mut out = entries.join("\n\n");
    out.push('\n');
    out
}

/// Assemble the template's view of the document
pub fn build_render_data(
    metadata: &Metadata,
    fmt: &TexFormatter<'_>,
    mut blocks: Blocks,
    bibliography: Option<String>,
    graphics_path: Option<&Path>,
) -> RenderData {
    let authors: Vec<RenderAuthor> = default_authors(&metadata.authors)
        .iter()
        .map(|author| RenderAuthor {
            name: escape_value(fmt, &author.name),
            affiliation: fmt.tex_value(author.affiliation.as_deref()),
        })
        .collect();
    let (first_author, other_authors) = match authors.split_first() {
        Some((first, rest)) => (first.clone(), rest.to_vec()),
        None => (
            RenderAuthor {
                name: DEFAULT_AUTHOR.to_string(),
                affiliation: None,
            },
            Vec::new(),
        ),
    };

    RenderData {
        date: match metadata.date.as_deref() {
            Some(date) if !date.trim().is_empty() => escape_value(fmt, date),
            _ => default_date(None).to_string(),
        },
        title: escape_value(fmt, default_title(metadata.title.as_deref())),
        short_title: fmt.tex_value(metadata.short_title.as_deref()),
        short_author: short_author(&metadata.authors).map(|s| escape_value(fmt, &s)),
        authors,
        first_author,
        other_authors,
        bibliography,
        keywords: metadata
            .keywords
            .iter()
            .map(|keyword| escape_value(fmt, keyword))
            .collect(),
        graphics_path: graphics_path
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(graphics_path_value),
        content: fmt.content(),
        abstract_: blocks.take(BlockName::Abstract),
        acknowledgments: blocks.take(BlockName::Acknowledgments),
        teaser: blocks.take(BlockName::Teaser),
        preamble: blocks.take(BlockName::Preamble),
    }
}

fn escape_value(fmt: &TexFormatter<'_>, value: &str) -> String {
    fmt.tex_value(Some(value)).unwrap_or_default()
}

/// `\graphicspath` wants forward slashes and a trailing separator
fn graphics_path_value(dir: &Path) -> String {
    let mut path = dir.to_string_lossy().replace('\\', "/");
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Files written by [`emit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFiles {
    /// Generated `<name>.tex`
    pub source: PathBuf,
    /// `<name>.bib`, if written
    pub bibliography: Option<PathBuf>,
    /// Copied auxiliary template files
    pub aux: Vec<PathBuf>,
}

/// Write the rendered source, the bibliography and the template's auxiliary
/// files into `work_dir`
///
/// All writes target distinct paths and run concurrently.
pub async fn emit(
    work_dir: &Path,
    name: &str,
    rendered: String,
    bibliography: Option<(String, String)>,
    package: &TemplatePackage,
) -> Result<EmittedFiles> {
    let source = work_dir.join(format!("{name}.tex"));
    let bib_path = bibliography
        .as_ref()
        .map(|(file_name, _)| work_dir.join(file_name));

    let write_source = async {
        tokio::fs::write(&source, rendered)
            .await
            .map_err(|e| LatexError::io(&source, e))
    };

    let write_bibliography = async {
        match (&bib_path, bibliography) {
            (Some(path), Some((_, contents))) => tokio::fs::write(path, contents)
                .await
                .map_err(|e| LatexError::io(path, e)),
            _ => Ok(()),
        }
    };

    let copy_aux = async {
        let mut tasks = JoinSet::new();
        for (from, file_name) in package.aux_files() {
            let to = work_dir.join(file_name);
            tasks.spawn(async move {
                tokio::fs::copy(&from, &to)
                    .await
                    .map_err(|e| LatexError::io(&from, e))?;
                Ok::<_, LatexError>(to)
            });
        }
        let mut copied = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            copied.push(joined??);
        }
        copied.sort();
        Ok::<_, LatexError>(copied)
    };

    let ((), (), aux) = tokio::try_join!(write_source, write_bibliography, copy_aux)?;
    tracing::debug!(
        source = %source.display(),
        bibliography = bib_path.is_some(),
        aux = aux.len(),
        "emitted LaTeX sources"
    );

    Ok(EmittedFiles {
        source,
        bibliography: bib_path,
        aux,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LatexOptions;
    use crate::extract::extract_blocks;
    use crate::place::resolve_places;
    use crate::template::TemplateManifest;
    use scribe_ast::Node;
    use tempfile::TempDir;

    fn data_for(root: &Node, metadata: &Metadata, bibliography: Option<String>) -> RenderData {
        let options = LatexOptions::default();
        let fmt = TexFormatter::new(root, resolve_places(root), &options, None);
        let blocks = extract_blocks(root, &fmt);
        build_render_data(metadata, &fmt, blocks, bibliography, None)
    }

    #[test]
    fn test_missing_author_is_unknown() {
        let root = Node::new("root");
        let data = data_for(&root, &Metadata::default(), None);
        assert_eq!(data.authors.len(), 1);
        assert_eq!(data.authors[0].name, "Unknown Author");
        assert_eq!(data.first_author.name, "Unknown Author");
        assert!(data.other_authors.is_empty());
        assert_eq!(data.short_author, None);
        assert_eq!(data.title, DEFAULT_TITLE);
        assert_eq!(data.date, r"\today");
        assert_eq!(data.short_title, None);
    }

    #[test]
    fn test_metadata_is_escaped() {
        let mut metadata = Metadata::with_title("Cats & Dogs");
        metadata.add_author(Author::new("Ada_L").with_affiliation("R&D"));
        metadata.add_author(Author::new("Alan"));
        metadata.keywords = vec!["100%".to_string()];
        let data = data_for(&Node::new("root"), &metadata, None);
        assert_eq!(data.title, r"Cats \& Dogs");
        assert_eq!(data.first_author.name, r"Ada\_L");
        assert_eq!(data.first_author.affiliation.as_deref(), Some(r"R\&D"));
        assert_eq!(data.other_authors[0].name, "Alan");
        assert_eq!(data.short_author.as_deref(), Some(r"Ada\_L and Alan"));
        assert_eq!(data.keywords, vec![r"100\%"]);
    }

    #[test]
    fn test_short_author_forms() {
        let authors: Vec<Author> = ["A", "B", "C"].iter().map(|n| Author::new(*n)).collect();
        assert_eq!(short_author(&authors[..1]).as_deref(), Some("A"));
        assert_eq!(short_author(&authors).as_deref(), Some("A et al."));
        assert_eq!(short_author(&[]), None);
    }

    #[test]
    fn test_defaults_are_independent() {
        assert_eq!(default_title(Some("  ")), DEFAULT_TITLE);
        assert_eq!(default_title(Some("T")), "T");
        assert_eq!(default_date(None), r"\today");
        assert_eq!(default_authors(&[Author::new("X")])[0].name, "X");
    }

    #[test]
    fn test_empty_bibliography_has_no_file() {
        assert_eq!(bibliography_file("paper", None), None);
        let empty = Citations::default();
        assert_eq!(bibliography_file("paper", Some(&empty)), None);
        let blank = Citations {
            bibliography: vec!["   ".to_string()],
            ..Default::default()
        };
        assert_eq!(bibliography_file("paper", Some(&blank)), None);
        let data = data_for(&Node::new("root"), &Metadata::default(), None);
        assert_eq!(serde_json::to_value(&data).unwrap()["bibliography"], serde_json::Value::Null);
    }

    #[test]
    fn test_bibliography_file_and_contents() {
        let citations = Citations {
            bibliography: vec![
                "@misc{a, title={R&D}}".to_string(),
                "@misc{b, note={50\\%}}".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            bibliography_file("paper", Some(&citations)).as_deref(),
            Some("paper.bib")
        );
        let root = Node::new("root");
        let options = LatexOptions::default();
        let fmt = TexFormatter::new(&root, resolve_places(&root), &options, None);
        assert_eq!(
            bibliography_contents(&citations, &fmt),
            "@misc{a, title={R\\&D}}\n\n@misc{b, note={50\\%}}\n"
        );
    }

    #[test]
    fn test_blocks_land_in_render_data() {
        let root = Node::new("root").with_children(vec![
            Node::new("abstract").with_children(vec![Node::new("p")
                .with_children(vec![Node::text("Short.")])]),
            Node::new("p").with_children(vec![Node::text("Body")]),
        ]);
        let data = data_for(&root, &Metadata::default(), Some("paper.bib".to_string()));
        assert_eq!(data.abstract_.as_deref(), Some("Short."));
        assert_eq!(data.content, "Body");
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["abstract"], "Short.");
        assert_eq!(value["bibliography"], "paper.bib");
    }

    #[test]
    fn test_empty_graphics_dir_is_omitted() {
        let root = Node::new("root");
        let options = LatexOptions::default();
        let fmt = TexFormatter::new(&root, resolve_places(&root), &options, None);
        let blocks = extract_blocks(&root, &fmt);
        let data = build_render_data(&Metadata::default(), &fmt, blocks, None, Some(Path::new("")));
        assert_eq!(data.graphics_path, None);
    }

    #[test]
    fn test_graphics_path_has_trailing_slash() {
        assert_eq!(graphics_path_value(Path::new("/docs/paper")), "/docs/paper/");
        assert_eq!(graphics_path_value(Path::new("/docs/")), "/docs/");
    }

    #[tokio::test]
    async fn test_emit_writes_everything() {
        let template_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(template_dir.path().join("img")).unwrap();
        std::fs::write(template_dir.path().join("img/logo.png"), b"png").unwrap();
        std::fs::write(template_dir.path().join("style.sty"), "% sty").unwrap();
        let package = TemplatePackage {
            dir: template_dir.path().to_path_buf(),
            manifest: TemplateManifest {
                template: "template.tex".to_string(),
                files: vec!["style.sty".to_string(), "img/logo.png".to_string()],
            },
            embedded: None,
        };

        let work = TempDir::new().unwrap();
        let emitted = emit(
            work.path(),
            "paper",
            "\\documentclass{article}".to_string(),
            Some(("paper.bib".to_string(), "@misc{a}\n".to_string())),
            &package,
        )
        .await
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(work.path().join("paper.tex")).unwrap(),
            "\\documentclass{article}"
        );
        assert_eq!(emitted.bibliography, Some(work.path().join("paper.bib")));
        assert!(work.path().join("logo.png").is_file());
        assert!(work.path().join("style.sty").is_file());
        assert_eq!(emitted.aux.len(), 2);
    }

    #[tokio::test]
    async fn test_emit_without_bibliography() {
        let template_dir = TempDir::new().unwrap();
        let package = TemplatePackage {
            dir: template_dir.path().to_path_buf(),
            manifest: TemplateManifest {
                template: "template.tex".to_string(),
                files: vec![],
            },
            embedded: None,
        };
        let work = TempDir::new().unwrap();
        let emitted = emit(work.path(), "paper", String::new(), None, &package)
            .await
            .unwrap();
        assert_eq!(emitted.bibliography, None);
        assert!(!work.path().join("paper.bib").exists());
    }

    #[tokio::test]
    async fn test_missing_aux_file_is_error() {
        let template_dir = TempDir::new().unwrap();
        let package = TemplatePackage {
            dir: template_dir.path().to_path_buf(),
            manifest: TemplateManifest {
                template: "template.tex".to_string(),
                files: vec!["ghost.cls".to_string()],
            },
            embedded: None,
        };
        let work = TempDir::new().unwrap();
        let err = emit(work.path(), "paper", String::new(), None, &package)
            .await
            .unwrap_err();
        assert!(matches!(err, LatexError::Io { .. }));
    }
}
