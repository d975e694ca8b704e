//! Integration tests for the scribe CLI
//!
//! These run the `latex` command on JSON documents written to a temporary
//! directory. PDF output is disabled so no TeX installation is needed.

use std::fs;
use std::path::PathBuf;

use scribe_cli::{latex_command, load_document, LatexArgs};
use tempfile::TempDir;

const DOCUMENT: &str = r#"{
  "root": {
    "name": "root",
    "children": [
      { "name": "abstract", "children": [
        { "name": "p", "children": [{ "name": "text", "value": "A short summary." }] }
      ]},
      { "name": "section", "properties": { "id": "intro" }, "children": [
        { "name": "heading", "children": [{ "name": "text", "value": "Introduction" }] },
        { "name": "p", "children": [
          { "name": "text", "value": "Fish & chips" },
          { "name": "text", "classes": ["italic"], "value": " daily" }
        ]}
      ]}
    ]
  },
  "metadata": {
    "title": "A Study",
    "authors": [{ "name": "Grace Hopper" }]
  },
  "citations": {
    "references": [{ "id": "intro", "kind": "section" }],
    "bibliography": ["@misc{cobol, title={COBOL}}"]
  }
}"#;

fn args(dir: &TempDir) -> LatexArgs {
    LatexArgs {
        input: dir.path().join("study.json"),
        output: dir.path().join("out"),
        template: None,
        no_pdf: true,
        latex_dir: None,
        config: None,
    }
}

#[test]
fn test_load_document() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("study.json");
    fs::write(&input, DOCUMENT).unwrap();

    let document = load_document(&input).unwrap();
    assert_eq!(document.metadata.title.as_deref(), Some("A Study"));
    assert_eq!(document.root.children().len(), 2);
    assert!(document.citations.unwrap().has_bibliography());
}

#[test]
fn test_load_document_missing_file() {
    let err = load_document(&PathBuf::from("/nonexistent/doc.json")).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[tokio::test]
async fn test_latex_without_pdf() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("study.json"), DOCUMENT).unwrap();

    let result = latex_command(&args(&dir)).await.unwrap();

    let out = dir.path().join("out");
    assert_eq!(result, Some(out.clone()));
    let tex = fs::read_to_string(out.join("study.tex")).unwrap();
    assert!(tex.contains(r"\title{A Study}"));
    assert!(tex.contains(r"\author{Grace Hopper}"));
    assert!(tex.contains(r"Fish \& chips\emph{ daily}"));
    assert!(tex.contains("\\begin{abstract}\nA short summary.\n\\end{abstract}"));
    assert_eq!(
        fs::read_to_string(out.join("study.bib")).unwrap(),
        "@misc{cobol, title={COBOL}}\n"
    );
}

#[tokio::test]
async fn test_config_file_next_to_input() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("study.json"), DOCUMENT).unwrap();
    fs::write(
        dir.path().join("scribe.toml"),
        "[latex]\nlatexDir = \"tex\"\n\n[latex.vspace]\nabstract = \"\\\\vspace{-2mm}\"\n",
    )
    .unwrap();

    let result = latex_command(&args(&dir)).await.unwrap();

    let tex_dir = dir.path().join("tex");
    assert_eq!(result, Some(tex_dir.clone()));
    let tex = fs::read_to_string(tex_dir.join("study.tex")).unwrap();
    assert!(tex.contains("\\begin{abstract}\n\\vspace{-2mm}\nA short summary."));
}

#[tokio::test]
async fn test_unknown_template_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("study.json"), DOCUMENT).unwrap();
    let mut args = args(&dir);
    args.template = Some("no-such-template".to_string());

    let err = latex_command(&args).await.unwrap_err();
    assert!(format!("{err:#}").contains("Template not found: no-such-template"));
}

#[tokio::test]
async fn test_invalid_json_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("study.json"), "{ not json").unwrap();

    let err = latex_command(&args(&dir)).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse document JSON"));
}
