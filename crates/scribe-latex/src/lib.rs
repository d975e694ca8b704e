//! scribe-latex - PDF generation via LaTeX
//!
//! This crate turns a scribe document tree into a LaTeX source file,
//! fills a template package with it, and optionally typesets a PDF with
//! an external TeX installation.
//!
//! # Architecture
//!
//! 1. **Place resolver** - binds `\place{id}` directives to figures
//! 2. **Formatter** - converts tree fragments to escaped LaTeX
//! 3. **Extractor** - pulls abstract, acknowledgments, teaser and preamble
//!    out of the main flow
//! 4. **Template resolver and engine** - finds the template package and
//!    substitutes render data into it
//! 5. **Emit** - writes `.tex`, `.bib` and auxiliary files concurrently
//! 6. **Typesetter** - runs latexmk or pdflatex and copies the PDF out
//!
//! # Example
//!
//! ```ignore
//! use scribe_latex::{compile_document, LatexOptions};
//!
//! let pdf = compile_document(&doc, "paper.json", "out", &LatexOptions::default()).await?;
//! ```

pub mod compile;
pub mod config;
pub mod emit;
pub mod engine;
mod error;
pub mod escape;
pub mod extract;
pub mod format;
pub mod place;
pub mod template;
pub mod typeset;

use std::path::{Path, PathBuf};

pub use compile::{compile, CompileContext};
pub use config::{LatexOptions, Settings, Tags};
pub use emit::{build_render_data, RenderData};
pub use engine::Template;
pub use error::{LatexError, Result};
pub use escape::{escape, unescape};
pub use extract::{extract_blocks, BlockName, Blocks};
pub use format::TexFormatter;
pub use place::{resolve_places, PlaceMap};
pub use template::{TemplatePackage, TemplateResolver};
pub use typeset::{TexCompiler, TypesetError, TypesetJob, Typesetter};

/// Compile a document using the typesetters named in `options`
///
/// `input_path` names the generated files and anchors relative paths.
pub async fn compile_document(
    doc: &scribe_ast::Document,
    input_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &LatexOptions,
) -> Result<Option<PathBuf>> {
    let ctx = CompileContext::new(input_path.as_ref(), output_dir.as_ref()).with_document(doc);
    let typesetter = Typesetter::from_names(&options.compilers);
    compile(&doc.root, &ctx, options, &typesetter).await
}
