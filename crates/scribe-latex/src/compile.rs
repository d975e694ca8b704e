//! Document compilation entry point
//!
//! ```text
//! create dirs ─► resolve places ─► format + extract ─► resolve template
//!     ─► render ─► emit (.tex, .bib, aux files) ─► typeset ─► copy PDF
//! ```
//!
//! Template resolution failures abort the compilation. A typesetting
//! failure does not: it is logged, the generated sources stay on disk, and
//! the caller gets `Ok(None)`.

use std::path::{Path, PathBuf};

use scribe_ast::{Citations, Document, Metadata, Node};
use tempfile::TempDir;
use tracing::Instrument;

use crate::config::LatexOptions;
use crate::emit::{bibliography_contents, bibliography_file, build_render_data, emit};
use crate::engine::Template;
use crate::error::{LatexError, Result};
use crate::extract::extract_blocks;
use crate::format::TexFormatter;
use crate::place::resolve_places;
use crate::template::TemplateResolver;
use crate::typeset::{TypesetJob, Typesetter};

/// Base name used when the input path has none
const FALLBACK_NAME: &str = "document";

/// Everything a compilation needs besides the tree and the options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileContext {
    /// Citation bundle, if the document cites anything
    pub citations: Option<Citations>,
    /// Document metadata
    pub metadata: Metadata,
    /// Directory of the input document; local templates and relative
    /// paths resolve against it
    pub input_dir: PathBuf,
    /// Input document path; its stem names every generated file
    pub input_path: PathBuf,
    /// Where the PDF is copied
    pub output_dir: PathBuf,
    /// Parent of temporary working directories
    pub temp_dir: PathBuf,
}

impl CompileContext {
    /// Context for `input_path`, writing into `output_dir`
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        let input_dir = input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            citations: None,
            metadata: Metadata::default(),
            input_dir,
            input_path,
            output_dir: output_dir.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Take metadata and citations from a document
    pub fn with_document(mut self, document: &Document) -> Self {
        self.metadata = document.metadata.clone();
        self.citations = document.citations.clone();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_citations(mut self, citations: Citations) -> Self {
        self.citations = Some(citations);
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Document base name
    pub fn name(&self) -> String {
        self.input_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(FALLBACK_NAME)
            .to_string()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.input_dir.join(path)
        }
    }
}

/// Working directory for the LaTeX sources
#[derive(Debug)]
enum WorkDir {
    Fixed(PathBuf),
    Temp(TempDir),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            WorkDir::Fixed(path) => path,
            WorkDir::Temp(dir) => dir.path(),
        }
    }

    /// Keep the directory on disk and return its path
    fn keep(self) -> PathBuf {
        match self {
            WorkDir::Fixed(path) => path,
            WorkDir::Temp(dir) => dir.keep(),
        }
    }
}

/// Compile a document tree to LaTeX and, if requested, to PDF
///
/// Returns the PDF path, the working directory when `options.pdf` is
/// false, or `None` when typesetting failed.
pub async fn compile(
    root: &Node,
    ctx: &CompileContext,
    options: &LatexOptions,
    typesetter: &Typesetter,
) -> Result<Option<PathBuf>> {
    let name = ctx.name();
    let span = tracing::info_span!("latex", document = %name);
    compile_inner(root, ctx, options, typesetter, name)
        .instrument(span)
        .await
}

async fn compile_inner(
    root: &Node,
    ctx: &CompileContext,
    options: &LatexOptions,
    typesetter: &Typesetter,
    name: String,
) -> Result<Option<PathBuf>> {
    let create_output = async {
        tokio::fs::create_dir_all(&ctx.output_dir)
            .await
            .map_err(|e| LatexError::io(&ctx.output_dir, e))
    };
    let ((), work) = tokio::try_join!(create_output, prepare_work_dir(ctx, options))?;
    tracing::debug!(work_dir = %work.path().display(), "prepared working directory");

    let input_dir =
        absolute_dir(&ctx.input_dir).map_err(|e| LatexError::io(&ctx.input_dir, e))?;

    let places = resolve_places(root);
    let fmt = TexFormatter::new(root, places, options, ctx.citations.as_ref());
    let blocks = extract_blocks(root, &fmt);

    let template_dir = options.template_dir.as_deref().map(|dir| ctx.resolve(dir));
    let resolver = TemplateResolver::with_override(template_dir.as_deref());
    let (id, base_dir) = (options.template.clone(), input_dir.clone());
    let package = tokio::task::spawn_blocking(move || resolver.resolve(&id, &base_dir)).await??;
    let source = package.read_template().await?;
    let template = Template::parse(&source, &options.tags)?;

    let bib_file = bibliography_file(&name, ctx.citations.as_ref());
    let bibliography = match (&bib_file, &ctx.citations) {
        (Some(file), Some(citations)) => {
            Some((file.clone(), bibliography_contents(citations, &fmt)))
        }
        _ => None,
    };

    let data = build_render_data(
        &ctx.metadata,
        &fmt,
        blocks,
        bib_file.clone(),
        Some(&input_dir),
    );
    let rendered = template.render(&data)?;

    let emitted = emit(work.path(), &name, rendered, bibliography, &package).await?;
    tracing::info!(source = %emitted.source.display(), "LaTeX source written");

    if !options.pdf {
        return Ok(Some(work.keep()));
    }

    let job = TypesetJob::new(work.path(), &name)
        .with_bibliography(bib_file.is_some())
        .with_timeout(options.timeout());
    match typesetter.typeset(&job, &ctx.output_dir).await {
        Ok(pdf) => Ok(Some(pdf)),
        Err(e) => {
            let sources = work.keep();
            tracing::error!(
                document = %name,
                error = %e,
                sources = %sources.display(),
                "typesetting failed"
            );
            Ok(None)
        }
    }
}

/// `\graphicspath` is read from the working directory, so the input
/// directory must not stay relative
fn absolute_dir(dir: &Path) -> std::io::Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(dir)
    }
}

async fn prepare_work_dir(ctx: &CompileContext, options: &LatexOptions) -> Result<WorkDir> {
    if let Some(dir) = &options.latex_dir {
        let dir = ctx.resolve(dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LatexError::io(&dir, e))?;
        return Ok(WorkDir::Fixed(dir));
    }
    if !options.pdf {
        return Ok(WorkDir::Fixed(ctx.output_dir.clone()));
    }

    let parent = ctx.temp_dir.clone();
    let dir = tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&parent)?;
        tempfile::Builder::new().prefix("scribe-").tempdir_in(&parent)
    })
    .await?
    .map_err(|e| LatexError::io(&ctx.temp_dir, e))?;
    Ok(WorkDir::Temp(dir))
}
