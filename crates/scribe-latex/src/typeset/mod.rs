//! PDF typesetting
//!
//! [`Typesetter`] holds LaTeX compilers in priority order. Compilers that
//! are not installed are skipped; the first installed one runs, and its
//! outcome is final. A failed run is never retried with another compiler.
//!
//! ```text
//! Typesetter
//!   1. latexmk   (handles passes and BibTeX itself)
//!   2. pdflatex  (pdflatex, bibtex, pdflatex, pdflatex)
//! ```

mod compiler;
mod latexmk;
mod pdflatex;
mod process;

use std::path::{Path, PathBuf};

pub use compiler::{TexCompiler, TypesetError, TypesetJob, TypesetResult};
pub use latexmk::LatexmkCompiler;
pub use pdflatex::PdflatexCompiler;

/// Compiler chain producing PDFs
pub struct Typesetter {
    compilers: Vec<Box<dyn TexCompiler>>,
}

impl Default for Typesetter {
    fn default() -> Self {
        Self::new()
    }
}

impl Typesetter {
    /// latexmk, then pdflatex
    pub fn new() -> Self {
        let mut typesetter = Self::empty();
        typesetter.add_compiler(Box::new(LatexmkCompiler::new()));
        typesetter.add_compiler(Box::new(PdflatexCompiler::new()));
        typesetter
    }

    /// A typesetter with no compilers (for testing)
    pub fn empty() -> Self {
        Self {
            compilers: Vec::new(),
        }
    }

    /// Build the chain from configured compiler names
    ///
    /// Unknown names are logged and skipped.
    pub fn from_names(names: &[String]) -> Self {
        let mut typesetter = Self::empty();
        for name in names {
            match name.as_str() {
                "latexmk" => typesetter.add_compiler(Box::new(LatexmkCompiler::new())),
                "pdflatex" => typesetter.add_compiler(Box::new(PdflatexCompiler::new())),
                other => tracing::warn!(compiler = other, "unknown typesetter, ignoring"),
            }
        }
        typesetter
    }

    /// Append a compiler at the lowest priority
    pub fn add_compiler(&mut self, compiler: Box<dyn TexCompiler>) {
        tracing::debug!(compiler = compiler.name(), "registered typesetter");
        self.compilers.push(compiler);
    }

    /// Registered compiler names in priority order
    pub fn compiler_names(&self) -> Vec<&str> {
        self.compilers.iter().map(|c| c.name()).collect()
    }

    /// Run the first available compiler
    ///
    /// Returns the name of the compiler that ran.
    pub async fn compile(&self, job: &TypesetJob) -> TypesetResult<&str> {
        for compiler in &self.compilers {
            if !compiler.is_available() {
                tracing::debug!(compiler = compiler.name(), "typesetter not installed, skipping");
                continue;
            }
            tracing::info!(compiler = compiler.name(), document = %job.name, "typesetting");
            compiler.compile(job).await?;
            return Ok(compiler.name());
        }
        Err(TypesetError::Unavailable(self.compiler_names().join(", ")))
    }

    /// Compile and copy `<name>.pdf` into `out_dir`
    pub async fn typeset(&self, job: &TypesetJob, out_dir: &Path) -> TypesetResult<PathBuf> {
        let compiler = self.compile(job).await?;

        let produced = job.pdf_path();
        if !tokio::fs::try_exists(&produced).await? {
            return Err(TypesetError::MissingOutput(produced));
        }

        let target = out_dir.join(format!("{}.pdf", job.name));
        if target != produced {
            tokio::fs::copy(&produced, &target).await?;
        }
        tracing::info!(compiler, pdf = %target.display(), "PDF written");
        Ok(target)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-ins for external compilers

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    /// What a [`FakeCompiler`] does when run
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Outcome {
        /// Write `<name>.pdf`
        Pdf,
        /// Succeed without writing anything
        Nothing,
        /// Report failure
        Fail,
    }

    pub struct FakeCompiler {
        pub name: &'static str,
        pub available: bool,
        pub outcome: Outcome,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeCompiler {
        pub fn new(name: &'static str, outcome: Outcome) -> Self {
            Self {
                name,
                available: true,
                outcome,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn unavailable(name: &'static str) -> Self {
            Self {
                available: false,
                ..Self::new(name, Outcome::Pdf)
            }
        }
    }

    #[async_trait]
    impl TexCompiler for FakeCompiler {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn compile(&self, job: &TypesetJob) -> TypesetResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Pdf => {
                    tokio::fs::write(job.pdf_path(), b"%PDF-1.5").await?;
                    Ok(())
                }
                Outcome::Nothing => Ok(()),
                Outcome::Fail => Err(TypesetError::Failed {
                    compiler: self.name.to_string(),
                    status: "exit status: 1".to_string(),
                    log_tail: "! LaTeX Error".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tempfile::TempDir;

    use super::testing::{FakeCompiler, Outcome};
    use super::*;

    #[test]
    fn test_default_chain() {
        assert_eq!(Typesetter::new().compiler_names(), vec!["latexmk", "pdflatex"]);
    }

    #[test]
    fn test_from_names_skips_unknown() {
        let names = vec!["pdflatex".to_string(), "tectonic".to_string()];
        assert_eq!(Typesetter::from_names(&names).compiler_names(), vec!["pdflatex"]);
    }

    #[tokio::test]
    async fn test_skips_unavailable_compilers() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut typesetter = Typesetter::empty();
        typesetter.add_compiler(Box::new(FakeCompiler::unavailable("first")));
        typesetter.add_compiler(Box::new(FakeCompiler::new("second", Outcome::Pdf)));

        let pdf = typesetter
            .typeset(&TypesetJob::new(work.path(), "paper"), out.path())
            .await
            .unwrap();
        assert_eq!(pdf, out.path().join("paper.pdf"));
        assert!(pdf.is_file());
    }

    #[tokio::test]
    async fn test_failure_is_final() {
        let work = TempDir::new().unwrap();
        let failing = FakeCompiler::new("first", Outcome::Fail);
        let backup = FakeCompiler::new("second", Outcome::Pdf);
        let backup_calls = backup.calls.clone();
        let mut typesetter = Typesetter::empty();
        typesetter.add_compiler(Box::new(failing));
        typesetter.add_compiler(Box::new(backup));

        let err = typesetter
            .typeset(&TypesetJob::new(work.path(), "paper"), work.path())
            .await
            .unwrap_err();
        assert!(matches!(err, TypesetError::Failed { .. }));
        assert_eq!(backup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_installed() {
        let work = TempDir::new().unwrap();
        let mut typesetter = Typesetter::empty();
        typesetter.add_compiler(Box::new(FakeCompiler::unavailable("latexmk")));
        let err = typesetter
            .compile(&TypesetJob::new(work.path(), "paper"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No typesetter available (tried: latexmk)");
    }

    #[tokio::test]
    async fn test_missing_pdf_is_error() {
        let work = TempDir::new().unwrap();
        let mut typesetter = Typesetter::empty();
        typesetter.add_compiler(Box::new(FakeCompiler::new("quiet", Outcome::Nothing)));
        let err = typesetter
            .typeset(&TypesetJob::new(work.path(), "paper"), work.path())
            .await
            .unwrap_err();
        assert!(matches!(err, TypesetError::MissingOutput(_)));
    }

    #[tokio::test]
    async fn test_same_directory_needs_no_copy() {
        let work = TempDir::new().unwrap();
        let mut typesetter = Typesetter::empty();
        typesetter.add_compiler(Box::new(FakeCompiler::new("fake", Outcome::Pdf)));
        let pdf = typesetter
            .typeset(&TypesetJob::new(work.path(), "paper"), work.path())
            .await
            .unwrap();
        assert_eq!(pdf, work.path().join("paper.pdf"));
    }
}
