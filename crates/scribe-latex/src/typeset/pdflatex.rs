//! pdflatex typesetter
//!
//! Runs a first pass, BibTeX when the document cites anything, then two
//! more passes so citations and cross-references settle.

use async_trait::async_trait;

use super::compiler::{TexCompiler, TypesetJob, TypesetResult};
use super::process::run;

/// Typesets with plain `pdflatex` (and `bibtex`)
#[derive(Debug, Clone)]
pub struct PdflatexCompiler {
    pdflatex: String,
    bibtex: String,
}

impl Default for PdflatexCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdflatexCompiler {
    pub fn new() -> Self {
        Self {
            pdflatex: "pdflatex".to_string(),
            bibtex: "bibtex".to_string(),
        }
    }

    /// Use specific executables
    pub fn with_programs(pdflatex: impl Into<String>, bibtex: impl Into<String>) -> Self {
        Self {
            pdflatex: pdflatex.into(),
            bibtex: bibtex.into(),
        }
    }

    async fn pass(&self, job: &TypesetJob) -> TypesetResult<()> {
        let source = job.source_file();
        run(
            &self.pdflatex,
            &["-interaction=nonstopmode", "-halt-on-error", &source],
            job,
        )
        .await
    }
}

#[async_trait]
impl TexCompiler for PdflatexCompiler {
    fn name(&self) -> &str {
        "pdflatex"
    }

    fn is_available(&self) -> bool {
        which::which(&self.pdflatex).is_ok()
    }

    async fn compile(&self, job: &TypesetJob) -> TypesetResult<()> {
        self.pass(job).await?;
        if job.bibliography {
            run(&self.bibtex, &[job.name.as_str()], job).await?;
        }
        self.pass(job).await?;
        self.pass(job).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Stand-in for pdflatex/bibtex that appends its name to `passes`
    fn script(dir: &TempDir, name: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join(name);
        std::fs::write(
            &path,
            format!("#!/bin/sh\necho {name} >> passes\ntouch doc.pdf\n"),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_pass_order_with_bibliography() {
        let dir = TempDir::new().unwrap();
        let compiler =
            PdflatexCompiler::with_programs(script(&dir, "fakelatex"), script(&dir, "fakebib"));
        assert!(compiler.is_available());

        let job = TypesetJob::new(dir.path(), "doc").with_bibliography(true);
        compiler.compile(&job).await.unwrap();
        let passes = std::fs::read_to_string(dir.path().join("passes")).unwrap();
        assert_eq!(passes, "fakelatex\nfakebib\nfakelatex\nfakelatex\n");
    }

    #[tokio::test]
    async fn test_no_bibtex_without_bibliography() {
        let dir = TempDir::new().unwrap();
        let compiler =
            PdflatexCompiler::with_programs(script(&dir, "fakelatex"), script(&dir, "fakebib"));
        let job = TypesetJob::new(dir.path(), "doc");
        compiler.compile(&job).await.unwrap();
        let passes = std::fs::read_to_string(dir.path().join("passes")).unwrap();
        assert!(!passes.contains("fakebib"));
        assert_eq!(passes.lines().count(), 3);
    }
}
