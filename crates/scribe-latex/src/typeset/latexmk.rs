//! latexmk typesetter
//!
//! latexmk works out the number of passes itself, including the BibTeX
//! run when the document has a bibliography.

use async_trait::async_trait;

use super::compiler::{TexCompiler, TypesetJob, TypesetResult};
use super::process::run;

/// Typesets with `latexmk -pdf`
#[derive(Debug, Clone)]
pub struct LatexmkCompiler {
    program: String,
}

impl Default for LatexmkCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl LatexmkCompiler {
    pub fn new() -> Self {
        Self::with_program("latexmk")
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(job: &TypesetJob) -> Vec<String> {
        let mut args = vec![
            "-pdf".to_string(),
            "-interaction=nonstopmode".to_string(),
            "-halt-on-error".to_string(),
        ];
        if job.bibliography {
            args.push("-bibtex".to_string());
        }
        args.push(job.source_file());
        args
    }
}

#[async_trait]
impl TexCompiler for LatexmkCompiler {
    fn name(&self) -> &str {
        "latexmk"
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    async fn compile(&self, job: &TypesetJob) -> TypesetResult<()> {
        let args = Self::args(job);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run(&self.program, &args, job).await
    }
}
