//! Typesetter trait and error types

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

/// Errors that can occur while producing a PDF
#[derive(Debug, thiserror::Error)]
pub enum TypesetError {
    /// No configured typesetter is installed
    #[error("No typesetter available (tried: {0})")]
    Unavailable(String),

    /// The typesetter ran and reported failure
    #[error("{compiler} failed ({status}):\n{log_tail}")]
    Failed {
        compiler: String,
        status: String,
        /// Last lines of the LaTeX log or process output
        log_tail: String,
    },

    /// The typesetter could not be started
    #[error("Failed to start {compiler}: {source}")]
    Spawn {
        compiler: String,
        #[source]
        source: std::io::Error,
    },

    /// The typesetter was killed after exceeding its time limit
    #[error("{compiler} timed out after {seconds}s")]
    Timeout { compiler: String, seconds: u64 },

    /// The typesetter succeeded but produced no PDF
    #[error("Expected output missing: {}", .0.display())]
    MissingOutput(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for typesetting operations
pub type TypesetResult<T> = std::result::Result<T, TypesetError>;

/// One typesetting run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetJob {
    /// Directory holding `<name>.tex`; exclusive to this run
    pub work_dir: PathBuf,
    /// Document base name
    pub name: String,
    /// Whether a bibliography pass is needed
    pub bibliography: bool,
    /// Limit for each external process
    pub timeout: Duration,
}

impl TypesetJob {
    pub fn new(work_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            name: name.into(),
            bibliography: false,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_bibliography(mut self, bibliography: bool) -> Self {
        self.bibliography = bibliography;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<name>.tex`
    pub fn source_file(&self) -> String {
        format!("{}.tex", self.name)
    }

    /// Where the typesetter leaves the PDF
    pub fn pdf_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}.pdf", self.name))
    }

    /// Where the typesetter leaves its log
    pub fn log_path(&self) -> PathBuf {
        self.work_dir.join(format!("{}.log", self.name))
    }
}

/// A LaTeX-to-PDF compiler
///
/// Implementations must leave `<name>.pdf` in the job's working directory
/// on success.
#[async_trait]
pub trait TexCompiler: Send + Sync {
    /// Short identifier, as used in the `compilers` option
    fn name(&self) -> &str;

    /// Whether the compiler can run on this machine
    fn is_available(&self) -> bool;

    /// Run the compiler to completion
    async fn compile(&self, job: &TypesetJob) -> TypesetResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_paths() {
        let job = TypesetJob::new("/tmp/work", "paper").with_bibliography(true);
        assert_eq!(job.source_file(), "paper.tex");
        assert_eq!(job.pdf_path(), PathBuf::from("/tmp/work/paper.pdf"));
        assert_eq!(job.log_path(), PathBuf::from("/tmp/work/paper.log"));
        assert!(job.bibliography);
    }

    #[test]
    fn test_timeout_message() {
        let err = TypesetError::Timeout {
            compiler: "latexmk".to_string(),
            seconds: 5,
        };
        assert_eq!(err.to_string(), "latexmk timed out after 5s");
    }
}
