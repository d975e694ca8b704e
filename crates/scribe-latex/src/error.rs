//! Error types for LaTeX generation

use std::path::PathBuf;

use thiserror::Error;

use crate::typeset::TypesetError;

/// Result type for LaTeX operations
pub type Result<T> = std::result::Result<T, LatexError>;

/// Errors that can occur while producing LaTeX sources
///
/// Only failures that prevent writing *any* artifact surface here.
/// Typesetting failures are absorbed by [`crate::compile`] and logged.
#[derive(Error, Debug)]
pub enum LatexError {
    /// Template package could not be found in any lookup tier
    #[error("Template not found: {id} (looked in {})", display_paths(.tried))]
    TemplateNotFound {
        /// Requested template identifier
        id: String,
        /// Directories that were tried, in order
        tried: Vec<PathBuf>,
    },

    /// Template manifest exists but cannot be parsed
    #[error("Invalid template manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Template source is malformed (unclosed or mismatched blocks)
    #[error("Template syntax error: {0}")]
    TemplateSyntax(String),

    /// Template failed while rendering
    #[error("Template rendering failed: {0}")]
    Render(#[from] minijinja::Error),

    /// Settings file cannot be parsed
    #[error("Invalid configuration {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// IO error on a specific path
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Typesetting failed (only returned by the low-level driver)
    #[error(transparent)]
    Typeset(#[from] TypesetError),

    /// A concurrent task panicked or was cancelled
    #[error("Task failed: {0}")]
    Join(String),
}

impl LatexError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LatexError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for LatexError {
    fn from(err: tokio::task::JoinError) -> Self {
        LatexError::Join(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
