//! scribe CLI - Command-line interface library
//!
//! # Binary Usage
//!
//! ```bash
//! # Compile a parsed document to PDF
//! scribe latex paper.json --output out/
//!
//! # Write only the LaTeX sources, with a specific template
//! scribe latex paper.json --no-pdf --template article
//!
//! # List built-in templates
//! scribe templates
//! ```
//!
//! Set `RUST_LOG=debug` for detailed pipeline logs.

pub mod app;

pub use app::{latex_command, load_document, load_options, run_cli, templates_command, LatexArgs};
