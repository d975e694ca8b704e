//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use scribe_ast::Document;
use scribe_latex::config::SETTINGS_FILE;
use scribe_latex::{compile, CompileContext, LatexOptions, Settings, TemplateResolver, Typesetter};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(author, version, about = "Document trees to LaTeX and PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document to LaTeX and PDF
    Latex(LatexArgs),

    /// List the built-in templates
    Templates {
        /// Directory to list instead of the built-in one
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },
}

/// Arguments of `scribe latex`
#[derive(Debug, Clone, Args)]
pub struct LatexArgs {
    /// Input document (JSON: root, metadata, citations)
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Template identifier (overrides the config file)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Stop after writing the LaTeX sources
    #[arg(long)]
    pub no_pdf: bool,

    /// Directory for the LaTeX sources
    #[arg(long)]
    pub latex_dir: Option<PathBuf>,

    /// Configuration file (default: scribe.toml next to the input)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments, installs logging and dispatches to the command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Latex(args) => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(latex_command(&args)).map(|_| ())
        }
        Commands::Templates { template_dir } => templates_command(template_dir.as_deref()),
    }
}

/// Log to stderr; `RUST_LOG` refines the default INFO level
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Read a JSON document
pub fn load_document(input: &Path) -> Result<Document> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document JSON: {}", input.display()))
}

/// Settings file values with command-line overrides applied
pub fn load_options(args: &LatexArgs) -> Result<LatexOptions> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => args
            .input
            .parent()
            .unwrap_or(Path::new("."))
            .join(SETTINGS_FILE),
    };
    if args.config.is_some() && !config_path.exists() {
        anyhow::bail!("Config file not found: {}", config_path.display());
    }
    let mut options = Settings::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?
        .latex;

    if let Some(template) = &args.template {
        options.template = template.clone();
    }
    if args.no_pdf {
        options.pdf = false;
    }
    if let Some(dir) = &args.latex_dir {
        options.latex_dir = Some(dir.clone());
    }
    Ok(options)
}

/// Compile a document
///
/// Returns the PDF path, the sources directory with `--no-pdf`, or `None`
/// when typesetting failed (which is reported but not an error).
pub async fn latex_command(args: &LatexArgs) -> Result<Option<PathBuf>> {
    println!("scribe v{}", env!("CARGO_PKG_VERSION"));
    println!("Compiling: {}", args.input.display());

    let document = load_document(&args.input)?;
    let options = load_options(args)?;
    println!("  Template: {}", options.template);

    let ctx = CompileContext::new(&args.input, &args.output).with_document(&document);
    let typesetter = Typesetter::from_names(&options.compilers);
    let result = compile(&document.root, &ctx, &options, &typesetter)
        .await
        .with_context(|| format!("Failed to compile {}", args.input.display()))?;

    match (&result, options.pdf) {
        (Some(dir), false) => println!("  LaTeX sources: {}", dir.display()),
        (Some(pdf), true) => println!("  PDF: {}", pdf.display()),
        (None, _) => eprintln!(
            "warning: no PDF produced for {}; LaTeX sources were kept (see log above)",
            args.input.display()
        ),
    }
    Ok(result)
}

/// Print the available template identifiers
pub fn templates_command(template_dir: Option<&Path>) -> Result<()> {
    let resolver = TemplateResolver::with_override(template_dir);
    let ids = resolver.list().with_context(|| {
        format!(
            "Failed to list templates in {}",
            resolver.builtin_dir().display()
        )
    })?;
    if ids.is_empty() {
        println!("No templates in {}", resolver.builtin_dir().display());
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args.iter().copied()).unwrap().command
    }

    #[test]
    fn test_latex_defaults() {
        let Commands::Latex(args) = parse(&["scribe", "latex", "paper.json"]) else {
            panic!("expected latex command");
        };
        assert_eq!(args.input, PathBuf::from("paper.json"));
        assert_eq!(args.output, PathBuf::from("output"));
        assert!(!args.no_pdf);
        assert!(args.template.is_none());
    }

    #[test]
    fn test_latex_flags() {
        let Commands::Latex(args) = parse(&[
            "scribe",
            "latex",
            "paper.json",
            "-o",
            "out",
            "-t",
            "ieee",
            "--no-pdf",
            "--latex-dir",
            "tex",
        ]) else {
            panic!("expected latex command");
        };
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.template.as_deref(), Some("ieee"));
        assert!(args.no_pdf);
        assert_eq!(args.latex_dir, Some(PathBuf::from("tex")));
    }

    #[test]
    fn test_templates_command() {
        assert!(matches!(
            parse(&["scribe", "templates"]),
            Commands::Templates { template_dir: None }
        ));
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(Cli::try_parse_from(["scribe", "latex"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[latex]\ntemplate = \"ieee\"\nlatexDir = \"from-config\"\n",
        )
        .unwrap();
        let args = LatexArgs {
            input: dir.path().join("paper.json"),
            output: PathBuf::from("out"),
            template: None,
            no_pdf: true,
            latex_dir: Some(PathBuf::from("from-flag")),
            config: None,
        };
        let options = load_options(&args).unwrap();
        assert_eq!(options.template, "ieee");
        assert!(!options.pdf);
        assert_eq!(options.latex_dir, Some(PathBuf::from("from-flag")));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let args = LatexArgs {
            input: PathBuf::from("paper.json"),
            output: PathBuf::from("out"),
            template: None,
            no_pdf: false,
            latex_dir: None,
            config: Some(PathBuf::from("/nonexistent/scribe.toml")),
        };
        assert!(load_options(&args).is_err());
    }
}
