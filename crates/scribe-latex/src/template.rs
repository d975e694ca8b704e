//! Template package resolution
//!
//! A template package is a directory holding a `template.toml` manifest,
//! the primary template file it names, and any auxiliary files (class
//! files, logos) to copy next to the generated source:
//!
//! ```toml
//! template = "template.tex"
//! files = ["acmart.cls", "images/logo.png"]
//! ```
//!
//! Lookup tries `<base_dir>/<id>` first and falls back to the built-in
//! template directory. Only a failure in the built-in tier is an error.
//! The `article` package is also compiled into the crate, so it resolves
//! even when the built-in directory is not on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LatexError, Result};

/// Manifest file name inside a template package
pub const MANIFEST_FILE: &str = "template.toml";

/// Packages compiled into the crate: `(id, manifest, template source)`
const EMBEDDED: &[(&str, &str, &str)] = &[(
    "article",
    include_str!("../templates/article/template.toml"),
    include_str!("../templates/article/template.tex"),
)];

/// Contents of `template.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Primary template file, relative to the package directory
    pub template: String,
    /// Auxiliary files copied verbatim, relative to the package directory
    #[serde(default)]
    pub files: Vec<String>,
}

/// A resolved template package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePackage {
    /// Package directory
    pub dir: PathBuf,
    /// Parsed manifest
    pub manifest: TemplateManifest,
    /// Template source when the package is compiled in
    pub embedded: Option<&'static str>,
}

impl TemplatePackage {
    /// Load a package from its directory
    ///
    /// Fails when the manifest is missing or unparsable, or when the
    /// declared template file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| LatexError::io(&manifest_path, e))?;
        let manifest: TemplateManifest =
            toml::from_str(&content).map_err(|source| LatexError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;

        let package = Self {
            dir: dir.to_path_buf(),
            manifest,
            embedded: None,
        };
        let template_path = package.template_path();
        if !template_path.is_file() {
            return Err(LatexError::io(
                template_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "template file missing"),
            ));
        }
        Ok(package)
    }

    /// Compiled-in package `id`, if there is one
    pub fn embedded(id: &str, dir: &Path) -> Option<Result<Self>> {
        let &(_, manifest, template) = EMBEDDED.iter().find(|(name, _, _)| *name == id)?;
        let manifest = toml::from_str(manifest).map_err(|source| LatexError::Manifest {
            path: dir.join(MANIFEST_FILE),
            source,
        });
        Some(manifest.map(|manifest| Self {
            dir: dir.to_path_buf(),
            manifest,
            embedded: Some(template),
        }))
    }

    /// Path of the primary template file
    pub fn template_path(&self) -> PathBuf {
        self.dir.join(&self.manifest.template)
    }

    /// Source of the primary template file
    pub async fn read_template(&self) -> Result<String> {
        if let Some(source) = self.embedded {
            return Ok(source.to_string());
        }
        let path = self.template_path();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LatexError::io(&path, e))
    }

    /// Auxiliary files as `(source path, flattened file name)`
    ///
    /// Entries without a file name component (such as `..`) are skipped.
    pub fn aux_files(&self) -> Vec<(PathBuf, String)> {
        self.manifest
            .files
            .iter()
            .filter_map(|file| {
                let source = self.dir.join(file);
                match source.file_name().and_then(|name| name.to_str()) {
                    Some(name) => Some((source.clone(), name.to_string())),
                    None => {
                        tracing::warn!(file = %file, "skipping auxiliary file without a name");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Two-tier template lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
    builtin_dir: PathBuf,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(builtin_template_dir())
    }
}

impl TemplateResolver {
    /// Resolver falling back to `builtin_dir`
    pub fn new(builtin_dir: impl Into<PathBuf>) -> Self {
        Self {
            builtin_dir: builtin_dir.into(),
        }
    }

    /// Resolver honouring a `templateDir` override
    pub fn with_override(template_dir: Option<&Path>) -> Self {
        match template_dir {
            Some(dir) => Self::new(dir),
            None => Self::default(),
        }
    }

    /// Built-in template directory
    pub fn builtin_dir(&self) -> &Path {
        &self.builtin_dir
    }

    /// Resolve `id` relative to `base_dir`, then in the built-in directory
    pub fn resolve(&self, id: &str, base_dir: &Path) -> Result<TemplatePackage> {
        let local = base_dir.join(id);
        match TemplatePackage::load(&local) {
            Ok(package) => {
                tracing::debug!(template = id, dir = %local.display(), "using local template");
                return Ok(package);
            }
            Err(e) => {
                tracing::debug!(template = id, error = %e, "local template unavailable, trying built-in");
            }
        }

        let builtin = self.builtin_dir.join(id);
        match TemplatePackage::load(&builtin) {
            Ok(package) => {
                tracing::debug!(template = id, dir = %builtin.display(), "using built-in template");
                Ok(package)
            }
            Err(LatexError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                if let Some(package) = TemplatePackage::embedded(id, &builtin) {
                    tracing::debug!(template = id, "using compiled-in template");
                    return package;
                }
                Err(LatexError::TemplateNotFound {
                    id: id.to_string(),
                    tried: vec![local, builtin],
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Identifiers of the built-in and compiled-in templates, sorted
    ///
    /// A missing built-in directory lists only the compiled-in ones.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = EMBEDDED.iter().map(|(id, _, _)| id.to_string()).collect();
        let entries = match std::fs::read_dir(&self.builtin_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(LatexError::io(&self.builtin_dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| LatexError::io(&self.builtin_dir, e))?;
            let path = entry.path();
            if !path.join(MANIFEST_FILE).is_file() {
                continue;
            }
            if let Some(id) = path.file_name().and_then(|name| name.to_str()) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

/// Template directory shipped with this crate
pub fn builtin_template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}
