//! Module locator: finds a project's `go.mod`, parses it and extracts the
//! Goyave framework dependency.

mod parser;

pub use parser::parse_str;

use crate::errors::ManifestError;
use semver::Version;
use std::path::{Path, PathBuf};

pub const GO_MOD_FILENAME: &str = "go.mod";

/// Import path prefixes under which the framework has been published.
pub const GOYAVE_IMPORT_PATHS: [&str; 2] = ["goyave.dev/goyave", "github.com/System-Glitch/goyave"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub module: ModuleVersion,
    /// Marked with a `// indirect` comment
    pub indirect: bool,
}

/// Parsed go.mod manifest.
#[derive(Debug, Clone, Default)]
pub struct ModFile {
    /// Location the manifest was read from
    pub path: PathBuf,
    pub module: Option<String>,
    pub go_version: Option<String>,
    pub requires: Vec<Require>,
}

impl ModFile {
    /// The module path, or an error if the manifest has no `module` directive.
    pub fn module_path(&self) -> Result<&str, ManifestError> {
        self.module
            .as_deref()
            .ok_or_else(|| ManifestError::MissingModule {
                path: self.path.clone(),
            })
    }
}

/// Read `go.mod` from `directory`, or from the current directory when
/// `directory` is empty.
pub fn parse(directory: &Path) -> Result<ModFile, ManifestError> {
    let path = if directory.as_os_str().is_empty() {
        PathBuf::from(GO_MOD_FILENAME)
    } else {
        directory.join(GO_MOD_FILENAME)
    };

    let contents = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;

    log::debug!("Parsing {}", path.display());
    parse_str(&path, &contents)
}

/// First requirement whose path equals or starts with one of the known
/// framework import paths.
pub fn find_goyave_require(mod_file: &ModFile) -> Option<&Require> {
    mod_file.requires.iter().find(|r| {
        GOYAVE_IMPORT_PATHS
            .iter()
            .any(|prefix| r.module.path.starts_with(prefix))
    })
}

/// Requirement with exactly the given module path (like "golang.org/x/text").
pub fn find_dependency<'a>(mod_file: &'a ModFile, dependency_path: &str) -> Option<&'a Require> {
    mod_file
        .requires
        .iter()
        .find(|r| r.module.path == dependency_path)
}

/// Nearest directory containing a `go.mod`, starting from the working
/// directory and walking up to the filesystem root.
pub fn find_parent_module() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_parent_module_from(&cwd)
}

/// Same as [`find_parent_module`] with an explicit starting directory.
pub fn find_parent_module_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(GO_MOD_FILENAME).is_file())
        .map(Path::to_path_buf)
}

/// Last segment of a module path: "github.com/acme/api" gives "api".
pub fn module_base_name(module_path: &str) -> &str {
    module_path.rsplit('/').next().unwrap_or(module_path)
}

/// Parse a Go module version ("v3.9.1", "v4.0.0-rc1") as a semantic version.
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    Version::parse(version.strip_prefix('v').unwrap_or(version))
}

/// The framework dependency of a project: import path and parsed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkBinding {
    pub import_path: String,
    pub version: Version,
    /// Version exactly as written in go.mod
    pub raw_version: String,
}

impl FrameworkBinding {
    pub fn from_manifest(mod_file: &ModFile) -> Result<Self, ManifestError> {
        let require = find_goyave_require(mod_file).ok_or(ManifestError::NotAGoyaveProject)?;
        let version =
            parse_version(&require.module.version).map_err(|source| ManifestError::InvalidVersion {
                version: require.module.version.clone(),
                source,
            })?;

        Ok(Self {
            import_path: require.module.path.clone(),
            version,
            raw_version: require.module.version.clone(),
        })
    }
}
