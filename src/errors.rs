//! Error types for gyv operations.
//!
//! Every stage of the code injection pipeline owns a small error enum. They are
//! gathered under [`GyvError`], which is what the use-case adapters return to
//! the command layer.
//!
//! # Categories
//!
//! - **Configuration**: not a Goyave project, `go.mod` missing or unreadable,
//!   framework version below the supported floor
//! - **Resolution**: route registration call not found, unsupported argument
//!   shape, unknown seeder name
//! - **Build**: the Go toolchain failed or could not be started
//! - **Symbol**: the built artifact does not expose the expected function, or
//!   the function itself failed
//!
//! Cleanup failures are never represented here: they are logged as warnings
//! and must not mask the primary result.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or reading a `go.mod` manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No manifest in the current directory or any of its ancestors
    #[error("No go.mod found")]
    NoGoMod,

    /// The manifest file could not be read
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid go.mod syntax
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The manifest has no `module` directive
    #[error("{} doesn't declare a module path", path.display())]
    MissingModule { path: PathBuf },

    /// The project does not require the Goyave framework
    #[error("Current project doesn't import Goyave")]
    NotAGoyaveProject,

    /// The declared framework version is not a semantic version
    #[error("Invalid Goyave version {version:?}: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// Errors raised while listing or parsing Go source files.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Could not read directory {}: {message}", path.display())]
    ReadDir { path: PathBuf, message: String },

    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Syntax error in {}:{line}:{column}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Failed to load the Go grammar: {0}")]
    Language(String),
}

/// Errors raised while resolving references inside the user's sources.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// No `goyave.Start(<arg>)` call in the scanned directory
    #[error("Could not find any valid call of \"goyave.Start()\" in {}", directory.display())]
    NoStartCall { directory: PathBuf },

    /// A `goyave.Start()` call was found but its argument cannot be referenced
    /// from another compilation unit
    #[error(
        "Unsupported route registrer \"{expression}\" in {}:{line}: expected an identifier, \
         a qualified identifier or a call without arguments",
        file.display()
    )]
    UnsupportedArgument {
        file: PathBuf,
        line: usize,
        expression: String,
    },

    /// The seeder directory exports no candidate function
    #[error("No seeder function found in {}", directory.display())]
    NoSeederFunction { directory: PathBuf },

    /// A requested seeder is not an exported zero-argument function
    #[error("Seeder function {name:?} does not exist (available: {})", available.join(", "))]
    UnknownSeeder {
        name: String,
        available: Vec<String>,
    },
}

/// Errors raised while selecting or rendering stubs.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("Stub {0:?} not found")]
    NotFound(String),

    #[error("Stub {file:?} is not named after a valid version: {source}")]
    InvalidStubVersion {
        file: String,
        #[source]
        source: semver::Error,
    },

    #[error("Could not parse stub {name:?}: {source}")]
    Parse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Could not render stub {name:?}: {source}")]
    Exec {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Errors raised by the external build tool.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{program} not found: {source}")]
    ToolNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited unsuccessfully; `stderr` holds its diagnostics
    #[error("\"{command}\" failed ({status})\n{stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Errors raised while loading the built artifact or calling one of its symbols.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("Could not load {}: {message}", artifact.display())]
    Load { artifact: PathBuf, message: String },

    #[error("Symbol {0:?} not found in the injected code")]
    NotFound(String),

    #[error("Symbol {name:?} has type {found}, expected {expected}")]
    SignatureMismatch {
        name: String,
        expected: &'static str,
        found: String,
    },

    #[error("Could not run {symbol}: {message}")]
    Invocation { symbol: String, message: String },

    /// The injected function ran and returned an error
    #[error("{message}")]
    Returned { symbol: String, message: String },
}

/// Umbrella error returned by the injector and use-case adapters.
#[derive(Debug, Error)]
pub enum GyvError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Stub(#[from] StubError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("Unsupported Goyave version {found}. Minimum version: {minimum}")]
    UnsupportedGoyaveVersion { found: String, minimum: String },

    /// Code can only be injected in a project whose root package is `main`
    #[error("Package at {} is {found:?}, expected \"main\"", directory.display())]
    NotMainPackage { directory: PathBuf, found: String },

    #[error("Could not write temporary file {}: {source}", path.display())]
    TemporaryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GyvError {
    /// Taxonomy class of this error, used for reporting.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Manifest(_)
            | Self::UnsupportedGoyaveVersion { .. }
            | Self::NotMainPackage { .. } => "configuration",
            Self::Scan(_) | Self::Resolve(_) => "resolution",
            Self::Stub(_) => "template",
            Self::Build(_) | Self::TemporaryFile { .. } => "build",
            Self::Symbol(_) => "symbol",
        }
    }
}

/// Result type alias using [`GyvError`]
pub type Result<T> = std::result::Result<T, GyvError>;
