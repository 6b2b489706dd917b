//! External build tool used by the injector.

use crate::errors::BuildError;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const DEFAULT_GO_BINARY: &str = "go";
pub const DEFAULT_LDFLAGS: &str = "-w -s";

/// A module the injected code needs, with an optional pinned version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub path: String,
    pub version: Option<String>,
}

impl Dependency {
    pub fn latest(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: None,
        }
    }

    pub fn pinned(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: Some(version.into()),
        }
    }
}

/// `path@version`, or just `path` when unpinned (as accepted by `go get`).
impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.path, version),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Operations the injector needs from the build tool. Every operation runs
/// with `directory` (the target project) as working directory.
pub trait BuildTool {
    fn add_dependency(&self, directory: &Path, dependency: &Dependency) -> Result<(), BuildError>;

    /// Compile the project into an executable at `output`.
    fn build(&self, directory: &Path, output: &Path) -> Result<(), BuildError>;

    /// Prune unused requirements from the manifest.
    fn tidy(&self, directory: &Path) -> Result<(), BuildError>;
}

/// The `go` command.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    /// Program name looked up in `PATH`, or a path to the binary
    pub binary: PathBuf,
    /// Passed to `go build -ldflags`; empty disables the flag
    pub ldflags: String,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_GO_BINARY),
            ldflags: DEFAULT_LDFLAGS.to_string(),
        }
    }
}

impl GoToolchain {
    pub fn new(binary: impl Into<PathBuf>, ldflags: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            ldflags: ldflags.into(),
        }
    }

    fn resolve(&self) -> Result<PathBuf, BuildError> {
        which::which(&self.binary).map_err(|source| BuildError::ToolNotFound {
            program: self.binary.display().to_string(),
            source,
        })
    }

    /// Run the tool with stdout passed through. Stderr is echoed as it comes
    /// and kept for the error report.
    fn run(&self, directory: &Path, args: &[&str]) -> Result<(), BuildError> {
        let program = self.resolve()?;
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        log::debug!("Running \"{command}\" in {}", directory.display());

        let mut child = Command::new(&program)
            .args(args)
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        // Compiler output may carry paths that are not valid UTF-8
        let mut stderr = String::new();
        if let Some(pipe) = child.stderr.take() {
            let mut reader = BufReader::new(pipe);
            let mut buffer = Vec::new();
            loop {
                buffer.clear();
                match reader.read_until(b'\n', &mut buffer) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buffer);
                        let line = line.strip_suffix('\n').unwrap_or(&line);
                        eprintln!("{line}");
                        stderr.push_str(line);
                        stderr.push('\n');
                    }
                    Err(e) => {
                        log::warn!("Could not read output of \"{command}\": {e}");
                        break;
                    }
                }
            }
        }

        let status = child.wait().map_err(|source| BuildError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        if !status.success() {
            return Err(BuildError::Failed {
                command,
                status: status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}

impl BuildTool for GoToolchain {
    fn add_dependency(&self, directory: &Path, dependency: &Dependency) -> Result<(), BuildError> {
        let module = dependency.to_string();
        self.run(directory, &["get", &module])
    }

    fn build(&self, directory: &Path, output: &Path) -> Result<(), BuildError> {
        let output = output.to_string_lossy().into_owned();
        let mut args = vec!["build"];
        if !self.ldflags.is_empty() {
            args.extend(["-ldflags", self.ldflags.as_str()]);
        }
        args.extend(["-o", output.as_str()]);
        self.run(directory, &args)
    }

    fn tidy(&self, directory: &Path) -> Result<(), BuildError> {
        self.run(directory, &["mod", "tidy"])
    }
}
