//! Loading and invoking a compiled injection artifact.
//!
//! The artifact is an ordinary executable built from the target project. The
//! injected runtime hooks its `init()`: when [`SYMBOL_ENV`] is set the named
//! symbol is called and a JSON envelope is written to the file named by
//! [`RESULT_ENV`], then the process exits before the project's own `main`.
//!
//! "Loading" runs the artifact once with [`LIST_SYMBOL`] to obtain the symbol
//! table (name to Go dynamic type). The artifact file belongs to the
//! [`Plugin`] and is deleted when the plugin is dropped.

use super::unique_suffix;
use crate::errors::SymbolError;
use base64::Engine;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const SYMBOL_ENV: &str = "GYV_INJECT_SYMBOL";
pub const RESULT_ENV: &str = "GYV_INJECT_RESULT";

/// Reserved symbol answering with the symbol table.
pub const LIST_SYMBOL: &str = "__gyv_symbols__";

/// Result written by the injected runtime.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    /// Base64 encoded bytes returned by the symbol
    data: Option<String>,
    error: Option<String>,
    symbols: Option<BTreeMap<String, String>>,
}

/// A loaded injection artifact.
#[derive(Debug)]
pub struct Plugin {
    artifact: PathBuf,
    directory: PathBuf,
    symbols: BTreeMap<String, String>,
}

impl Plugin {
    /// Load the artifact at `artifact`, to be run from `directory`. The
    /// artifact is removed if loading fails.
    pub fn open(artifact: PathBuf, directory: &Path) -> Result<Self, SymbolError> {
        let mut plugin = Self {
            artifact,
            directory: directory.to_path_buf(),
            symbols: BTreeMap::new(),
        };

        let envelope = plugin.execute(LIST_SYMBOL).map_err(|e| SymbolError::Load {
            artifact: plugin.artifact.clone(),
            message: e.to_string(),
        })?;
        if let Some(message) = envelope.error {
            return Err(SymbolError::Load {
                artifact: plugin.artifact.clone(),
                message,
            });
        }

        plugin.symbols = envelope.symbols.unwrap_or_default();
        log::debug!(
            "Loaded {} with symbols {:?}",
            plugin.artifact.display(),
            plugin.symbols
        );
        Ok(plugin)
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Exported symbols and their Go types.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &str)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Go type of the exported symbol `name`.
    pub fn lookup(&self, name: &str) -> Result<&str, SymbolError> {
        self.symbols
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SymbolError::NotFound(name.to_string()))
    }

    /// Bind the symbol `name`, checking it has the signature `S`.
    pub fn into_fn<S: Signature>(self, name: &str) -> Result<InjectedFn<S>, SymbolError> {
        let found = self.lookup(name)?;
        if found != S::GO_TYPE {
            return Err(SymbolError::SignatureMismatch {
                name: name.to_string(),
                expected: S::GO_TYPE,
                found: found.to_string(),
            });
        }

        Ok(InjectedFn {
            plugin: self,
            name: name.to_string(),
            signature: PhantomData,
        })
    }

    fn execute(&self, symbol: &str) -> Result<Envelope, SymbolError> {
        let invocation = |message: String| SymbolError::Invocation {
            symbol: symbol.to_string(),
            message,
        };

        let result_path =
            std::env::temp_dir().join(format!("gyv-inject-result-{}.json", unique_suffix()));
        log::debug!("Invoking {symbol} from {}", self.artifact.display());

        let status = Command::new(&self.artifact)
            .current_dir(&self.directory)
            .env(SYMBOL_ENV, symbol)
            .env(RESULT_ENV, &result_path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| invocation(e.to_string()))?;

        let raw = match std::fs::read_to_string(&result_path) {
            Ok(raw) => raw,
            Err(_) => {
                return Err(invocation(format!("exited ({status}) without reporting a result")));
            }
        };
        if let Err(e) = std::fs::remove_file(&result_path) {
            log::warn!("Could not delete {}: {e}", result_path.display());
        }

        serde_json::from_str(&raw).map_err(|e| invocation(format!("malformed result: {e}")))
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.artifact) {
            Ok(()) => log::debug!("Deleted {}", self.artifact.display()),
            Err(e) => log::warn!(
                "Could not delete compiled artifact at {}: {e}",
                self.artifact.display()
            ),
        }
    }
}

/// Go function type of an injected symbol and how to decode its result.
pub trait Signature {
    /// Type as printed by Go's `%T` verb
    const GO_TYPE: &'static str;
    type Output;

    fn decode(data: Option<Vec<u8>>) -> Self::Output;
}

/// `func() error`
#[derive(Debug)]
pub struct ErrorReturning;

impl Signature for ErrorReturning {
    const GO_TYPE: &'static str = "func() error";
    type Output = ();

    fn decode(_data: Option<Vec<u8>>) {}
}

/// `func() ([]byte, error)`
#[derive(Debug)]
pub struct BytesReturning;

impl Signature for BytesReturning {
    const GO_TYPE: &'static str = "func() ([]uint8, error)";
    type Output = Vec<u8>;

    fn decode(data: Option<Vec<u8>>) -> Vec<u8> {
        data.unwrap_or_default()
    }
}

/// A symbol bound to its artifact. The artifact lives as long as this value.
#[derive(Debug)]
pub struct InjectedFn<S> {
    plugin: Plugin,
    name: String,
    signature: PhantomData<S>,
}

pub type ErrorFn = InjectedFn<ErrorReturning>;
pub type BytesFn = InjectedFn<BytesReturning>;

impl<S: Signature> InjectedFn<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    /// Run the symbol in the project directory. An error returned by the Go
    /// function, or a panic, is reported as [`SymbolError::Returned`].
    pub fn call(&self) -> Result<S::Output, SymbolError> {
        let envelope = self.plugin.execute(&self.name)?;
        if let Some(message) = envelope.error {
            return Err(SymbolError::Returned {
                symbol: self.name.clone(),
                message,
            });
        }

        let data = envelope
            .data
            .map(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded))
            .transpose()
            .map_err(|e| SymbolError::Invocation {
                symbol: self.name.clone(),
                message: format!("invalid data: {e}"),
            })?;
        Ok(S::decode(data))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const ARTIFACT: &str = r#"#!/bin/sh
case "$GYV_INJECT_SYMBOL" in
  __gyv_symbols__)
    printf '{"symbols":{"Migrate":"func() error","GenerateOpenAPI":"func() ([]uint8, error)","Fail":"func() error"}}' > "$GYV_INJECT_RESULT" ;;
  Migrate)
    pwd > migrated
    printf '{}' > "$GYV_INJECT_RESULT" ;;
  GenerateOpenAPI)
    printf '{"data":"eyJvcGVuYXBpIjoiMy4wLjAifQ=="}' > "$GYV_INJECT_RESULT" ;;
  Fail)
    printf '{"error":"database unreachable"}' > "$GYV_INJECT_RESULT" ;;
esac
"#;

    fn artifact(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("gyv-code-injection-test");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_open_lists_symbols() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let plugin = Plugin::open(artifact(tmp.path(), ARTIFACT), project.path()).unwrap();

        assert_eq!(plugin.lookup("Migrate").unwrap(), "func() error");
        assert!(matches!(
            plugin.lookup("Seed"),
            Err(SymbolError::NotFound(name)) if name == "Seed"
        ));
    }

    #[test]
    fn test_call_runs_in_project_directory() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let plugin = Plugin::open(artifact(tmp.path(), ARTIFACT), project.path()).unwrap();

        let migrate: ErrorFn = plugin.into_fn("Migrate").unwrap();
        migrate.call().unwrap();

        let marker = fs::read_to_string(project.path().join("migrated")).unwrap();
        assert_eq!(
            Path::new(marker.trim()).canonicalize().unwrap(),
            project.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_call_decodes_bytes() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let plugin = Plugin::open(artifact(tmp.path(), ARTIFACT), project.path()).unwrap();

        let generate: BytesFn = plugin.into_fn("GenerateOpenAPI").unwrap();
        assert_eq!(generate.call().unwrap(), br#"{"openapi":"3.0.0"}"#.to_vec());
    }

    #[test]
    fn test_call_reports_returned_error() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let plugin = Plugin::open(artifact(tmp.path(), ARTIFACT), project.path()).unwrap();

        let fail: ErrorFn = plugin.into_fn("Fail").unwrap();
        match fail.call() {
            Err(SymbolError::Returned { symbol, message }) => {
                assert_eq!(symbol, "Fail");
                assert_eq!(message, "database unreachable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_signature_mismatch() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let plugin = Plugin::open(artifact(tmp.path(), ARTIFACT), project.path()).unwrap();

        let err = plugin.into_fn::<BytesReturning>("Migrate").unwrap_err();
        assert!(matches!(
            err,
            SymbolError::SignatureMismatch { expected: "func() ([]uint8, error)", .. }
        ));
    }

    #[test]
    fn test_drop_removes_artifact() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let path = artifact(tmp.path(), ARTIFACT);

        let plugin = Plugin::open(path.clone(), project.path()).unwrap();
        assert!(path.exists());
        drop(plugin);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_load_removes_artifact() {
        let tmp = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let path = artifact(tmp.path(), "#!/bin/sh\nexit 3\n");

        let err = Plugin::open(path.clone(), project.path()).unwrap_err();
        assert!(matches!(err, SymbolError::Load { .. }));
        assert!(!path.exists());
    }
}
