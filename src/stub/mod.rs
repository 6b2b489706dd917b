//! Embedded source templates ("stubs").
//!
//! Stubs are grouped by category. A category directory holds a
//! `default.go.stub` plus optional version-bounded variants named after the
//! lowest framework version they support (`v4.0.0.go.stub`, `v4.go.stub`).
//! [`select_template`] picks the variant with the greatest version not above
//! the target, falling back to the default.

use crate::errors::StubError;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;

pub const CONTROLLER: &str = "controller";
pub const MODEL: &str = "model";
pub const MIDDLEWARE: &str = "middleware";
pub const INJECT_MIGRATE: &str = "inject/migrate";
pub const INJECT_SEED: &str = "inject/seed";
pub const INJECT_DB_CLEAR: &str = "inject/db_clear";
pub const INJECT_OPENAPI: &str = "inject/openapi";

/// Layout shared by every injection stub, which fill in its blocks.
pub const INJECT_RUNTIME: &str = "inject/runtime.go.stub";

const DEFAULT_STUB: &str = "default.go.stub";
const STUB_EXTENSION: &str = ".go.stub";

macro_rules! embed_stubs {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("embed/", $name)))),*]
    };
}

static STUBS: &[(&str, &str)] = embed_stubs![
    "controller/default.go.stub",
    "controller/v4.0.0.go.stub",
    "model/default.go.stub",
    "model/v4.0.0.go.stub",
    "middleware/default.go.stub",
    "middleware/v4.0.0-rc1.go.stub",
    "inject/runtime.go.stub",
    "inject/migrate/default.go.stub",
    "inject/seed/default.go.stub",
    "inject/db_clear/default.go.stub",
    "inject/openapi/default.go.stub",
];

/// A template parameter: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StubValue {
    String(String),
    List(Vec<String>),
}

impl From<&str> for StubValue {
    fn from(value: &str) -> Self {
        StubValue::String(value.to_string())
    }
}

impl From<String> for StubValue {
    fn from(value: String) -> Self {
        StubValue::String(value)
    }
}

impl From<Vec<String>> for StubValue {
    fn from(value: Vec<String>) -> Self {
        StubValue::List(value)
    }
}

/// Named parameters substituted into a stub.
pub type StubData = BTreeMap<String, StubValue>;

/// Names of every embedded stub.
pub fn stub_names() -> impl Iterator<Item = &'static str> {
    STUBS.iter().map(|(name, _)| *name)
}

fn source(name: &str) -> Option<&'static str> {
    STUBS
        .iter()
        .find(|(stub, _)| *stub == name)
        .map(|(_, source)| *source)
}

/// Parse the version a stub file is named after. Missing minor and patch
/// components default to zero, so `v4` is `4.0.0`.
pub fn stub_version(file_name: &str) -> Result<Version, StubError> {
    let stem = file_name.strip_suffix(STUB_EXTENSION).unwrap_or(file_name);
    let stem = stem.strip_prefix('v').unwrap_or(stem);
    let (core, rest) = match stem.find(['-', '+']) {
        Some(index) => stem.split_at(index),
        None => (stem, ""),
    };

    let mut normalized = core.to_string();
    for _ in core.matches('.').count()..2 {
        normalized.push_str(".0");
    }
    normalized.push_str(rest);

    Version::parse(&normalized).map_err(|source| StubError::InvalidStubVersion {
        file: file_name.to_string(),
        source,
    })
}

/// Path of the most specific stub of `category` compatible with `version`.
pub fn select_template(category: &str, version: &Version) -> Result<String, StubError> {
    let prefix = format!("{category}/");
    let mut selected: Option<(&str, Version)> = None;

    for name in stub_names() {
        let Some(file) = name.strip_prefix(&prefix) else {
            continue;
        };
        if file == DEFAULT_STUB || file.contains('/') {
            continue;
        }

        let file_version = stub_version(file)?;
        if file_version > *version {
            continue;
        }
        if selected.as_ref().is_none_or(|(_, best)| file_version > *best) {
            selected = Some((name, file_version));
        }
    }

    if let Some((name, file_version)) = selected {
        log::debug!("Selected stub {name} ({file_version}) for version {version}");
        return Ok(name.to_string());
    }

    let default = format!("{prefix}{DEFAULT_STUB}");
    if source(&default).is_none() {
        return Err(StubError::NotFound(default));
    }
    Ok(default)
}

fn environment() -> Result<Environment<'static>, StubError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);

    for &(name, source) in STUBS {
        env.add_template(name, source)
            .map_err(|source| StubError::Parse {
                name: name.to_string(),
                source,
            })?;
    }
    Ok(env)
}

/// Render the stub `name` with `data`. Any parameter the stub references must
/// be present in `data`.
pub fn render(name: &str, data: &StubData) -> Result<String, StubError> {
    let env = environment()?;
    let template = env.get_template(name).map_err(|source| match source.kind() {
        ErrorKind::TemplateNotFound => StubError::NotFound(name.to_string()),
        _ => StubError::Parse {
            name: name.to_string(),
            source,
        },
    })?;

    template.render(data).map_err(|source| StubError::Exec {
        name: name.to_string(),
        source,
    })
}
