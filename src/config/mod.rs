//! `.gyv.toml` configuration.
//!
//! ```toml
//! [go]
//! binary = "go"
//! ldflags = "-w -s"
//!
//! [paths]
//! models = "database/model"
//! seeders = "database/seeder"
//! ```
//!
//! Every key is optional. `GYV_GO_BIN` overrides `go.binary`.

mod loader;

pub use loader::{
    apply_env_overrides, directory_ancestors, load_config, load_config_from, parse_config,
};

use crate::inject::toolchain::{GoToolchain, DEFAULT_GO_BINARY, DEFAULT_LDFLAGS};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = ".gyv.toml";
pub const GO_BIN_ENV: &str = "GYV_GO_BIN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GyvConfig {
    pub go: GoConfig,
    pub paths: PathsConfig,
}

/// Go toolchain settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoConfig {
    pub binary: String,
    pub ldflags: String,
}

impl Default for GoConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_GO_BINARY.to_string(),
            ldflags: DEFAULT_LDFLAGS.to_string(),
        }
    }
}

/// Package locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub models: String,
    pub seeders: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models: "database/model".to_string(),
            seeders: "database/seeder".to_string(),
        }
    }
}

impl GyvConfig {
    pub fn toolchain(&self) -> GoToolchain {
        GoToolchain::new(&self.go.binary, &self.go.ldflags)
    }
}

/// Join a module path and a project-relative package directory into an
/// import path.
pub fn package_import_path(module: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/').trim_start_matches("./");
    if relative.is_empty() {
        module.to_string()
    } else {
        format!("{module}/{relative}")
    }
}
