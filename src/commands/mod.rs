//! Command implementations for the gyv binary.
//!
//! Each command resolves the project directory, asks [`crate::inject`] for a
//! bound function and runs it inside the project. Progress is reported on
//! stdout; failures bubble up as [`anyhow::Error`].

pub mod db;
pub mod init;
pub mod openapi;

pub use db::{clear, migrate, seed};
pub use init::{init_config, init_config_in};
pub use openapi::generate_openapi;

use crate::cli::ProjectArgs;
use crate::errors::ManifestError;
use crate::inject::plugin::{InjectedFn, Signature};
use crate::modfile::find_parent_module;
use crate::observability::{set_phase, set_symbol, InjectPhase};
use anyhow::Result;
use std::path::PathBuf;

/// The project given on the command line, or the nearest directory
/// containing a go.mod.
pub fn resolve_project_path(project: &ProjectArgs) -> Result<PathBuf> {
    match &project.project_path {
        Some(path) => Ok(path.clone()),
        None => {
            let path = find_parent_module().ok_or(ManifestError::NoGoMod)?;
            log::debug!("Using project at {}", path.display());
            Ok(path)
        }
    }
}

pub(crate) fn invoke<S: Signature>(function: &InjectedFn<S>) -> Result<S::Output> {
    let _phase = set_phase(InjectPhase::Invoking);
    let _symbol = set_symbol(function.name());
    Ok(function.call()?)
}
