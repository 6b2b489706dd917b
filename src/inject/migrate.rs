//! `Migrate`: automatic migrations of every model registered by the
//! project's model package.

use super::injector::{InjectionPlan, Injector};
use super::plugin::ErrorFn;
use crate::config::package_import_path;
use crate::errors::Result;
use crate::stub;
use std::path::Path;

pub const MIGRATE_SYMBOL: &str = "Migrate";

pub fn migrate(directory: &Path) -> Result<ErrorFn> {
    migrate_with(&Injector::new(directory)?)
}

pub fn migrate_with(injector: &Injector) -> Result<ErrorFn> {
    let models = package_import_path(injector.module_path()?, &injector.config().paths.models);
    let plan = InjectionPlan::new(stub::INJECT_MIGRATE).with("ModelImportPath", models);
    injector.inject_symbol(&plan, MIGRATE_SYMBOL)
}
