//! `DBClear`: deletes the records of every registered model.

use super::injector::{InjectionPlan, Injector};
use super::plugin::ErrorFn;
use crate::config::package_import_path;
use crate::errors::Result;
use crate::stub;
use std::path::Path;

pub const DB_CLEAR_SYMBOL: &str = "DBClear";

pub fn db_clear(directory: &Path) -> Result<ErrorFn> {
    db_clear_with(&Injector::new(directory)?)
}

pub fn db_clear_with(injector: &Injector) -> Result<ErrorFn> {
    // Models register themselves from their package's init().
    let models = package_import_path(injector.module_path()?, &injector.config().paths.models);
    let plan = InjectionPlan::new(stub::INJECT_DB_CLEAR).with("ModelImportPath", models);
    injector.inject_symbol(&plan, DB_CLEAR_SYMBOL)
}
