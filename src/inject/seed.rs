//! `Seed`: runs a selection of the project's seeder functions.

use super::injector::{InjectionPlan, Injector};
use super::plugin::ErrorFn;
use crate::config::package_import_path;
use crate::errors::{ResolveError, Result};
use crate::modfile::module_base_name;
use crate::scanner;
use crate::stub;
use std::path::Path;

pub const SEED_SYMBOL: &str = "Seed";

/// Seeder run when none is selected explicitly.
pub const DEFAULT_SEEDER: &str = "Run";

/// Exported zero-argument functions of the seeder package, `Run` first.
pub fn find_seeders(directory: &Path) -> std::result::Result<Vec<String>, ResolveError> {
    let mut functions = scanner::collect_exported_functions(directory)?;
    if functions.is_empty() {
        return Err(ResolveError::NoSeederFunction {
            directory: directory.to_path_buf(),
        });
    }

    functions.sort_by_key(|name| name != DEFAULT_SEEDER);
    Ok(functions)
}

/// Every requested seeder must be one of `available`.
pub fn validate_seeders(
    requested: &[String],
    available: &[String],
) -> std::result::Result<(), ResolveError> {
    match requested.iter().find(|name| !available.contains(*name)) {
        Some(unknown) => Err(ResolveError::UnknownSeeder {
            name: unknown.clone(),
            available: available.to_vec(),
        }),
        None => Ok(()),
    }
}

pub fn seeder(directory: &Path, seeders: &[String]) -> Result<ErrorFn> {
    seeder_with(&Injector::new(directory)?, seeders)
}

/// Validate `seeders` against the seeder package, then inject a `Seed`
/// function calling them in the given order. An empty selection runs
/// [`DEFAULT_SEEDER`].
pub fn seeder_with(injector: &Injector, seeders: &[String]) -> Result<ErrorFn> {
    let relative = &injector.config().paths.seeders;
    let seeder_directory = injector.directory().join(relative);

    let default = [DEFAULT_SEEDER.to_string()];
    let seeders = if seeders.is_empty() {
        log::info!("No seeder selected, running {DEFAULT_SEEDER}");
        &default[..]
    } else {
        seeders
    };

    let available = find_seeders(&seeder_directory)?;
    validate_seeders(seeders, &available)?;

    let import_path = package_import_path(injector.module_path()?, relative);
    let package = scanner::package_name(&seeder_directory)?
        .unwrap_or_else(|| module_base_name(&import_path).to_string());

    log::debug!("Seeding with {package}.{{{}}}", seeders.join(", "));
    let plan = InjectionPlan::new(stub::INJECT_SEED)
        .with("SeederImportPath", import_path.as_str())
        .with("SeederPackage", package)
        .with("Seeders", seeders.to_vec());
    injector.inject_symbol(&plan, SEED_SYMBOL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_seeders_puts_run_first() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("seeder.go"),
            indoc! {r#"
                package seeder

                func Articles() {}
                func Run() {}
                func Users() {}
                func helper() {}
            "#},
        )
        .unwrap();

        assert_eq!(
            find_seeders(dir.path()).unwrap(),
            names(&["Run", "Articles", "Users"])
        );
    }

    #[test]
    fn test_find_seeders_empty_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("seeder.go"), "package seeder\n").unwrap();

        assert!(matches!(
            find_seeders(dir.path()),
            Err(ResolveError::NoSeederFunction { .. })
        ));
    }

    #[test]
    fn test_validate_seeders() {
        let available = names(&["Run", "Users"]);
        assert!(validate_seeders(&names(&["Users", "Run"]), &available).is_ok());
        assert!(validate_seeders(&[], &available).is_ok());

        match validate_seeders(&names(&["Run", "Typo"]), &available) {
            Err(ResolveError::UnknownSeeder { name, available }) => {
                assert_eq!(name, "Typo");
                assert_eq!(available, names(&["Run", "Users"]));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
