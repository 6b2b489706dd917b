// Test utility module for gyv integration tests
#![allow(dead_code)]

use gyv::errors::BuildError;
use gyv::inject::injector::TEMP_FILE_PREFIX;
use gyv::inject::{BuildTool, Dependency};
use indoc::indoc;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

pub const MODULE: &str = "github.com/acme/api";

/// `{"openapi":"3.0.0"}`, as returned by the fake artifact.
pub const OPENAPI_DOCUMENT: &str = r#"{"openapi":"3.0.0"}"#;
const OPENAPI_DOCUMENT_BASE64: &str = "eyJvcGVuYXBpIjoiMy4wLjAifQ==";

pub const MAIN_GO: &str = indoc! {r#"
    package main

    import (
        "os"

        "github.com/acme/api/http/route"
        "goyave.dev/goyave/v4"
    )

    func main() {
        if err := goyave.Start(route.Register); err != nil {
            os.Exit(err.(*goyave.Error).ExitCode)
        }
    }
"#};

pub const SEEDER_GO: &str = indoc! {r#"
    package seeder

    func Users() {}

    func Run() {
        Users()
    }

    func userFactory() {}
"#};

pub fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn go_mod(goyave_version: &str) -> String {
    format!(
        "module {MODULE}\n\ngo 1.21\n\nrequire (\n\tgorm.io/gorm v1.25.5\n\tgoyave.dev/goyave/v4 {goyave_version}\n)\n"
    )
}

/// A minimal Goyave project: manifest, main package, routes and seeders.
pub fn goyave_project(goyave_version: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "go.mod", &go_mod(goyave_version));
    write(dir.path(), "main.go", MAIN_GO);
    write(
        dir.path(),
        "http/route/route.go",
        "package route\n\nimport \"goyave.dev/goyave/v4\"\n\nfunc Register(router *goyave.Router) {}\n",
    );
    write(dir.path(), "database/seeder/seeder.go", SEEDER_GO);
    dir
}

/// Sorted entry names of `dir`.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn injected_files(dir: &Path) -> Vec<String> {
    list_dir(dir)
        .into_iter()
        .filter(|name| name.starts_with(TEMP_FILE_PREFIX))
        .collect()
}

/// Stand-in for the Go toolchain. The "build" reads the injected source and
/// writes a shell script speaking the result protocol for the symbols it
/// declares. Invoked symbols are appended to `invoked.log` in the project.
#[derive(Clone, Default)]
pub struct FakeGo {
    pub calls: Rc<RefCell<Vec<String>>>,
    pub sources: Rc<RefCell<Vec<String>>>,
    pub fail_build: bool,
}

impl FakeGo {
    pub fn failing() -> Self {
        Self {
            fail_build: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn last_source(&self) -> String {
        self.sources.borrow().last().cloned().unwrap_or_default()
    }
}

fn declared_symbols(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let entry = line.trim().strip_prefix('"')?;
            let (name, rest) = entry.split_once("\": ")?;
            rest.ends_with(',').then(|| name.to_string())
        })
        .collect()
}

fn artifact_script(symbols: &[String]) -> String {
    let table = symbols
        .iter()
        .map(|name| {
            let go_type = if name == "GenerateOpenAPI" {
                "func() ([]uint8, error)"
            } else {
                "func() error"
            };
            format!("\"{name}\":\"{go_type}\"")
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"#!/bin/sh
case "$GYV_INJECT_SYMBOL" in
  __gyv_symbols__)
    printf '%s' '{{"symbols":{{{table}}}}}' > "$GYV_INJECT_RESULT" ;;
  GenerateOpenAPI)
    echo GenerateOpenAPI >> invoked.log
    printf '%s' '{{"data":"{OPENAPI_DOCUMENT_BASE64}"}}' > "$GYV_INJECT_RESULT" ;;
  *)
    echo "$GYV_INJECT_SYMBOL" >> invoked.log
    printf '{{}}' > "$GYV_INJECT_RESULT" ;;
esac
"#
    )
}

impl BuildTool for FakeGo {
    fn add_dependency(&self, _directory: &Path, dependency: &Dependency) -> Result<(), BuildError> {
        self.calls.borrow_mut().push(format!("get {dependency}"));
        Ok(())
    }

    fn build(&self, directory: &Path, output: &Path) -> Result<(), BuildError> {
        self.calls.borrow_mut().push("build".to_string());
        for name in injected_files(directory) {
            let source = fs::read_to_string(directory.join(name)).unwrap();
            self.sources.borrow_mut().push(source);
        }

        if self.fail_build {
            return Err(BuildError::Failed {
                command: "go build".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "./zz_gyv_codeinject-1-2-3.go:12:2: undefined: Register".to_string(),
            });
        }

        let script = artifact_script(&declared_symbols(&self.last_source()));
        fs::write(output, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(output, fs::Permissions::from_mode(0o755)).unwrap();
        }
        Ok(())
    }

    fn tidy(&self, _directory: &Path) -> Result<(), BuildError> {
        self.calls.borrow_mut().push("tidy".to_string());
        Ok(())
    }
}
