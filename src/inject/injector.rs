//! Injection pipeline.
//!
//! ```text
//! Created → ManifestValidated → VersionChecked → [CallSiteResolved]
//!   → TemplateRendered → TempFileWritten → DependenciesEnsured → Built
//!   → Cleanup → Loaded → SymbolResolved
//! ```
//!
//! Cleanup (temporary source file removal, dependency tidy) runs whatever the
//! outcome of the build. Its failures are logged and never replace the
//! primary result.

use super::plugin::{InjectedFn, Plugin, Signature, LIST_SYMBOL, RESULT_ENV, SYMBOL_ENV};
use super::toolchain::{BuildTool, Dependency};
use super::unique_suffix;
use crate::config::{load_config_from, GyvConfig};
use crate::errors::{GyvError, Result};
use crate::modfile::{self, FrameworkBinding, ModFile};
use crate::observability::{advance_phase, set_project, set_symbol, InjectPhase};
use crate::scanner;
use crate::stub::{self, StubData, StubValue};
use semver::Version;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Oldest framework release the injected code is written for.
pub const MINIMUM_GOYAVE_VERSION: Version = Version::new(3, 9, 1);

/// Prefix of the source file written into the project.
///
/// Go runs the `init()` functions of a package in file name order, and the
/// injected `init()` exits the process once the symbol has run. The name must
/// therefore sort after the project's own files so their `init()`s run first.
pub const TEMP_FILE_PREFIX: &str = "zz_gyv_codeinject-";
/// Prefix of the executable written to the temporary directory.
pub const ARTIFACT_PREFIX: &str = "gyv-code-injection-";

const ROOT_PACKAGE: &str = "main";

/// What a use case injects: a stub category, the parameters it needs on top
/// of the common ones, and the modules its code imports.
#[derive(Debug, Clone, Default)]
pub struct InjectionPlan {
    pub stub: String,
    pub data: StubData,
    pub dependencies: Vec<Dependency>,
}

impl InjectionPlan {
    pub fn new(stub: impl Into<String>) -> Self {
        Self {
            stub: stub.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<StubValue>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// A validated Goyave project, ready to receive injected code.
pub struct Injector {
    directory: PathBuf,
    mod_file: ModFile,
    framework: FrameworkBinding,
    config: GyvConfig,
    build_tool: Box<dyn BuildTool>,
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("directory", &self.directory)
            .field("framework", &self.framework)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Injector {
    /// Validate the project at `directory`, using the `.gyv.toml` found from
    /// there.
    pub fn new(directory: &Path) -> Result<Self> {
        Self::with_config(directory, load_config_from(directory))
    }

    pub fn with_config(directory: &Path, config: GyvConfig) -> Result<Self> {
        let _project = set_project(directory);
        advance_phase(InjectPhase::Created);

        let mod_file = modfile::parse(directory)?;
        let framework = FrameworkBinding::from_manifest(&mod_file)?;
        advance_phase(InjectPhase::ManifestValidated);

        if framework.version < MINIMUM_GOYAVE_VERSION {
            return Err(GyvError::UnsupportedGoyaveVersion {
                found: framework.raw_version.clone(),
                minimum: format!("v{MINIMUM_GOYAVE_VERSION}"),
            });
        }
        advance_phase(InjectPhase::VersionChecked);

        log::debug!(
            "Goyave project {} using {} {}",
            directory.display(),
            framework.import_path,
            framework.raw_version
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            build_tool: Box::new(config.toolchain()),
            mod_file,
            framework,
            config,
        })
    }

    /// Replace the Go toolchain built from the configuration.
    #[must_use]
    pub fn with_build_tool(mut self, build_tool: impl BuildTool + 'static) -> Self {
        self.build_tool = Box::new(build_tool);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn mod_file(&self) -> &ModFile {
        &self.mod_file
    }

    pub fn framework(&self) -> &FrameworkBinding {
        &self.framework
    }

    pub fn config(&self) -> &GyvConfig {
        &self.config
    }

    pub fn goyave_import_path(&self) -> &str {
        &self.framework.import_path
    }

    pub fn goyave_version(&self) -> &Version {
        &self.framework.version
    }

    pub fn module_path(&self) -> Result<&str> {
        Ok(self.mod_file.module_path()?)
    }

    /// Render `plan`, build the project with it and load the result.
    pub fn inject(&self, plan: &InjectionPlan) -> Result<Plugin> {
        let _project = set_project(&self.directory);

        self.check_root_package()?;
        let source = self.render(plan)?;
        advance_phase(InjectPhase::TemplateRendered);

        let suffix = unique_suffix();
        let file_name = temp_file_name(&suffix);
        for later in scanner::list_source_files(&self.directory)?
            .iter()
            .filter(|path| path.file_name().is_some_and(|name| name > OsStr::new(&file_name)))
        {
            log::warn!(
                "{} sorts after the injected file, its init() runs after the injected symbol",
                later.display()
            );
        }
        let temp_file = self.directory.join(&file_name);
        let artifact = std::env::temp_dir().join(format!("{ARTIFACT_PREFIX}{suffix}"));

        write_temp_file(&temp_file, &source)?;
        advance_phase(InjectPhase::TempFileWritten);
        log::debug!("Wrote {}", temp_file.display());

        let mut added_dependency = false;
        let built = self
            .ensure_dependencies(plan, &mut added_dependency)
            .and_then(|()| {
                advance_phase(InjectPhase::DependenciesEnsured);
                log::info!("Building {}", self.directory.display());
                self.build_tool.build(&self.directory, &artifact)?;
                advance_phase(InjectPhase::Built);
                Ok(())
            });

        advance_phase(InjectPhase::Cleanup);
        self.cleanup(&temp_file, added_dependency);

        if let Err(e) = built {
            remove_stray_artifact(&artifact);
            return Err(e);
        }

        let plugin = Plugin::open(artifact, &self.directory)?;
        advance_phase(InjectPhase::Loaded);
        Ok(plugin)
    }

    /// [`Injector::inject`], then bind `symbol` with the signature `S`.
    pub fn inject_symbol<S: Signature>(
        &self,
        plan: &InjectionPlan,
        symbol: &str,
    ) -> Result<InjectedFn<S>> {
        let plugin = self.inject(plan)?;

        let _symbol = set_symbol(symbol);
        let function = plugin.into_fn::<S>(symbol)?;
        advance_phase(InjectPhase::SymbolResolved);
        Ok(function)
    }

    fn check_root_package(&self) -> Result<()> {
        match scanner::package_name(&self.directory)? {
            Some(found) if found != ROOT_PACKAGE => Err(GyvError::NotMainPackage {
                directory: self.directory.clone(),
                found,
            }),
            _ => Ok(()),
        }
    }

    fn render(&self, plan: &InjectionPlan) -> Result<String> {
        let template = stub::select_template(&plan.stub, &self.framework.version)?;

        let mut data = StubData::new();
        data.insert("GoyaveImportPath".into(), self.goyave_import_path().into());
        data.insert("SymbolEnv".into(), SYMBOL_ENV.into());
        data.insert("ResultEnv".into(), RESULT_ENV.into());
        data.insert("ListSymbol".into(), LIST_SYMBOL.into());
        data.extend(plan.data.clone());

        Ok(stub::render(&template, &data)?)
    }

    fn ensure_dependencies(&self, plan: &InjectionPlan, attempted: &mut bool) -> Result<()> {
        for dependency in &plan.dependencies {
            if modfile::find_dependency(&self.mod_file, &dependency.path).is_some() {
                log::debug!("{} already required", dependency.path);
                continue;
            }

            log::info!("Adding dependency {dependency}");
            *attempted = true;
            self.build_tool.add_dependency(&self.directory, dependency)?;
        }
        Ok(())
    }

    /// Tidy is skipped on purpose when no dependency was added, so that a run
    /// without additions never rewrites the manifest.
    fn cleanup(&self, temp_file: &Path, tidy: bool) {
        match fs::remove_file(temp_file) {
            Ok(()) => log::debug!("Deleted {}", temp_file.display()),
            Err(e) => log::warn!(
                "Could not delete temporary file {}: {e}",
                temp_file.display()
            ),
        }

        if tidy {
            if let Err(e) = self.build_tool.tidy(&self.directory) {
                log::warn!("Could not tidy dependencies: {e}");
            }
        }
    }
}

fn temp_file_name(suffix: &str) -> String {
    format!("{TEMP_FILE_PREFIX}{suffix}.go")
}

fn write_temp_file(path: &Path, contents: &str) -> Result<()> {
    let error = |source| GyvError::TemporaryFile {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(error)?;

    if let Err(source) = file.write_all(contents.as_bytes()) {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Could not delete partial file {}: {e}", path.display());
        }
        return Err(error(source));
    }
    Ok(())
}

// A failed build may still leave an output behind.
fn remove_stray_artifact(artifact: &Path) {
    if artifact.exists() {
        if let Err(e) = fs::remove_file(artifact) {
            log::warn!("Could not delete {}: {e}", artifact.display());
        }
    }
}
