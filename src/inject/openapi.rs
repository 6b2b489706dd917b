//! `GenerateOpenAPI`: builds the project's main router with the registrer
//! passed to `goyave.Start()` and serializes its OpenAPI 3 specification.

use super::injector::{InjectionPlan, Injector};
use super::plugin::BytesFn;
use super::resolver::{find_route_registrer, import_to_string};
use super::toolchain::Dependency;
use crate::errors::Result;
use crate::observability::{advance_phase, InjectPhase};
use crate::stub;
use semver::{BuildMetadata, Prerelease, Version};
use std::path::Path;

pub const OPENAPI3_MODULE: &str = "goyave.dev/openapi3";
pub const GENERATE_OPENAPI_SYMBOL: &str = "GenerateOpenAPI";

/// Last generator release compatible with frameworks older than v4.0.0-rc1.
const LEGACY_OPENAPI3_VERSION: &str = "v0.1.0";

fn first_v4_release() -> Version {
    Version {
        pre: Prerelease::new("rc1").unwrap_or(Prerelease::EMPTY),
        build: BuildMetadata::EMPTY,
        ..Version::new(4, 0, 0)
    }
}

/// The generator module matching the framework version.
pub fn openapi3_dependency(framework_version: &Version) -> Dependency {
    if *framework_version < first_v4_release() {
        Dependency::pinned(OPENAPI3_MODULE, LEGACY_OPENAPI3_VERSION)
    } else {
        Dependency::latest(OPENAPI3_MODULE)
    }
}

pub fn openapi3_generator(directory: &Path) -> Result<BytesFn> {
    openapi3_generator_with(&Injector::new(directory)?)
}

pub fn openapi3_generator_with(injector: &Injector) -> Result<BytesFn> {
    let registrer = find_route_registrer(injector.directory(), injector.goyave_import_path())?;
    advance_phase(InjectPhase::CallSiteResolved);

    let plan = InjectionPlan::new(stub::INJECT_OPENAPI)
        .with("RouteRegistrer", registrer.value.as_str())
        .with(
            "RouteRegistrerImport",
            import_to_string(registrer.package.as_ref()),
        )
        .with_dependency(openapi3_dependency(injector.goyave_version()));
    injector.inject_symbol(&plan, GENERATE_OPENAPI_SYMBOL)
}
