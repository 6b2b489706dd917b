//! Code injection into Goyave projects.
//!
//! A use case (migrate, seed, clear, OpenAPI generation) renders a temporary
//! source file into the project's root package, builds the project, loads the
//! resulting artifact and hands back a typed function bound to it. See
//! [`injector::Injector`] for the pipeline and [`plugin`] for the protocol
//! spoken with the artifact.

pub mod db_clear;
pub mod injector;
pub mod migrate;
pub mod openapi;
pub mod plugin;
pub mod resolver;
pub mod seed;
pub mod toolchain;

pub use db_clear::{db_clear, db_clear_with};
pub use injector::{InjectionPlan, Injector, MINIMUM_GOYAVE_VERSION};
pub use migrate::{migrate, migrate_with};
pub use openapi::{
    openapi3_dependency, openapi3_generator, openapi3_generator_with, OPENAPI3_MODULE,
};
pub use plugin::{BytesFn, ErrorFn, InjectedFn, Plugin};
pub use resolver::{find_route_registrer, CallReference};
pub use seed::{find_seeders, seeder, seeder_with, validate_seeders};
pub use toolchain::{BuildTool, Dependency, GoToolchain};

use std::sync::atomic::{AtomicU64, Ordering};

static SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Suffix for temporary names: `<unix-seconds>-<pid>-<counter>`.
pub(crate) fn unique_suffix() -> String {
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp(),
        std::process::id(),
        SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}
