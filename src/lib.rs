//! gyv: command-line companion for Goyave projects.
//!
//! The library is built around code injection: a small Go source file is
//! rendered into the target project, the project is built with it, and the
//! injected function is run from inside the project (migrations, seeders,
//! database clearing, OpenAPI generation).
//!
//! ```no_run
//! use std::path::Path;
//!
//! let migrate = gyv::inject::migrate(Path::new("./my-api"))?;
//! migrate.call()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod inject;
pub mod modfile;
pub mod observability;
pub mod scanner;
pub mod stub;

pub use crate::errors::{GyvError, Result};
