use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gyv")]
#[command(about = "Command-line companion for Goyave projects", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Database operations run from inside the project
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },

    /// Generate an OpenAPI 3 specification
    ///
    /// The routes are read from the registrer passed to goyave.Start().
    Openapi {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output file, relative to the project root
        #[arg(short, long, default_value = "openapi.json")]
        output: PathBuf,
    },

    /// Create a .gyv.toml configuration file in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Run the automatic migrations of every registered model
    Migrate {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Run seeders
    Seed {
        #[command(flatten)]
        project: ProjectArgs,

        /// Seeder functions to run, in order (defaults to Run)
        #[arg(short, long, value_delimiter = ',')]
        seeders: Vec<String>,
    },

    /// Delete all the records of every registered model
    Clear {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the Goyave project root. Defaults to the nearest directory
    /// containing a go.mod file
    #[arg(short = 'p', long = "project-path", env = "GYV_PROJECT_PATH")]
    pub project_path: Option<PathBuf>,
}
