use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use gyv::cli::{Cli, Commands, DbCommand};
use gyv::commands;
use gyv::observability::install_panic_hook;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_panic_hook();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {e:#}", "❌".red());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "gyv=debug" } else { "gyv=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Db { command } => match command {
            DbCommand::Migrate { project } => commands::migrate(&project),
            DbCommand::Seed { project, seeders } => commands::seed(&project, &seeders),
            DbCommand::Clear { project } => commands::clear(&project),
        },
        Commands::Openapi { project, output } => commands::generate_openapi(&project, &output),
        Commands::Init { force } => commands::init_config(force),
    }
}
