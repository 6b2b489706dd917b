use crate::config::CONFIG_FILENAME;
use anyhow::{Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# gyv configuration

[go]
# Go binary, looked up in PATH. GYV_GO_BIN overrides it.
binary = "go"
ldflags = "-w -s"

[paths]
models = "database/model"
seeders = "database/seeder"
"#;

pub fn init_config(force: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    init_config_in(&cwd, force)
}

pub fn init_config_in(directory: &Path, force: bool) -> Result<()> {
    let config_path = directory.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {CONFIG_FILENAME} configuration file");

    Ok(())
}
