use std::fs;
use std::path::{Path, PathBuf};

use super::{GyvConfig, CONFIG_FILENAME, GO_BIN_ENV};

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse a configuration file's contents.
pub fn parse_config(contents: &str) -> Result<GyvConfig, String> {
    toml::from_str::<GyvConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILENAME}: {e}"))
}

fn try_load_config_from_path(config_path: &Path) -> Option<GyvConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{e}. Using defaults.");
            None
        }
    }
}

// Only log actual errors, not "file not found"
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// `start` and its parents, at most `max_depth` directories.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// `GYV_GO_BIN` takes precedence over the configured Go binary.
pub fn apply_env_overrides(mut config: GyvConfig, go_bin: Option<String>) -> GyvConfig {
    if let Some(binary) = go_bin.filter(|b| !b.is_empty()) {
        log::debug!("Using Go binary {binary} from {GO_BIN_ENV}");
        config.go.binary = binary;
    }
    config
}

/// Nearest `.gyv.toml` from `start` upwards, or the defaults.
pub fn load_config_from(start: &Path) -> GyvConfig {
    let config = directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {MAX_TRAVERSAL_DEPTH} directories. Using default config."
            );
            GyvConfig::default()
        });

    apply_env_overrides(config, std::env::var(GO_BIN_ENV).ok())
}

/// Configuration for the current directory.
pub fn load_config() -> GyvConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_from(&dir),
        Err(e) => {
            log::warn!("Failed to get current directory: {e}. Using default config.");
            apply_env_overrides(GyvConfig::default(), std::env::var(GO_BIN_ENV).ok())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(indoc! {r#"
            [paths]
            seeders = "db/seeders"
        "#})
        .unwrap();

        assert_eq!(config.paths.seeders, "db/seeders");
        assert_eq!(config.paths.models, "database/model");
        assert_eq!(config.go.binary, "go");
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = parse_config("[go]\nbinary = 3\n").unwrap_err();
        assert!(err.starts_with("Failed to parse .gyv.toml"));
    }

    #[test]
    fn test_directory_ancestors_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }

    #[test]
    fn test_load_config_from_ancestor() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[go]\nldflags = \"-s\"\n",
        )
        .unwrap();
        let nested = dir.path().join("cmd");
        fs::create_dir(&nested).unwrap();

        let config = load_config_from(&nested);
        assert_eq!(config.go.ldflags, "-s");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "not toml [").unwrap();

        let config = load_config_from(dir.path());
        assert_eq!(config.paths, GyvConfig::default().paths);
    }

    #[test]
    fn test_env_override() {
        let config = apply_env_overrides(GyvConfig::default(), Some("/opt/go/bin/go".into()));
        assert_eq!(config.go.binary, "/opt/go/bin/go");

        let config = apply_env_overrides(GyvConfig::default(), Some(String::new()));
        assert_eq!(config.go.binary, "go");
    }
}
