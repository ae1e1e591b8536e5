//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.gopeed/shell.toml` (optional)
//! 3. **Explicit config** - the file passed with `--config` (must exist)
//!
//! Layers are merged as TOML tables before deserializing, so a layer that
//! sets only `[ipc] request_timeout_ms` leaves every other key untouched.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::types::ShellConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Load configuration from the user config and an optional explicit file.
///
/// # Errors
///
/// A missing user config is not an error. A missing explicit config is.
/// Parse and validation errors always fail.
pub fn load_hierarchy(explicit: Option<&Path>) -> Result<ShellConfig, ConfigError> {
    let mut merged = toml::Table::new();

    if let Some(path) = user_config_path() {
        match read_table(&path) {
            Ok(table) => merge_tables(&mut merged, table),
            Err(ConfigError::ConfigNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    if let Some(path) = explicit {
        let table = read_table(path)?;
        merge_tables(&mut merged, table);
    }

    let config = table_to_config(merged)?;
    validate_config(&config)?;

    debug!(
        event = "core.config.load_completed",
        title = config.instance.title,
        explicit = explicit.map(|p| p.display().to_string()),
    );

    Ok(config)
}

/// Load a single configuration file on top of the defaults.
pub fn load_config_file(path: &Path) -> Result<ShellConfig, ConfigError> {
    let table = read_table(path)?;
    let config = table_to_config(table)?;
    validate_config(&config)?;
    Ok(config)
}

/// Path of the user config file, `~/.gopeed/shell.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gopeed").join("shell.toml"))
}

/// Directory that holds the instance endpoint and claim.
///
/// Resolution order: `[instance] runtime_dir`, the platform runtime dir,
/// `~/.gopeed/run`, then the system temp dir.
pub fn resolve_runtime_dir(config: &ShellConfig) -> PathBuf {
    if let Some(dir) = &config.instance.runtime_dir {
        return dir.clone();
    }
    if let Some(dir) = dirs::runtime_dir() {
        return dir.join("gopeed");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gopeed").join("run");
    }
    std::env::temp_dir().join("gopeed")
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            }
        } else {
            ConfigError::IoError { source: e }
        }
    })?;

    content
        .parse::<toml::Table>()
        .map_err(|e| ConfigError::ConfigParseError {
            message: format!("'{}': {}", path.display(), e),
        })
}

fn table_to_config(table: toml::Table) -> Result<ShellConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ConfigParseError {
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::Table {
        src.parse::<toml::Table>().unwrap()
    }

    #[test]
    fn test_merge_tables_keeps_untouched_keys() {
        let mut base = table(
            r#"
            [ipc]
            request_timeout_ms = 500
            delivery_retries = 3
            "#,
        );
        merge_tables(&mut base, table("[ipc]\nrequest_timeout_ms = 900\n"));

        let config = table_to_config(base).unwrap();
        assert_eq!(config.ipc.request_timeout_ms, 900);
        assert_eq!(config.ipc.delivery_retries, 3);
    }

    #[test]
    fn test_merge_tables_replaces_arrays() {
        let mut base = table("[engine]\nargs = [\"a\", \"b\"]\n");
        merge_tables(&mut base, table("[engine]\nargs = [\"c\"]\n"));

        let config = table_to_config(base).unwrap();
        assert_eq!(config.engine.args, vec!["c".to_string()]);
    }

    #[test]
    fn test_load_config_file_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "[instance]\ntitle = \"gopeed-dev\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.instance.title, "gopeed-dev");
        assert_eq!(config.instance.window_class, "FLUTTER_RUNNER_WIN32_WINDOW");
        assert_eq!(config.ipc.request_timeout_ms, 2000);
    }

    #[test]
    fn test_load_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_config_file_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "[instance\ntitle = ").unwrap();

        let result = load_config_file(&path);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_load_config_file_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.toml");
        fs::write(&path, "[ipc]\nrequest_timeout_ms = \"soon\"\n").unwrap();

        let result = load_config_file(&path);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_resolve_runtime_dir_prefers_config() {
        let mut config = ShellConfig::default();
        config.instance.runtime_dir = Some(PathBuf::from("/tmp/gopeed-test-run"));
        assert_eq!(
            resolve_runtime_dir(&config),
            PathBuf::from("/tmp/gopeed-test-run")
        );
    }
}
