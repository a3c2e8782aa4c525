//! User configuration: `<config dir>/reten/config.toml`, all fields
//! optional, defaults when the file is absent.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Seconds between unconditional view re-queries when none is configured.
pub const DEFAULT_REFILTER_SECONDS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Path of the shared SQLite store. Defaults to the platform data dir.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// `"human"` or `"json"`. The `--json` flag overrides this.
    #[serde(default)]
    pub output: Option<String>,
    /// Interval for the watch view's time-driven re-filter.
    #[serde(default)]
    pub refilter_seconds: Option<u64>,
}

impl UserConfig {
    pub fn refilter_seconds(&self) -> u64 {
        self.refilter_seconds.unwrap_or(DEFAULT_REFILTER_SECONDS)
    }
}

/// Default config file location.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("no config directory available")?;
    Ok(config_dir.join("reten/config.toml"))
}

/// Load the config file, or defaults when it does not exist.
pub fn load(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the store path: `--store` flag, then config, then the platform
/// data directory.
pub fn resolve_store_path(flag: Option<PathBuf>, config: &UserConfig) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(path) = &config.store_path {
        return Ok(path.clone());
    }

    let data_dir = dirs::data_dir().context("no data directory available")?;
    Ok(data_dir.join("reten/retenes.sqlite3"))
}

/// Resolve the output mode: `--json` flag wins, then the config value,
/// defaulting to human output.
pub fn resolve_json(json_flag: bool, config: &UserConfig) -> bool {
    if json_flag {
        return true;
    }
    config
        .output
        .as_deref()
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = load(&dir.path().join("absent.toml")).expect("load");

        assert!(cfg.store_path.is_none());
        assert!(cfg.output.is_none());
        assert_eq!(cfg.refilter_seconds(), DEFAULT_REFILTER_SECONDS);
    }

    #[test]
    fn config_file_parses_all_fields() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
store_path = "/tmp/retenes.sqlite3"
output = "json"
refilter_seconds = 30
"#,
        )
        .expect("write config");

        let cfg = load(&path).expect("load");
        assert_eq!(cfg.store_path, Some(PathBuf::from("/tmp/retenes.sqlite3")));
        assert!(resolve_json(false, &cfg));
        assert_eq!(cfg.refilter_seconds(), 30);
    }

    #[test]
    fn flag_beats_config_for_store_and_output() {
        let cfg = UserConfig {
            store_path: Some(PathBuf::from("/from/config.sqlite3")),
            output: Some("human".to_string()),
            refilter_seconds: None,
        };

        let resolved = resolve_store_path(Some(PathBuf::from("/from/flag.sqlite3")), &cfg)
            .expect("resolve");
        assert_eq!(resolved, PathBuf::from("/from/flag.sqlite3"));
        assert!(resolve_json(true, &cfg));
        assert!(!resolve_json(false, &cfg));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "store_path = [not toml").expect("write config");

        assert!(load(&path).is_err());
    }
}
