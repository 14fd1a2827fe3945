//! Application configuration.
//!
//! Configuration is stored as YAML (default location: the platform config
//! directory, e.g. `~/.config/dropwatch/config.yaml`) and covers:
//! - The watched root folder and how it is scanned
//! - File filtering (extension allow-list, maximum file age)
//! - Stability probing and retry policy
//! - The notification command and message template

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DropwatchError, Result};

/// How candidate files are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerMode {
    /// Walk the watched root on every cycle.
    Poll,
    /// React to OS filesystem notifications (with a full walk as fallback).
    #[default]
    Events,
}

/// External notification command. When no command is configured, the
/// watcher runs in dry-run mode and only logs what it would send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Program to run for each notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Extra arguments passed before the context environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl DispatchConfig {
    fn is_default(&self) -> bool {
        self.command.is_none() && self.args.is_empty()
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder to watch. Created at startup if missing.
    pub root: PathBuf,

    /// Whether subdirectories of the root are scanned too (default: true).
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// When true, files directly in the root are ignored and only files
    /// inside subfolders qualify (default: false).
    #[serde(default)]
    pub subfolders_only: bool,

    /// Scanner selection (default: events).
    #[serde(default)]
    pub scanner: ScannerMode,

    /// Seconds between scan cycles (default: 1).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Milliseconds between the two size probes of the stability check
    /// (default: 1500).
    #[serde(default = "default_stability_wait_ms")]
    pub stability_wait_ms: u64,

    /// Extension allow-list, matched case-insensitively. An empty list
    /// allows every extension (default: common document types).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// When set, files whose modification time is older than this many
    /// seconds are ignored on first sight (default: unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_age_secs: Option<u64>,

    /// Dispatch attempts per processing pass (default: 3).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Seconds between dispatch attempts (default: 5).
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Seconds before a notification command is killed (default: 30).
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    /// Failed processing passes before a file is given up on permanently
    /// (default: 3).
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Contact used when none can be derived from the file's location.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_contact: String,

    /// Message template file. Falls back to a built-in template when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,

    /// Notification command configuration.
    #[serde(default, skip_serializing_if = "DispatchConfig::is_default")]
    pub dispatch: DispatchConfig,
}

fn default_recursive() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_stability_wait_ms() -> u64 {
    1500
}

fn default_extensions() -> Vec<String> {
    ["pdf", "doc", "docx", "xls", "xlsx"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

fn default_max_failures() -> u32 {
    3
}

impl Config {
    /// Build a configuration with defaults for the given root.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: default_recursive(),
            subfolders_only: false,
            scanner: ScannerMode::default(),
            poll_interval_secs: default_poll_interval_secs(),
            stability_wait_ms: default_stability_wait_ms(),
            extensions: default_extensions(),
            max_file_age_secs: None,
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            max_failures: default_max_failures(),
            default_contact: String::new(),
            template_path: None,
            dispatch: DispatchConfig::default(),
        }
    }

    /// Returns the default configuration file path for this platform.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "dropwatch").ok_or_else(|| {
            DropwatchError::Config("could not determine a config directory".to_string())
        })?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration from the given file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DropwatchError::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to the given file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml_ng::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate field ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(DropwatchError::Config("root must not be empty".to_string()));
        }
        if self.retry_attempts == 0 {
            return Err(DropwatchError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_failures == 0 {
            return Err(DropwatchError::Config(
                "max_failures must be at least 1".to_string(),
            ));
        }
        if self.stability_wait_ms == 0 {
            return Err(DropwatchError::Config(
                "stability_wait_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn stability_wait(&self) -> Duration {
        Duration::from_millis(self.stability_wait_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn max_file_age(&self) -> Option<Duration> {
        self.max_file_age_secs.map(Duration::from_secs)
    }
}

/// Resolve the effective configuration for a command invocation.
///
/// Precedence: an explicit `--config` path must exist and parse; otherwise
/// the default config file is used if present; otherwise `--root` alone is
/// enough to run with defaults. `--root` always overrides the file value.
pub fn resolve(config_path: Option<&Path>, root: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(path) = config_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path()?;
        if default_path.exists() {
            Config::load(&default_path)?
        } else if let Some(root) = root {
            Config::for_root(root)
        } else {
            return Err(DropwatchError::Config(format!(
                "no config file at {} — pass --config/--root or run 'dropwatch config init'",
                default_path.display()
            )));
        }
    };

    if let Some(root) = root {
        config.root = root.to_path_buf();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_mirror_expected_values() {
        let config = Config::for_root("/tmp/drop");
        assert!(config.recursive);
        assert_eq!(config.scanner, ScannerMode::Events);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.stability_wait_ms, 1500);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_secs, 5);
        assert_eq!(config.dispatch_timeout_secs, 30);
        assert_eq!(config.max_failures, 3);
        assert_eq!(config.extensions.len(), 5);
        assert!(config.max_file_age_secs.is_none());
        assert!(config.dispatch.command.is_none());
    }

    #[test]
    fn test_round_trip_through_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");

        let mut config = Config::for_root("/tmp/drop");
        config.subfolders_only = true;
        config.dispatch.command = Some("notify-send".to_string());
        config.dispatch.args = vec!["--urgent".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.root, PathBuf::from("/tmp/drop"));
        assert!(loaded.subfolders_only);
        assert_eq!(loaded.dispatch.command.as_deref(), Some("notify-send"));
        assert_eq!(loaded.dispatch.args, vec!["--urgent".to_string()]);
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "root: /tmp/drop\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.scanner, ScannerMode::Events);
        assert!(config.recursive);
    }

    #[test]
    fn test_scanner_mode_parses_lowercase() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "root: /tmp/drop\nscanner: poll\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.scanner, ScannerMode::Poll);
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "root: /tmp/drop\nretry_attempts: 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("retry_attempts"));
    }

    #[test]
    fn test_resolve_prefers_explicit_root() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "root: /tmp/original\n").unwrap();

        let config = resolve(Some(&path), Some(Path::new("/tmp/override"))).unwrap();
        assert_eq!(config.root, PathBuf::from("/tmp/override"));
    }

    #[test]
    fn test_resolve_missing_explicit_config_fails() {
        let err = resolve(Some(Path::new("/nonexistent/config.yaml")), None).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }
}
