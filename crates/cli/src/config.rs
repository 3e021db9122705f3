use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use compact_registry::{BuildOptions, DEFAULT_SESSION_TTL};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "compact-tracker.toml";

/// Workspace settings for the command-line front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompactConfig {
    /// Host part of workspace URLs
    pub url_host: String,

    /// Workspace segment of URLs (`acme` in `https://linear.app/acme/...`)
    pub workspace_key: Option<String>,

    /// Canonical workspace id
    pub workspace_id: String,

    /// Team whose states get unprefixed keys (id or key)
    pub default_team: Option<String>,

    /// Registry lifetime in seconds
    pub session_ttl_secs: u64,
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            url_host: "linear.app".to_string(),
            workspace_key: None,
            workspace_id: "local".to_string(),
            default_team: None,
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
        }
    }
}

impl CompactConfig {
    /// Reads `path`, or the default file if present, or falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            log::debug!("no {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url_host.trim().is_empty() {
            return Err("url_host must not be empty".to_string());
        }
        if self.workspace_id.trim().is_empty() {
            return Err("workspace_id must not be empty".to_string());
        }
        if self
            .workspace_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            return Err("workspace_key must not be empty when set".to_string());
        }
        if self.session_ttl_secs == 0 {
            return Err("session_ttl_secs must be > 0".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        let mut options = BuildOptions::new(self.workspace_id.clone());
        if let Some(key) = &self.workspace_key {
            options = options.with_workspace_key(key.clone());
        }
        if let Some(team) = &self.default_team {
            options = options.with_default_team(team.clone());
        }
        options
    }

    /// Workspace segment used in URLs.
    #[must_use]
    pub fn workspace_segment(&self) -> &str {
        self.workspace_key.as_deref().unwrap_or(&self.workspace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = CompactConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), DEFAULT_SESSION_TTL);
        assert_eq!(config.workspace_segment(), "local");
    }

    #[test]
    fn parses_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compact-tracker.toml");
        fs::write(&path, "workspace_key = \"acme\"\ndefault_team = \"SQT\"\n").unwrap();

        let config = CompactConfig::load(Some(&path)).unwrap();
        assert_eq!(config.workspace_key.as_deref(), Some("acme"));
        assert_eq!(config.default_team.as_deref(), Some("SQT"));
        assert_eq!(config.url_host, "linear.app");
        assert_eq!(config.workspace_segment(), "acme");
    }

    #[test]
    fn unknown_keys_are_rejected_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "url_hots = \"x\"\n").unwrap();

        let err = CompactConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"), "{err:#}");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(CompactConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn validate_rejects_empty_values() {
        let config = CompactConfig {
            url_host: " ".to_string(),
            ..CompactConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CompactConfig {
            workspace_key: Some(String::new()),
            ..CompactConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CompactConfig {
            session_ttl_secs: 0,
            ..CompactConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
