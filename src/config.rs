use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CardnotesConfig {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReviewConfig {
    /// Maximum number of cards `due` lists. `0` lists every due card.
    pub due_limit: usize,
    pub recent_limit: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_data_dir()
            .join("cardnotes.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            due_limit: 0,
            recent_limit: 10,
        }
    }
}

/// Returns `~/.cardnotes/`, or `./.cardnotes/` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cardnotes")
}

/// Returns the default config file path: `~/.cardnotes/config.toml`
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

impl CardnotesConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            CardnotesConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CARDNOTES_DB, CARDNOTES_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CARDNOTES_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CARDNOTES_LOG_LEVEL") {
            self.log.level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CardnotesConfig::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.review.due_limit, 0);
        assert_eq!(config.review.recent_limit, 10);
        assert!(config.storage.db_path.ends_with("cardnotes.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[log]
level = "debug"

[storage]
db_path = "/tmp/notes.db"

[review]
due_limit = 25
"#;
        let config: CardnotesConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/notes.db");
        assert_eq!(config.review.due_limit, 25);
        // defaults still apply for unset fields
        assert_eq!(config.review.recent_limit, 10);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CardnotesConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.review.recent_limit, 10);
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[review\ndue_limit = ").unwrap();

        let err = CardnotesConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config TOML"));
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/notes.db"), PathBuf::from("/var/lib/notes.db"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = CardnotesConfig::default();
        std::env::set_var("CARDNOTES_DB", "/tmp/override.db");
        std::env::set_var("CARDNOTES_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.log.level, "trace");

        // Clean up
        std::env::remove_var("CARDNOTES_DB");
        std::env::remove_var("CARDNOTES_LOG_LEVEL");
    }
}
