//! Configuration schema and loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured bot token.
const BOT_TOKEN_ENV: &str = "BOT_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token; `BOT_TOKEN` in the environment takes precedence
    #[serde(default)]
    pub bot_token: String,

    /// Long-poll timeout for getUpdates, in seconds (default: 30)
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the SQLite session database; `~` is expanded
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_db_path() -> String {
    directories::ProjectDirs::from("", "", "consorcio-bot")
        .map(|dirs| dirs.data_dir().join("sessions.db").display().to_string())
        .unwrap_or_else(|| "~/.consorcio-bot/sessions.db".to_string())
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Config {
    /// Load from `path` when given, otherwise from the platform config dir;
    /// a missing file yields defaults. The bot token can always be supplied
    /// via the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Invalid config {}", p.display()))?
            }
            _ => Self::default(),
        };

        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            if !token.is_empty() {
                config.telegram.bot_token = token;
            }
        }

        Ok(config)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "consorcio-bot")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Session database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.path).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert!(config.telegram.bot_token.is_empty());
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert!(config.storage.path.ends_with("sessions.db"));
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:ABC"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.bot_token, "123:ABC");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn loads_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[telegram]\nbot_token = \"42:XYZ\"\npoll_timeout_secs = 10\n\n\
             [storage]\npath = \"/tmp/consorcio-test.db\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.telegram.poll_timeout_secs, 10);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/consorcio-test.db"));
    }

    #[test]
    fn missing_explicit_path_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn tilde_is_expanded_in_db_path() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            path = "~/consorcio/sessions.db"
            "#,
        )
        .unwrap();
        assert!(!config.db_path().to_string_lossy().starts_with('~'));
    }
}
