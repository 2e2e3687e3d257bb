use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024 // 16MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Sqlite,
    Postgresql,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseType,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<u32>,
}

fn default_sqlite_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cattrack")
        .join("cattrack.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseType::default(),
            sqlite_path: default_sqlite_path(),
            postgresql_url: None,
            pool_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `CATTRACK_LOG` is not set (e.g. "info", "cattrack=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Send logs to systemd-journald (Linux only)
    #[serde(default)]
    pub journald: bool,

    /// Also write daily rotated log files into this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            journald: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from `$CATTRACK_CONFIG` or the default location. A missing file
    /// yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `DATABASE_URL` and `PORT` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            self.database.backend = DatabaseType::Postgresql;
            self.database.postgresql_url = Some(url);
        }

        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CATTRACK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cattrack")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.database.backend, DatabaseType::Sqlite);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [database]
            backend = "postgresql"
            postgresql_url = "postgres://cats@localhost/cats"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.backend, DatabaseType::Postgresql);
        assert_eq!(config.database.pool_size, None);
        assert!(!config.logging.journald);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("DATABASE_URL", "postgres://db/cats"), ("PORT", "8123")]);
        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.database.backend, DatabaseType::Postgresql);
        assert_eq!(config.database.postgresql_url.as_deref(), Some("postgres://db/cats"));
        assert_eq!(config.server.port, 8123);
    }

    #[test]
    fn test_bad_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|name| (name == "PORT").then(|| "eighty".to_string()));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.backend, DatabaseType::Sqlite);
    }

    #[test]
    fn test_toml_round_trip() {
        let text = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.server.bind_addr(), "0.0.0.0:5000");
    }
}
