//! Configuration management for Vigil.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main worker configuration.
///
/// This is loaded from `~/.config/vigil/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Run store settings
    pub database: DatabaseConfig,
    /// Page fetcher settings
    pub fetcher: FetcherConfig,
    /// Queue polling settings
    pub worker: WorkerConfig,
    /// Public report settings
    pub publish: PublishConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `VIGIL_DATABASE_PATH`: Override the `SQLite` file location
    /// - `VIGIL_POLL_INTERVAL_MS`: Override the delay between queue polls
    /// - `VIGIL_MAX_REDIRECTS`: Override the redirect hop bound
    /// - `VIGIL_PUBLISH_ENABLED`: Enable or disable public reports (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        Self::load()?.with_env(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides, then validate the result.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        self.apply_env(lookup);
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("VIGIL_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = val;
        }

        if let Some(val) = lookup("VIGIL_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                self.worker.poll_interval_ms = ms;
                tracing::debug!("Override worker.poll_interval_ms from env: {}", ms);
            }
        }

        if let Some(val) = lookup("VIGIL_MAX_REDIRECTS") {
            if let Ok(hops) = val.parse() {
                self.fetcher.max_redirects = hops;
                tracing::debug!("Override fetcher.max_redirects from env: {}", hops);
            }
        }

        if let Some(val) = lookup("VIGIL_PUBLISH_ENABLED") {
            if let Ok(enabled) = val.parse() {
                self.publish.enabled = enabled;
                tracing::debug!("Override publish.enabled from env: {}", enabled);
            }
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fetcher.max_redirects == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetcher.max_redirects".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Resolve the database file, defaulting to `vigil.db` in the data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if self.database.path.trim().is_empty() {
            Ok(Self::data_dir()?.join("vigil.db"))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/vigil/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vigil", "vigil").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/vigil`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vigil", "vigil").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Run store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` file path; empty means the platform data directory
    pub path: String,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_connections: 5,
        }
    }
}

/// Page fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// TCP/TLS connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum number of requests issued while following redirects
    pub max_redirects: u32,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 20,
            max_redirects: 10,
            user_agent: "vigil-auditor/1.0".to_string(),
        }
    }
}

/// Queue polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Delay between the end of one tick and the start of the next
    pub poll_interval_ms: u64,
    /// Delay before the first tick
    pub initial_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            initial_delay_ms: 1000,
        }
    }
}

/// Public report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Publish a redacted report after each completed run
    pub enabled: bool,
    /// Lifetime of a published report in days (absent = never expires)
    pub ttl_days: Option<u32>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_days: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.fetcher.connect_timeout_secs, 10);
        assert_eq!(config.fetcher.request_timeout_secs, 20);
        assert_eq!(config.fetcher.max_redirects, 10);
        assert_eq!(config.worker.poll_interval_ms, 2000);
        assert!(config.publish.enabled);
        assert!(config.publish.ttl_days.is_none());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[fetcher]"));
        assert!(toml_str.contains("[worker]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.fetcher.user_agent, config.fetcher.user_agent);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.database.path = "/var/lib/vigil/runs.db".to_string();
        config.publish.ttl_days = Some(30);

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.database.path, "/var/lib/vigil/runs.db");
        assert_eq!(loaded.publish.ttl_days, Some(30));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VIGIL_DATABASE_PATH", "/tmp/vigil-test.db"),
            ("VIGIL_POLL_INTERVAL_MS", "250"),
            ("VIGIL_MAX_REDIRECTS", "not-a-number"),
            ("VIGIL_PUBLISH_ENABLED", "false"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.database.path, "/tmp/vigil-test.db");
        assert_eq!(config.worker.poll_interval_ms, 250);
        // Unparseable values leave the default in place
        assert_eq!(config.fetcher.max_redirects, 10);
        assert!(!config.publish.enabled);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[fetcher]
user_agent = "custom-agent/2.0"

[worker]
poll_interval_ms = 500
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.fetcher.user_agent, "custom-agent/2.0");
        assert_eq!(config.worker.poll_interval_ms, 500);
        // These should be defaults
        assert_eq!(config.fetcher.max_redirects, 10);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_validate_rejects_zero_redirects() {
        let mut config = AppConfig::default();
        config.fetcher.max_redirects = 0;
        let err = config.validate().expect_err("zero hops is invalid");
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "fetcher.max_redirects"));
    }

    #[test]
    fn test_env_overrides_are_validated() {
        let zero = AppConfig::default().with_env(|name| {
            (name == "VIGIL_POLL_INTERVAL_MS").then(|| "0".to_string())
        });
        let err = zero.expect_err("zero interval is invalid");
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "worker.poll_interval_ms"));

        let config = AppConfig::default()
            .with_env(|name| (name == "VIGIL_POLL_INTERVAL_MS").then(|| "750".to_string()))
            .expect("valid override");
        assert_eq!(config.worker.poll_interval_ms, 750);
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let mut config = AppConfig::default();
        config.database.path = "runs.db".to_string();
        assert_eq!(
            config.database_path().expect("resolve path"),
            PathBuf::from("runs.db")
        );
    }
}
