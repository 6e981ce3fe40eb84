use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kinmatch: KinmatchConfig,
    pub matching: MatchingConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KinmatchConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Match-search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    /// Depth used when a request omits max_depth.
    #[serde(default = "default_max_depth")]
    pub default_max_depth: usize,
    /// Hard ceiling on traversal depth. Requests above it are clamped
    /// (or rejected when strict_depth is set).
    #[serde(default = "default_depth_ceiling")]
    pub max_depth_ceiling: usize,
    /// Reject over-ceiling depths instead of clamping them.
    #[serde(default)]
    pub strict_depth: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            max_depth_ceiling: default_depth_ceiling(),
            strict_depth: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_http_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_authless")]
    pub authless: bool,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            port: default_http_port(),
            api_key_env: default_http_api_key_env(),
            allowed_origins: default_allowed_origins(),
            authless: default_authless(),
        }
    }
}

fn default_max_depth() -> usize {
    3
}

fn default_depth_ceiling() -> usize {
    6
}

fn default_authless() -> bool {
    false
}

fn default_http_enabled() -> bool {
    false
}

fn default_http_port() -> u16 {
    8080
}

fn default_http_api_key_env() -> String {
    "KINMATCH_API_KEY".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    // Default empty -- set allowed_origins in config.toml for production
    vec![]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KINMATCH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env file is optional; ignore errors
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KINMATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.matching.default_max_depth == 0 {
            anyhow::bail!("matching.default_max_depth must be greater than 0");
        }

        if self.matching.max_depth_ceiling == 0 {
            anyhow::bail!("matching.max_depth_ceiling must be greater than 0");
        }

        if self.matching.default_max_depth > self.matching.max_depth_ceiling {
            anyhow::bail!(
                "matching.default_max_depth ({}) must not exceed matching.max_depth_ceiling ({})",
                self.matching.default_max_depth,
                self.matching.max_depth_ceiling
            );
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.kinmatch.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn write_config(temp_dir: &TempDir, matching: &str) -> std::path::PathBuf {
        let content = format!(
            r#"
[kinmatch]
db_path = "./test.db"
log_level = "debug"

[matching]
{}
"#,
            matching
        );
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn with_config_env(config_path: &std::path::Path, f: impl FnOnce()) {
        let original = std::env::var("KINMATCH_CONFIG").ok();
        std::env::set_var("KINMATCH_CONFIG", config_path.to_str().unwrap());
        f();
        match original {
            Some(val) => std::env::set_var("KINMATCH_CONFIG", val),
            None => std::env::remove_var("KINMATCH_CONFIG"),
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            &temp_dir,
            "default_max_depth = 4\nmax_depth_ceiling = 8\nstrict_depth = true",
        );
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.kinmatch.log_level, "debug");
            assert_eq!(config.matching.default_max_depth, 4);
            assert_eq!(config.matching.max_depth_ceiling, 8);
            assert!(config.matching.strict_depth);
        });
    }

    #[test]
    fn test_config_defaults() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, "");
        with_config_env(&config_path, || {
            let config = Config::load().unwrap();
            assert_eq!(config.matching.default_max_depth, 3);
            assert_eq!(config.matching.max_depth_ceiling, 6);
            assert!(!config.matching.strict_depth);
            assert!(!config.http_server.enabled);
            assert_eq!(config.http_server.port, 8080);
        });
    }

    #[test]
    fn test_config_rejects_default_above_ceiling() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            &temp_dir,
            "default_max_depth = 9\nmax_depth_ceiling = 4",
        );
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_err());
            assert!(config
                .unwrap_err()
                .to_string()
                .contains("max_depth_ceiling"));
        });
    }

    #[test]
    fn test_config_rejects_zero_depth() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, "default_max_depth = 0");
        with_config_env(&config_path, || {
            assert!(Config::load().is_err());
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(std::path::Path::new("nonexistent.toml"), || {
            assert!(Config::load().is_err());
        });
    }
}
