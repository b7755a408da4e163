use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::services::password_generator::check_constraints;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/platform.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// What happens to an activation key once it has been used.
    pub activation: ActivationPolicy,

    /// Composition of passwords handed out by the platform.
    pub password_policy: PasswordPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            activation: ActivationPolicy::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub length: usize,

    pub min_uppercase: usize,

    pub min_digits: usize,

    pub min_special: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 12,
            min_uppercase: 2,
            min_digits: 8,
            min_special: 2,
        }
    }
}

/// Replay behaviour for activation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// The key is cleared on activation; replaying it fails.
    #[default]
    SingleUse,

    /// The key is kept; replaying it on an active account does nothing.
    Reusable,
}

impl ActivationPolicy {
    #[must_use]
    pub const fn consumes_key(&self) -> bool {
        matches!(self, Self::SingleUse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// "pretty" or "json"
    pub log_format: String,

    /// Record Prometheus counters and write them out after each command
    pub metrics_enabled: bool,

    /// Prometheus text file, suitable for a node_exporter textfile collector
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_path: "data/metrics.prom".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("platform-core").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".platform-core").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!(
                "min_db_connections ({}) cannot exceed max_db_connections ({})",
                self.general.min_db_connections,
                self.general.max_db_connections
            );
        }

        let policy = &self.security.password_policy;
        check_constraints(
            policy.length,
            policy.min_uppercase,
            policy.min_digits,
            policy.min_special,
        )
        .context("Invalid security.password_policy")?;

        if self.observability.metrics_enabled && self.observability.metrics_path.is_empty() {
            anyhow::bail!("observability.metrics_path cannot be empty when metrics are enabled");
        }

        match self.observability.log_format.as_str() {
            "pretty" | "json" => {}
            other => anyhow::bail!("Unknown log format '{other}', expected 'pretty' or 'json'"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.worker_threads, 2);
        assert_eq!(config.security.password_policy.length, 12);
        assert_eq!(config.security.password_policy.min_digits, 8);
        assert_eq!(config.security.activation, ActivationPolicy::SingleUse);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security.password_policy]"));
        assert!(toml_str.contains("activation = \"single_use\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            activation = "reusable"

            [security.password_policy]
            length = 16
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.activation, ActivationPolicy::Reusable);
        assert_eq!(config.security.password_policy.length, 16);
        assert_eq!(config.security.password_policy.min_uppercase, 2);
        assert_eq!(config.general.database_path, "sqlite:data/platform.db");
    }

    #[test]
    fn test_validate_rejects_infeasible_password_policy() {
        let mut config = Config::default();
        config.security.password_policy = PasswordPolicy {
            length: 5,
            min_uppercase: 3,
            min_digits: 3,
            min_special: 0,
        };

        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("constraints exceed requested length"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.observability.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_metrics_path_when_enabled() {
        let mut config = Config::default();
        config.observability.metrics_enabled = true;
        assert!(config.validate().is_ok());

        config.observability.metrics_path.clear();
        assert!(config.validate().is_err());
    }
}
