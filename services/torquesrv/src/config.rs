//! TorqueSrv configuration
//!
//! Layered with figment, lowest priority first:
//! built-in defaults, optional YAML file, `TORQUESRV_` environment
//! (`__` nests, e.g. `TORQUESRV_API__PORT`), and finally the fixed storage
//! variables `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASS`, `DB_NAME`.

use std::path::Path;

use common::LogConfig;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TorqueError};

/// Storage settings read straight from the process environment
pub const STORAGE_ENV: [&str; 5] = ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASS", "DB_NAME"];

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listener configuration
    pub api: ApiConfig,
    /// InfluxDB connection
    pub storage: StorageConfig,
    /// Process log sink
    pub log: LogConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Ingestion route
    pub route: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            route: "/add".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// InfluxDB 1.x connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// Database every batch is written to
    pub name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            user: String::new(),
            pass: String::new(),
            name: "torque".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load and validate configuration
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(TorqueError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain behind [`Config::load`]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed("TORQUESRV_").split("__"))
            .merge(Env::raw().only(&STORAGE_ENV).map(|key| {
                key.as_str()
                    .to_ascii_lowercase()
                    .replacen("db_", "storage.", 1)
                    .into()
            }))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.port == 0 {
            return Err(TorqueError::config("api.port must be between 1 and 65535"));
        }
        if !self.api.route.starts_with('/') {
            return Err(TorqueError::config(format!(
                "api.route must start with '/': {}",
                self.api.route
            )));
        }
        if self.storage.host.is_empty() {
            return Err(TorqueError::config("DB_HOST must not be empty"));
        }
        if self.storage.port == 0 {
            return Err(TorqueError::config("DB_PORT must be between 1 and 65535"));
        }
        if self.storage.name.is_empty() {
            return Err(TorqueError::config("DB_NAME must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.api.route, "/add");
        assert_eq!(config.storage.base_url(), "http://localhost:8086");
        assert_eq!(config.storage.name, "torque");
        assert_eq!(config.log.file, "torque_server.log");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_settings_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("DB_HOST", "influx.local");
            jail.set_env("DB_PORT", "9086");
            jail.set_env("DB_USER", "torque");
            jail.set_env("DB_PASS", "secret");
            jail.set_env("DB_NAME", "vehicles");

            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.storage.host, "influx.local");
            assert_eq!(config.storage.port, 9086);
            assert_eq!(config.storage.user, "torque");
            assert_eq!(config.storage.pass, "secret");
            assert_eq!(config.storage.name, "vehicles");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_and_prefixed_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "torquesrv.yaml",
                r#"
api:
  port: 9000
storage:
  host: from-file
  name: filedb
log:
  level: debug
  console: false
"#,
            )?;
            jail.set_env("TORQUESRV_API__HOST", "127.0.0.1");
            jail.set_env("DB_NAME", "envdb");

            let config =
                Config::load(Some(Path::new("torquesrv.yaml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.api.bind_addr(), "127.0.0.1:9000");
            assert_eq!(config.storage.host, "from-file");
            // DB_* outranks the file
            assert_eq!(config.storage.name, "envdb");
            assert_eq!(config.log.level, "debug");
            assert!(!config.log.console);
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let result = Config::load(Some(Path::new("/nonexistent/torquesrv.yaml")));
        assert!(matches!(result, Err(TorqueError::Config(_))));
    }

    #[test]
    fn test_invalid_port_env_is_fatal() {
        Jail::expect_with(|jail| {
            jail.set_env("DB_PORT", "not-a-port");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.storage.host = String::new();
        assert!(config.validate().is_err());

        config.storage.host = "localhost".to_string();
        config.storage.name = String::new();
        assert!(config.validate().is_err());

        config.storage.name = "torque".to_string();
        config.api.route = "add".to_string();
        assert!(config.validate().is_err());

        config.api.route = "/add".to_string();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }
}
