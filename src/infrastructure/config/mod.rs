use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::error::{AppError, Result};

pub const CONFIG_FILE: &str = "qa-dashboard.toml";
pub const ENV_PREFIX: &str = "QA_DASHBOARD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the QA backend. Every request path is joined onto this.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub listen_host: String,
    pub listen_port: u16,
    pub stub_port: u16,
    pub health_refresh_secs: u64,
    pub recent_tests_limit: usize,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            request_timeout_ms: 10_000,
            listen_host: "127.0.0.1".to_string(),
            listen_port: 4020,
            stub_port: 3001,
            health_refresh_secs: 30,
            recent_tests_limit: 8,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `qa-dashboard.toml` in the working directory, then `QA_DASHBOARD_*`.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment(Path::new(CONFIG_FILE)))
    }

    pub fn figment(toml_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(toml_path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(self.api_base_url.trim()).map_err(|e| {
            AppError::ConfigError(format!(
                "api_base_url '{}' is not a valid URL: {}",
                self.api_base_url, e
            ))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::ConfigError(format!(
                "api_base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::ConfigError(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.health_refresh_secs == 0 {
            return Err(AppError::ConfigError(
                "health_refresh_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.health_refresh_secs)
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}
