use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use swapgate_core::shared::constants::{
    DEFAULT_AGGREGATOR_TIMEOUT_MS, DEFAULT_AGGREGATOR_URL, DEFAULT_API_KEY_HEADER,
    DEFAULT_API_VERSION, DEFAULT_VERSION_HEADER, SUPPORTED_CHAIN_IDS,
};
use swapgate_core::AggregatorConfig;

use crate::domain::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60 * 1000,
            max_requests: 100,
            burst: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_rate_limiting: bool,
    pub enable_cors: bool,
    pub cors_origins: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_rate_limiting: true,
            enable_cors: true,
            cors_origins: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub aggregator: AggregatorConfig,
    pub rate_limits: RateLimitConfig,
    pub security: SecurityConfig,
    /// Chains accepted at the boundary. Must be a subset of the core allow-list.
    pub supported_chains: Vec<u64>,
    pub config_file_path: Option<String>,
    pub last_modified: Option<u64>,
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 4000,
            aggregator: AggregatorConfig::default(),
            rate_limits: RateLimitConfig::default(),
            security: SecurityConfig::default(),
            supported_chains: SUPPORTED_CHAIN_IDS.to_vec(),
            config_file_path: None,
            last_modified: Some(Utc::now().timestamp() as u64),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();
        let env = Self::validate_and_get_env_var("RUST_ENV", "development", false)?;

        Self::validate_startup_env_vars(&env)?;

        if let Some(config) = Self::load_from_file()? {
            config.validate()?;
            return Ok(config);
        }

        let config = match env.as_str() {
            "staging" => Self::staging_config()?,
            "production" => Self::production_config()?,
            _ => Self::development_config()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Required variables per environment, checked before anything is built.
    fn validate_startup_env_vars(environment: &str) -> Result<()> {
        let required: &[&str] = match environment {
            "production" => &["AGGREGATOR_URL", "AGGREGATOR_API_KEY", "CORS_ORIGINS"],
            "staging" => &["AGGREGATOR_API_KEY"],
            _ => &[],
        };

        let errors: Vec<String> = required
            .iter()
            .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(true))
            .map(|var| format!("Required environment variable {var} is not set for {environment}"))
            .collect();

        if !errors.is_empty() {
            return Err(anyhow!("Environment validation failed:\n{}", errors.join("\n")));
        }
        Ok(())
    }

    /// JSON file named by `CONFIG_FILE`, if the variable is set.
    fn load_from_file() -> Result<Option<Self>> {
        let config_file = match env::var("CONFIG_FILE") {
            Ok(path) if !path.is_empty() => path,
            _ => return Ok(None),
        };
        if !Path::new(&config_file).exists() {
            return Err(anyhow!("Config file not found: {}", config_file));
        }
        let content = fs::read_to_string(&config_file)
            .map_err(|e| anyhow!("Failed to read config file: {}", e))?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to deserialize config: {}", e))?;
        config.config_file_path = Some(config_file);
        config.last_modified = Some(Utc::now().timestamp() as u64);
        Ok(Some(config))
    }

    pub fn save_to_file(&self, file_path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
        fs::write(file_path, content).map_err(|e| anyhow!("Failed to write config file: {}", e))?;
        Ok(())
    }

    fn aggregator_from_env() -> Result<AggregatorConfig> {
        Ok(AggregatorConfig {
            base_url: Self::validate_and_get_env_var("AGGREGATOR_URL", DEFAULT_AGGREGATOR_URL, false)?,
            api_key: Self::validate_and_get_env_var("AGGREGATOR_API_KEY", "", false)?,
            api_key_header: Self::validate_and_get_env_var("AGGREGATOR_API_KEY_HEADER", DEFAULT_API_KEY_HEADER, false)?,
            version_header: Self::validate_and_get_env_var("AGGREGATOR_VERSION_HEADER", DEFAULT_VERSION_HEADER, false)?,
            api_version: Self::validate_and_get_env_var("AGGREGATOR_API_VERSION", DEFAULT_API_VERSION, false)?,
            timeout_ms: u64::from_str(&Self::validate_and_get_env_var(
                "AGGREGATOR_TIMEOUT_MS",
                &DEFAULT_AGGREGATOR_TIMEOUT_MS.to_string(),
                false,
            )?)?,
        })
    }

    fn supported_chains_from_env() -> Result<Vec<u64>> {
        match env::var("SUPPORTED_CHAINS") {
            Ok(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|id| u64::from_str(id.trim()).map_err(|e| anyhow!("Invalid chain id '{}': {}", id, e)))
                .collect(),
            _ => Ok(SUPPORTED_CHAIN_IDS.to_vec()),
        }
    }

    fn profile(environment: &str, log_level: &str, max_requests: &str, cors_origins: &str) -> Result<Self> {
        Ok(Self {
            environment: environment.to_string(),
            log_level: Self::validate_and_get_env_var("LOG_LEVEL", log_level, false)?,
            host: Self::validate_and_get_env_var("HOST", "0.0.0.0", false)?,
            port: u16::from_str(&Self::validate_and_get_env_var("PORT", "4000", false)?)?,
            aggregator: Self::aggregator_from_env()?,
            rate_limits: RateLimitConfig {
                window_ms: u64::from_str(&Self::validate_and_get_env_var("RATE_LIMIT_WINDOW_MS", "60000", false)?)?,
                max_requests: u32::from_str(&Self::validate_and_get_env_var("RATE_LIMIT_MAX", max_requests, false)?)?,
                burst: u32::from_str(&Self::validate_and_get_env_var("RATE_LIMIT_BURST", "10", false)?)?,
            },
            security: SecurityConfig {
                enable_rate_limiting: env::var("ENABLE_RATE_LIMITING").unwrap_or_else(|_| "true".to_string()) != "false",
                enable_cors: env::var("ENABLE_CORS").unwrap_or_else(|_| "true".to_string()) != "false",
                cors_origins: Self::validate_and_get_env_var("CORS_ORIGINS", cors_origins, false)?,
            },
            supported_chains: Self::supported_chains_from_env()?,
            config_file_path: None,
            last_modified: Some(Utc::now().timestamp() as u64),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn development_config() -> Result<Self> {
        Self::profile("development", "debug", "1000", "*")
    }

    fn staging_config() -> Result<Self> {
        Self::profile("staging", "info", "500", "*")
    }

    fn production_config() -> Result<Self> {
        Self::profile("production", "warn", "100", "")
    }

    /// Validates environment variables and provides fallback values
    pub fn validate_and_get_env_var(key: &str, fallback: &str, required: bool) -> Result<String> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => Ok(value),
            Ok(_) if required => Err(anyhow!("Environment variable {} is required but empty", key)),
            Err(_) if required => Err(anyhow!("Required environment variable {} is not set", key)),
            _ => Ok(fallback.to_string()),
        }
    }

    pub fn is_chain_supported(&self, chain_id: u64) -> bool {
        self.supported_chains.contains(&chain_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregator
            .validate()
            .map_err(|e| ConfigError::InvalidConfig(format!("aggregator: {e}")))?;

        if self.supported_chains.is_empty() {
            return Err(ConfigError::MissingConfig("SUPPORTED_CHAINS".to_string()));
        }
        if let Some(chain_id) = self.supported_chains.iter().find(|id| !SUPPORTED_CHAIN_IDS.contains(id)) {
            return Err(ConfigError::InvalidConfig(format!(
                "Chain {chain_id} is not supported by the swap core"
            )));
        }

        if self.security.enable_rate_limiting && (self.rate_limits.max_requests == 0 || self.rate_limits.window_ms == 0) {
            return Err(ConfigError::InvalidConfig(
                "Rate limiting is enabled but RATE_LIMIT_MAX or RATE_LIMIT_WINDOW_MS is 0".to_string(),
            ));
        }

        match self.environment.as_str() {
            "production" | "staging" if self.aggregator.api_key.is_empty() => {
                return Err(ConfigError::MissingConfig(format!(
                    "AGGREGATOR_API_KEY is required in {} environment",
                    self.environment
                )));
            }
            "production" if self.security.cors_origins.trim() == "*" => {
                return Err(ConfigError::InvalidConfig(
                    "CORS_ORIGINS cannot be '*' in production environment".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Summary safe to log: the API key is masked.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.environment,
            "version": self.version,
            "port": self.port,
            "log_level": self.log_level,
            "aggregator_url": self.aggregator.base_url,
            "aggregator_api_key": swapgate_core::shared::utils::mask_secret(&self.aggregator.api_key),
            "supported_chains": self.supported_chains,
            "rate_limiting": {
                "enabled": self.security.enable_rate_limiting,
                "max_requests": self.rate_limits.max_requests,
                "window_ms": self.rate_limits.window_ms,
            },
            "config_file": self.config_file_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_and_get_env_var() {
        let result = Config::validate_and_get_env_var("SWAPGATE_TEST_NONEXISTENT_VAR", "fallback", false);
        assert_eq!(result.unwrap(), "fallback");

        std::env::set_var("SWAPGATE_TEST_EMPTY_VAR", "");
        let result = Config::validate_and_get_env_var("SWAPGATE_TEST_EMPTY_VAR", "fallback", false);
        assert_eq!(result.unwrap(), "fallback");
        assert!(Config::validate_and_get_env_var("SWAPGATE_TEST_EMPTY_VAR", "fallback", true).is_err());

        std::env::set_var("SWAPGATE_TEST_VALID_VAR", "test_value");
        let result = Config::validate_and_get_env_var("SWAPGATE_TEST_VALID_VAR", "fallback", false);
        assert_eq!(result.unwrap(), "test_value");

        std::env::remove_var("SWAPGATE_TEST_EMPTY_VAR");
        std::env::remove_var("SWAPGATE_TEST_VALID_VAR");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.is_chain_supported(8453));
        assert!(!config.is_chain_supported(56));
    }

    #[test]
    fn test_validation_rejects_bad_configs() {
        let config = Config { supported_chains: vec![1, 56], ..Default::default() };
        assert!(config.validate().is_err());

        let config = Config { supported_chains: vec![], ..Default::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingConfig("SUPPORTED_CHAINS".to_string()))
        );

        let mut config = Config::default();
        config.rate_limits.max_requests = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
        config.security.enable_rate_limiting = false;
        assert!(config.validate().is_ok());

        let config = Config { environment: "staging".to_string(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::MissingConfig(_))));

        let config = Config { environment: "production".to_string(), ..Default::default() };
        assert!(config.validate().unwrap_err().to_string().contains("AGGREGATOR_API_KEY"));

        let mut config = Config { environment: "production".to_string(), ..Default::default() };
        config.aggregator.api_key = "key".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("CORS_ORIGINS"));
        config.security.cors_origins = "https://app.swapgate.io".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_masks_api_key() {
        let mut config = Config::default();
        config.aggregator.api_key = "supersecretkey".to_string();
        let summary = config.summary();
        assert_eq!(summary["aggregator_api_key"], "supe…tkey");
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("swapgate-relay-config-{}.json", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();
        let config = Config { port: 4555, ..Default::default() };
        config.save_to_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let loaded: Config = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.port, 4555);
        assert_eq!(loaded.supported_chains, SUPPORTED_CHAIN_IDS.to_vec());
        fs::remove_file(&path).ok();
    }
}
