use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;
const DEFAULT_DELIVERY_LEAD_DAYS: u32 = 7;
const CONFIG_DIR: &str = "config";

/// Application configuration, layered from `config/default.toml`, an
/// environment-specific file and `APP_`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Allow material stock to go negative when orders outpace purchases.
    /// Off by default: order intake is rejected on insufficient stock.
    #[serde(default)]
    pub allow_backorder: bool,

    /// Capacity of the event channel feeding the notification collaborator.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Lead time suggested to admins when scheduling an order (days).
    #[serde(default = "default_delivery_lead_days")]
    #[validate(range(min = 1, max = 365))]
    pub default_delivery_lead_days: u32,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_delivery_lead_days() -> u32 {
    DEFAULT_DELIVERY_LEAD_DAYS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            allow_backorder: false,
            event_buffer_size: default_event_buffer_size(),
            default_delivery_lead_days: default_delivery_lead_days(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads and validates the configuration.
///
/// File sources are optional so a bare environment still starts with
/// defaults; environment variables (`APP_LOG_LEVEL`, `APP_ALLOW_BACKORDER`,
/// ...) override everything.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let settings = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{environment}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config
        .validate()
        .map_err(|e| ConfigError::Message(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_level, "info");
        assert!(!config.allow_backorder);
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_lead_days_fails_validation() {
        let config = AppConfig {
            default_delivery_lead_days: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
