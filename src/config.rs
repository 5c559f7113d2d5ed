use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_VAT_RATE: f64 = 0.05;
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_PLANT_ORIGIN: &str = "Plant";
const DEFAULT_LOADING_PORT: &str = "Jebel Ali";
const DEFAULT_AUTO_ADVANCE_SECS: u64 = 30;
const DEFAULT_RECONCILIATION_INTERVAL_SECS: u64 = 300;
const DEFAULT_EVENT_BUFFER: usize = 256;
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// VAT rate applied to local orders with `include_vat` set.
    #[serde(default = "default_vat_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub vat_rate: f64,

    #[serde(default = "default_currency")]
    #[validate(length(min = 3, max = 3))]
    pub default_currency: String,

    /// Origin used for inland transport rate lookups.
    #[serde(default = "default_plant_origin")]
    #[validate(length(min = 1))]
    pub plant_origin: String,

    /// Port of loading for export costing (inland-to-port leg).
    #[serde(default = "default_loading_port")]
    #[validate(length(min = 1))]
    pub loading_port: String,

    /// Delay before `production_completed` auto-advances to
    /// `ready_for_dispatch`. A workflow buffer, not a duration control.
    #[serde(default = "default_auto_advance_secs")]
    pub auto_advance_secs: u64,

    /// Period of the routing reconciliation sweep.
    #[serde(default = "default_reconciliation_interval_secs")]
    pub reconciliation_interval_secs: u64,

    /// Event channel capacity.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_plant_origin() -> String {
    DEFAULT_PLANT_ORIGIN.to_string()
}

fn default_loading_port() -> String {
    DEFAULT_LOADING_PORT.to_string()
}

fn default_auto_advance_secs() -> u64 {
    DEFAULT_AUTO_ADVANCE_SECS
}

fn default_reconciliation_interval_secs() -> u64 {
    DEFAULT_RECONCILIATION_INTERVAL_SECS
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            vat_rate: default_vat_rate(),
            default_currency: default_currency(),
            plant_origin: default_plant_origin(),
            loading_port: default_loading_port(),
            auto_advance_secs: default_auto_advance_secs(),
            reconciliation_interval_secs: default_reconciliation_interval_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Loads configuration from `config/{default,local}.toml` (both optional)
/// layered under `CHEMTRADE_`-prefixed environment variables, then
/// validates the result.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config: AppConfig = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/local", CONFIG_DIR)).required(false))
        .add_source(Environment::with_prefix("CHEMTRADE").separator("__"))
        .build()?
        .try_deserialize()?;

    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}
