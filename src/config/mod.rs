//! Configuration module

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub nest: NestConfig,
    #[serde(default)]
    pub cielo: CieloConfig,
    #[serde(default)]
    pub pioneer: PioneerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Nest app-level settings. When set, the shared OAuth values here take
/// precedence over anything stored on a device.
#[derive(Debug, Clone, Deserialize)]
pub struct NestConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_nest_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_nest_token_url")]
    pub token_url: String,
    #[serde(default = "default_auto_range_offset")]
    pub auto_range_offset_celsius: f64,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            project_id: None,
            api_base_url: default_nest_api_base_url(),
            token_url: default_nest_token_url(),
            auto_range_offset_celsius: default_auto_range_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CieloConfig {
    #[serde(default = "default_cielo_api_base_url")]
    pub api_base_url: String,
}

impl Default for CieloConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_cielo_api_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PioneerConfig {
    #[serde(default = "default_pioneer_api_base_url")]
    pub api_base_url: String,
}

impl Default for PioneerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_pioneer_api_base_url(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_nest_api_base_url() -> String {
    "https://smartdevicemanagement.googleapis.com/v1".to_string()
}

fn default_nest_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_auto_range_offset() -> f64 {
    crate::clients::nest::DEFAULT_AUTO_RANGE_OFFSET_C
}

fn default_cielo_api_base_url() -> String {
    "https://api.cielowigle.com/v1".to_string()
}

fn default_pioneer_api_base_url() -> String {
    "https://api.pioneerminisplit.com/api".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("THERMOSTAT").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid configuration, using defaults: {}", e);
            Config::default()
        });

        Ok(config)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_secs)
    }
}
