use chrono::Datelike;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://marketplace.api.healthcare.gov";
const DEFAULT_BATCH_SIZE: usize = 40;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub marketplace: MarketplaceSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub year: Option<i32>,
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    pub x_api_key: Option<String>,
    #[serde(default)]
    pub send_auth_headers: bool,
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            year: None,
            auth_header: default_auth_header(),
            auth_scheme: default_auth_scheme(),
            x_api_key: None,
            send_auth_headers: false,
            request_timeout_secs: None,
            batch_size: default_batch_size(),
        }
    }
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_auth_header() -> String { "Authorization".to_string() }
fn default_auth_scheme() -> String { "Bearer".to_string() }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "full".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with PROXY__)
    /// 4. The flat MARKETPLACE_* variables used by existing deployments
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides for development
            .add_source(File::with_name("config/local").required(false))
            // e.g., PROXY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PROXY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_marketplace_env(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PROXY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_marketplace_env(settings)?.try_deserialize()
    }
}

/// Overlay the MARKETPLACE_* environment variables onto the loaded config
fn apply_marketplace_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    let string_overrides = [
        ("MARKETPLACE_API_KEY", "marketplace.api_key"),
        ("MARKETPLACE_BASE_URL", "marketplace.base_url"),
        ("MARKETPLACE_AUTH_HEADER", "marketplace.auth_header"),
        ("MARKETPLACE_AUTH_SCHEME", "marketplace.auth_scheme"),
        ("MARKETPLACE_X_API_KEY", "marketplace.x_api_key"),
    ];

    for (var, key) in string_overrides {
        if let Ok(value) = env::var(var) {
            if !value.is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    // An unparseable year falls back to the calendar year
    if let Some(year) = env::var("MARKETPLACE_YEAR")
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|y| *y > 0)
    {
        builder = builder.set_override("marketplace.year", year)?;
    }

    builder.build()
}

/// Resolved marketplace configuration handed to the proxy at construction
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub year: i32,
    pub auth_header: String,
    pub auth_scheme: String,
    pub x_api_key: Option<String>,
    pub send_auth_headers: bool,
    pub request_timeout: Option<Duration>,
    pub batch_size: usize,
}

impl MarketplaceConfig {
    pub fn from_settings(settings: &MarketplaceSettings) -> Self {
        Self {
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            year: settings.year.unwrap_or_else(|| chrono::Utc::now().year()),
            auth_header: settings.auth_header.clone(),
            auth_scheme: settings.auth_scheme.clone(),
            x_api_key: settings.x_api_key.clone().filter(|k| !k.is_empty()),
            send_auth_headers: settings.send_auth_headers,
            request_timeout: settings.request_timeout_secs.map(Duration::from_secs),
            batch_size: settings.batch_size.max(1),
        }
    }

    /// Minimal config for a given key and upstream host
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, year: i32) -> Self {
        let settings = MarketplaceSettings {
            api_key,
            base_url: base_url.into(),
            year: Some(year),
            ..MarketplaceSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// Outbound authentication headers derived from the configured key and scheme
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        if let Some(api_key) = &self.api_key {
            let scheme = self.auth_scheme.trim();
            let with_scheme = format!("{} {}", scheme, api_key).trim().to_string();

            if self.auth_header.eq_ignore_ascii_case("authorization") && !scheme.is_empty() {
                headers.push(("Authorization".to_string(), with_scheme));
            } else if !self.auth_header.is_empty() {
                let value = if scheme.is_empty() { api_key.clone() } else { with_scheme };
                headers.push((self.auth_header.clone(), value));
            }
        }

        if let Some(x_api_key) = &self.x_api_key {
            headers.push(("x-api-key".to_string(), x_api_key.clone()));
        }

        headers
    }
}
