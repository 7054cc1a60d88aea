use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{BackendAppConfig, DispatchAppConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address. Default: "127.0.0.1".
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port. Default: 3000.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendAppConfig,
    #[serde(default)]
    pub dispatch: DispatchAppConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CRUCIBLE_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000_i64)?
            .set_default("backend.url", "http://localhost:2358")?
            .set_default("backend.request_timeout_ms", 5000_i64)?
            .set_default("backend.poll_interval_ms", 250_i64)?
            .set_default("backend.synchronous", false)?
            .set_default("dispatch.max_concurrent", 8_i64)?
            .set_default("dispatch.deadline_ms", 30000_i64)?
            .set_default("dispatch.max_retries", 3_i64)?
            .set_default("dispatch.base_delay_ms", 250_i64)?
            .set_default("dispatch.max_delay_ms", 10000_i64)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., CRUCIBLE__BACKEND__URL)
            .add_source(Environment::with_prefix("CRUCIBLE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
