use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the study backend, without trailing slash
    pub api_url: String,
    pub bind: String,
    pub port: u16,
    /// Upper bound on concurrent per-volunteer fetches
    pub fetch_concurrency: usize,
    pub summary_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8888/api".to_string(),
            bind: "0.0.0.0".to_string(),
            port: 8080,
            fetch_concurrency: 8,
            summary_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("config error: {0}")]
pub struct ConfigError(#[from] figment::Error);

/// Loads `etude.toml` (optional) then `ETUDE_*` environment variables over the defaults
pub fn get_config() -> Result<Config, ConfigError> {
    load_from(Figment::new().merge(Toml::file("etude.toml")))
}

fn load_from(figment: Figment) -> Result<Config, ConfigError> {
    Ok(Figment::from(Serialized::defaults(Config::default()))
        .merge(figment)
        .merge(Env::prefixed("ETUDE_"))
        .extract()?)
}
