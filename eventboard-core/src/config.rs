//! Process configuration.
//!
//! Settings come from an optional `eventboard.toml` in the working directory,
//! overridden by `EVENTBOARD_*` environment variables. Only the database URL
//! is required.

use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_BIND, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DEFAULT_PAGE_SIZE,
    DEFAULT_QUERY_TIMEOUT,
};
use crate::error::{EventError, EventResult};

pub const ENV_PREFIX: &str = "EVENTBOARD";
const CONFIG_FILE: &str = "eventboard";

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_query_timeout_secs() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_secs()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// e.g. `sqlite://events.db`
    pub database_url: String,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl AppConfig {
    /// Load from `eventboard.toml` and the process environment.
    pub fn load() -> EventResult<Self> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_environment(env: Environment) -> EventResult<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env.try_parsing(true))
            .build()
            .map_err(|e| EventError::Config(e.to_string()))?;

        if settings.get_string("database_url").is_err() {
            return Err(EventError::Config(format!(
                "{ENV_PREFIX}_DATABASE_URL is not set"
            )));
        }

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| EventError::Config(e.to_string()))?;

        if config.page_size == 0 {
            return Err(EventError::Config("page_size must be at least 1".into()));
        }

        Ok(config)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
